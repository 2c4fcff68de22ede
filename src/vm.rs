use std::io::{ErrorKind, Read};

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::config::VmConfig;
use crate::error::{Error, Result};
use crate::memory::{Addressing, Memory};
use crate::program::{ALPHABET, Op, Program};

/// What `,` reads and what `.` writes.
pub trait ExecutionMode {
    const ADDRESSING: Addressing;

    fn input(&mut self, pc: usize) -> Result<i64>;

    fn emit(&self, cell: i64) -> char;
}

/// Cells are character codes; `,` decodes one UTF-8 character from a reader.
pub struct RawMode<R> {
    input: R,
    /// Byte read past a broken sequence, handed out by the next read.
    pending: Option<u8>,
}

impl<R: Read> RawMode<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            pending: None,
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        if let Some(byte) = self.pending.take() {
            return Ok(Some(byte));
        }
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Malformed or truncated sequences decode to U+FFFD; a byte that
    /// breaks a sequence is kept for the next read.
    fn read_char(&mut self) -> Result<Option<char>> {
        let Some(lead) = self.next_byte()? else {
            return Ok(None);
        };
        let width = match lead {
            0x00..=0x7F => return Ok(Some(char::from(lead))),
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Ok(Some(char::REPLACEMENT_CHARACTER)),
        };

        let mut buf = [lead, 0, 0, 0];
        for slot in buf.iter_mut().take(width).skip(1) {
            match self.next_byte()? {
                Some(byte) if byte & 0xC0 == 0x80 => *slot = byte,
                Some(byte) => {
                    self.pending = Some(byte);
                    return Ok(Some(char::REPLACEMENT_CHARACTER));
                }
                None => return Ok(Some(char::REPLACEMENT_CHARACTER)),
            }
        }
        let decoded = std::str::from_utf8(&buf[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        Ok(Some(decoded))
    }
}

impl<R: Read> ExecutionMode for RawMode<R> {
    const ADDRESSING: Addressing = Addressing::Clamp;

    fn input(&mut self, pc: usize) -> Result<i64> {
        match self.read_char()? {
            Some(c) => Ok(i64::from(u32::from(c))),
            None => Err(Error::InputExhausted { pc }),
        }
    }

    fn emit(&self, cell: i64) -> char {
        u32::try_from(cell)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

/// Cells are folded onto [`ALPHABET`]; `,` draws a random alphabet index.
pub struct GenerativeMode<G> {
    rng: G,
}

impl<G: Rng> GenerativeMode<G> {
    pub fn new(rng: G) -> Self {
        Self { rng }
    }
}

impl<G: Rng> ExecutionMode for GenerativeMode<G> {
    const ADDRESSING: Addressing = Addressing::Wrap;

    fn input(&mut self, _pc: usize) -> Result<i64> {
        Ok(self.rng.gen_range(0..ALPHABET.len()) as i64)
    }

    fn emit(&self, cell: i64) -> char {
        ALPHABET[(cell.unsigned_abs() % ALPHABET.len() as u64) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    ProgramEnd,
    CycleLimit,
    OutputCap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub output: String,
    pub emitted: usize,
    pub cycles: usize,
    pub halt: Halt,
}

impl Execution {
    /// Low byte of each emitted character, ready for `Predictor::ingest_all`.
    pub fn symbols(&self) -> Vec<u8> {
        self.output.chars().map(|c| c as u32 as u8).collect()
    }
}

struct ExecutionState {
    pc: usize,
    dp: usize,
    cycles: usize,
    output: String,
    emitted: usize,
    cap: usize,
}

enum Step {
    Continue,
    Halt(Halt),
}

pub struct Interpreter<M> {
    pub config: VmConfig,
    pub memory: Memory,
    pub mode: M,
}

impl<R: Read> Interpreter<RawMode<R>> {
    pub fn raw(config: VmConfig, input: R) -> Self {
        Self::new(config, RawMode::new(input))
    }
}

impl Interpreter<GenerativeMode<StdRng>> {
    pub fn generative(config: VmConfig, seed: u64) -> Self {
        Self::new(config, GenerativeMode::new(StdRng::seed_from_u64(seed)))
    }
}

impl<M: ExecutionMode> Interpreter<M> {
    pub fn new(config: VmConfig, mode: M) -> Self {
        Self {
            memory: Memory::new(config.memory_size, M::ADDRESSING),
            config,
            mode,
        }
    }

    /// Runs `program` from a zeroed memory until it ends, exhausts the
    /// cycle limit, or has emitted `target_len` characters.
    pub fn run(&mut self, program: &Program, target_len: usize) -> Result<Execution> {
        self.memory.reset();
        let mut state = ExecutionState {
            pc: 0,
            dp: 0,
            cycles: 0,
            output: String::with_capacity(target_len.min(4096)),
            emitted: 0,
            cap: target_len,
        };

        let halt = loop {
            if state.pc >= program.len() {
                break Halt::ProgramEnd;
            }
            if state.cycles >= self.config.cycle_limit {
                break Halt::CycleLimit;
            }
            let op = program.op_at(state.pc);
            state.cycles += 1;
            if let Step::Halt(reason) = self.execute_opcode(program, op, &mut state)? {
                break reason;
            }
        };

        debug!(
            ?halt,
            cycles = state.cycles,
            emitted = state.emitted,
            "interpreter halted"
        );
        Ok(Execution {
            output: state.output,
            emitted: state.emitted,
            cycles: state.cycles,
            halt,
        })
    }

    #[inline(always)]
    fn execute_opcode(
        &mut self,
        program: &Program,
        op: Option<Op>,
        state: &mut ExecutionState,
    ) -> Result<Step> {
        match op {
            Some(Op::Inc) => {
                self.memory.add(state.dp, 1)?;
                state.pc += 1;
            }
            Some(Op::Dec) => {
                self.memory.add(state.dp, -1)?;
                state.pc += 1;
            }
            Some(Op::Right) => {
                state.dp = self.memory.advance(state.dp);
                state.pc += 1;
            }
            Some(Op::Left) => {
                state.dp = self.memory.retreat(state.dp);
                state.pc += 1;
            }
            Some(Op::Output) => {
                if state.emitted >= state.cap {
                    return Ok(Step::Halt(Halt::OutputCap));
                }
                let cell = self.memory.read(state.dp)?;
                state.output.push(self.mode.emit(cell));
                state.emitted += 1;
                if state.emitted == state.cap {
                    return Ok(Step::Halt(Halt::OutputCap));
                }
                state.pc += 1;
            }
            Some(Op::Input) => {
                let value = self.mode.input(state.pc)?;
                self.memory.write(state.dp, value)?;
                state.pc += 1;
            }
            Some(Op::LoopStart) => {
                if self.memory.read(state.dp)? == 0 {
                    state.pc = program.find_matching_forward(state.pc) + 1;
                } else {
                    state.pc += 1;
                }
            }
            Some(Op::LoopEnd) => {
                if self.memory.read(state.dp)? != 0 {
                    // An orphan `]` restarts the program.
                    state.pc = match program.find_matching_backward(state.pc) {
                        Some(open) => open + 1,
                        None => 0,
                    };
                } else {
                    state.pc += 1;
                }
            }
            None => state.pc += 1,
        }
        Ok(Step::Continue)
    }
}
