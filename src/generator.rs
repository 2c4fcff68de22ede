use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::program::{Op, Program};

const PRIMITIVES: [Op; 6] = [Op::Inc, Op::Dec, Op::Right, Op::Left, Op::Output, Op::Input];

/// A generated program together with the output length it should be run for.
#[derive(Clone, Debug)]
pub struct Hypothesis {
    pub program: Program,
    pub target_len: usize,
}

/// Seeded source of random, always-balanced programs.
pub struct ProgramGenerator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl ProgramGenerator {
    /// Fails with `InvalidConfig` on inverted ranges or probabilities
    /// outside [0, 1], which would otherwise panic inside `generate`.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
        })
    }

    pub fn generate(&mut self) -> Hypothesis {
        let len = self.rng.gen_range(self.config.min_len..=self.config.max_len);
        let target_len = self
            .rng
            .gen_range(self.config.min_output..=self.config.max_output);
        Hypothesis {
            program: self.build(len),
            target_len,
        }
    }

    /// Emits exactly `len` symbols, tracking open blocks with a counter so
    /// nesting never exceeds `max_depth`. A block only opens while there is
    /// room left to close it, and pending blocks are force-closed as the
    /// budget runs out.
    fn build(&mut self, len: usize) -> Program {
        let mut symbols = Vec::with_capacity(len);
        let mut depth = 0usize;

        while symbols.len() < len {
            let remaining = len - symbols.len();
            if depth < self.config.max_depth
                && remaining > depth + 1
                && self.rng.gen_bool(self.config.loop_probability)
            {
                symbols.push(Op::LoopStart.as_char());
                depth += 1;
            } else if depth > 0
                && (remaining <= depth || self.rng.gen_bool(self.config.close_probability))
            {
                symbols.push(Op::LoopEnd.as_char());
                depth -= 1;
            } else {
                let op = PRIMITIVES[self.rng.gen_range(0..PRIMITIVES.len())];
                symbols.push(op.as_char());
            }
        }

        debug_assert_eq!(depth, 0);
        Program::new(symbols)
    }
}
