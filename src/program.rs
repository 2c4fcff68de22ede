use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Inc,
    Dec,
    Right,
    Left,
    Output,
    Input,
    LoopStart,
    LoopEnd,
}

impl Op {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Op::Inc),
            '-' => Some(Op::Dec),
            '>' => Some(Op::Right),
            '<' => Some(Op::Left),
            '.' => Some(Op::Output),
            ',' => Some(Op::Input),
            '[' => Some(Op::LoopStart),
            ']' => Some(Op::LoopEnd),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Op::Inc => '+',
            Op::Dec => '-',
            Op::Right => '>',
            Op::Left => '<',
            Op::Output => '.',
            Op::Input => ',',
            Op::LoopStart => '[',
            Op::LoopEnd => ']',
        }
    }
}

/// Output alphabet of the generative interpreter. `,` is deliberately absent.
pub const ALPHABET: [char; 7] = ['+', '-', '>', '<', '.', '[', ']'];

/// An immutable sequence of program symbols. Characters outside the
/// instruction set are kept and execute as no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    symbols: Vec<char>,
}

impl Program {
    pub fn new(symbols: Vec<char>) -> Self {
        Self { symbols }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    #[inline]
    pub fn op_at(&self, pc: usize) -> Option<Op> {
        self.symbols.get(pc).copied().and_then(Op::from_char)
    }

    /// Index of the `]` closing the `[` at `position`.
    ///
    /// An unmatched `[` resolves to the last index, so jumping one past it
    /// ends execution.
    pub fn find_matching_forward(&self, position: usize) -> usize {
        let mut depth = 1usize;
        for i in position + 1..self.symbols.len() {
            match self.symbols[i] {
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        return i;
                    }
                }
                '[' => depth += 1,
                _ => {}
            }
        }
        self.symbols.len().saturating_sub(1)
    }

    /// Index of the `[` opening the `]` at `position`, or `None` when no
    /// partner exists. Callers resume at program start in that case.
    pub fn find_matching_backward(&self, position: usize) -> Option<usize> {
        let mut depth = 1usize;
        for i in (0..position.min(self.symbols.len())).rev() {
            match self.symbols[i] {
                '[' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                ']' => depth += 1,
                _ => {}
            }
        }
        None
    }

    /// True when every `[` has a partner `]` and no `]` closes early.
    pub fn is_balanced(&self) -> bool {
        let mut depth = 0usize;
        for &c in &self.symbols {
            match c {
                '[' => depth += 1,
                ']' => match depth.checked_sub(1) {
                    Some(d) => depth = d,
                    None => return false,
                },
                _ => {}
            }
        }
        depth == 0
    }
}

impl From<&str> for Program {
    fn from(source: &str) -> Self {
        Self::new(source.chars().collect())
    }
}

impl From<Vec<char>> for Program {
    fn from(symbols: Vec<char>) -> Self {
        Self::new(symbols)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.symbols {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Syntactic partners computed with a stack, for cross-checking the scans.
    fn partners(program: &Program) -> Vec<(usize, usize)> {
        let mut open = Vec::new();
        let mut pairs = Vec::new();
        for (i, &c) in program.symbols().iter().enumerate() {
            match c {
                '[' => open.push(i),
                ']' => pairs.push((open.pop().unwrap(), i)),
                _ => {}
            }
        }
        pairs
    }

    #[test]
    fn test_op_roundtrip_and_noops() {
        for c in "+-><.,[]".chars() {
            assert_eq!(Op::from_char(c).unwrap().as_char(), c);
        }
        assert_eq!(Op::from_char('x'), None);
        assert_eq!(Op::from_char(' '), None);
    }

    #[test]
    fn test_alphabet_excludes_input() {
        assert_eq!(ALPHABET.len(), 7);
        assert!(!ALPHABET.contains(&','));
    }

    #[test]
    fn test_nested_partners_resolve() {
        for source in ["[]", "+[-[>+<]>.]", "[[[]]][][[]x[]]", "a[b[c]d]e"] {
            let program = Program::from(source);
            assert!(program.is_balanced());
            for (open, close) in partners(&program) {
                assert_eq!(program.find_matching_forward(open), close, "{source}");
                assert_eq!(program.find_matching_backward(close), Some(open), "{source}");
                assert!(close > open);
            }
        }
    }

    #[test]
    fn test_unmatched_open_resolves_to_last_index() {
        let program = Program::from("+[+[-]");
        assert_eq!(program.find_matching_forward(1), program.len() - 1);
    }

    #[test]
    fn test_unmatched_close_has_no_partner() {
        let program = Program::from("+-]");
        assert_eq!(program.find_matching_backward(2), None);
        assert!(!program.is_balanced());
    }

    #[test]
    fn test_display_preserves_source() {
        let source = "+[->+<] comment";
        assert_eq!(Program::from(source).to_string(), source);
    }
}
