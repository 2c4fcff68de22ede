use crate::error::{Error, Result};

/// Circular byte tape with a single head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<u8>,
    head: usize,
}

impl Tape {
    pub fn new(length: usize) -> Result<Self> {
        if length == 0 {
            return Err(Error::InvalidConfig("tape length must be non-zero".to_string()));
        }
        Ok(Self {
            cells: vec![0; length],
            head: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn value(&self) -> u8 {
        self.cells[self.head]
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Result<u8> {
        self.cells.get(index).copied().ok_or(Error::IndexOutOfBounds {
            what: "tape cell",
            index,
            len: self.cells.len(),
        })
    }

    pub fn advance(&mut self) {
        self.head = (self.head + 1) % self.cells.len();
    }

    pub fn retreat(&mut self) {
        self.head = (self.head + self.cells.len() - 1) % self.cells.len();
    }

    /// Even symbols move right, odd symbols move left.
    pub fn shift_for(&mut self, symbol: u8) {
        if symbol % 2 == 0 {
            self.advance();
        } else {
            self.retreat();
        }
    }

    /// XORs `symbol` into the cell under the head and returns the new value.
    pub fn mix(&mut self, symbol: u8) -> u8 {
        let cell = &mut self.cells[self.head];
        *cell ^= symbol;
        *cell
    }
}
