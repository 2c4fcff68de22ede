use crate::error::{Error, Result};

/// How the data pointer maps onto memory cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// `<` stops at zero, `>` is unbounded; touching a cell past the end
    /// is an error.
    Clamp,
    /// `<` stops at zero, `>` wraps to zero after the last cell; every
    /// access lands inside memory.
    Wrap,
}

#[derive(Debug, Clone)]
pub struct Memory {
    cells: Vec<i64>,
    addressing: Addressing,
}

impl Memory {
    pub fn new(size: usize, addressing: Addressing) -> Self {
        Self {
            cells: vec![0; size],
            addressing,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn addressing(&self) -> Addressing {
        self.addressing
    }

    pub fn reset(&mut self) {
        self.cells.fill(0);
    }

    #[inline]
    pub fn advance(&self, pointer: usize) -> usize {
        match self.addressing {
            Addressing::Clamp => pointer.saturating_add(1),
            Addressing::Wrap => {
                let next = pointer + 1;
                if next >= self.cells.len() { 0 } else { next }
            }
        }
    }

    #[inline]
    pub fn retreat(&self, pointer: usize) -> usize {
        pointer.saturating_sub(1)
    }

    #[inline]
    fn index(&self, pointer: usize) -> Result<usize> {
        let size = self.cells.len();
        match self.addressing {
            Addressing::Clamp if pointer < size => Ok(pointer),
            Addressing::Wrap if size > 0 => Ok(pointer % size),
            _ => Err(Error::PointerOutOfBounds { pointer, size }),
        }
    }

    pub fn read(&self, pointer: usize) -> Result<i64> {
        let idx = self.index(pointer)?;
        Ok(self.cells[idx])
    }

    pub fn write(&mut self, pointer: usize, value: i64) -> Result<()> {
        let idx = self.index(pointer)?;
        self.cells[idx] = value;
        Ok(())
    }

    pub fn add(&mut self, pointer: usize, delta: i64) -> Result<()> {
        let idx = self.index(pointer)?;
        self.cells[idx] = self.cells[idx].wrapping_add(delta);
        Ok(())
    }
}
