use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vector::{Vector, cosine_similarity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSlot {
    vector: Vector,
    pub symbol: u8,
}

impl PoolSlot {
    pub fn new(vector: Vector, symbol: u8) -> Self {
        Self { vector, symbol }
    }

    pub fn vector(&self) -> &Vector {
        &self.vector
    }
}

/// Winner of a nearest-neighbour search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub row: usize,
    pub slot: usize,
    pub symbol: u8,
    pub similarity: f64,
}

/// Fixed set of (vector, symbol) associations. Vectors never change after
/// construction; symbols are rewritten round-robin.
#[derive(Debug, Clone)]
pub struct AssociativePool {
    slots: Vec<PoolSlot>,
    cursor: usize,
    dimension: usize,
}

impl AssociativePool {
    pub fn random<R: Rng + ?Sized>(rng: &mut R, size: usize, dimension: usize) -> Result<Self> {
        let slots = (0..size)
            .map(|_| {
                let vector = Vector::random(rng, dimension);
                PoolSlot::new(vector, rng.gen_range(0..=u8::MAX))
            })
            .collect();
        Self::from_slots(slots)
    }

    pub fn from_slots(slots: Vec<PoolSlot>) -> Result<Self> {
        let dimension = slots.first().ok_or(Error::EmptyPool)?.vector.dimension();
        if let Some(bad) = slots.iter().find(|s| s.vector.dimension() != dimension) {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                found: bad.vector.dimension(),
            });
        }
        Ok(Self {
            slots,
            cursor: 0,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Slot the next [`record`](Self::record) will overwrite.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn slots(&self) -> &[PoolSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Result<&PoolSlot> {
        self.slots.get(index).ok_or(Error::IndexOutOfBounds {
            what: "pool slot",
            index,
            len: self.slots.len(),
        })
    }

    /// Best (row, slot) pair over the whole batch × pool cross product.
    /// Ties keep the first pair in row-major, then slot order.
    pub fn nearest(&self, batch: &[Vector]) -> Result<Match> {
        if batch.is_empty() {
            return Err(Error::EmptyBatch);
        }
        if let Some(bad) = batch.iter().find(|v| v.dimension() != self.dimension) {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                found: bad.dimension(),
            });
        }

        let mut best: Option<Match> = None;
        for (row, query) in batch.iter().enumerate() {
            for (slot, entry) in self.slots.iter().enumerate() {
                let similarity = cosine_similarity(query, &entry.vector);
                if best.is_none_or(|b| similarity > b.similarity) {
                    best = Some(Match {
                        row,
                        slot,
                        symbol: entry.symbol,
                        similarity,
                    });
                }
            }
        }
        best.ok_or(Error::EmptyPool)
    }

    /// Overwrites the symbol at the cursor, then advances it. Returns the
    /// slot written.
    pub fn record(&mut self, symbol: u8) -> usize {
        let written = self.cursor;
        self.slots[written].symbol = symbol;
        self.cursor = (self.cursor + 1) % self.slots.len();
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn axis_pool() -> AssociativePool {
        AssociativePool::from_slots(vec![
            PoolSlot::new(Vector::from(vec![1.0, 0.0]), 10),
            PoolSlot::new(Vector::from(vec![0.0, 1.0]), 11),
            PoolSlot::new(Vector::from(vec![-1.0, 0.0]), 12),
        ])
        .unwrap()
    }

    #[test]
    fn test_nearest_searches_all_rows() {
        let pool = axis_pool();
        let batch = vec![
            Vector::from(vec![1.0, 1.0]),
            Vector::from(vec![-5.0, 0.1]),
        ];
        let m = pool.nearest(&batch).unwrap();
        assert_eq!((m.row, m.slot, m.symbol), (1, 2, 12));
        assert!(m.similarity > 0.99);
    }

    #[test]
    fn test_ties_keep_first_pair() {
        let pool = axis_pool();
        // Both rows equally close to both positive axes.
        let batch = vec![Vector::from(vec![1.0, 1.0]), Vector::from(vec![1.0, 1.0])];
        let m = pool.nearest(&batch).unwrap();
        assert_eq!((m.row, m.slot), (0, 0));
    }

    #[test]
    fn test_zero_query_still_matches() {
        let pool = axis_pool();
        let m = pool.nearest(&[Vector::zeros(2)]).unwrap();
        assert_eq!((m.row, m.slot, m.similarity), (0, 0, 0.0));
    }

    #[test]
    fn test_bad_batches_rejected() {
        let pool = axis_pool();
        assert!(matches!(pool.nearest(&[]), Err(Error::EmptyBatch)));
        assert!(matches!(
            pool.nearest(&[Vector::zeros(3)]),
            Err(Error::DimensionMismatch { expected: 2, found: 3 })
        ));
    }

    #[test]
    fn test_from_slots_validates() {
        assert!(matches!(AssociativePool::from_slots(vec![]), Err(Error::EmptyPool)));
        let mixed = vec![
            PoolSlot::new(Vector::zeros(2), 0),
            PoolSlot::new(Vector::zeros(4), 0),
        ];
        assert!(AssociativePool::from_slots(mixed).is_err());
    }

    #[test]
    fn test_record_round_robin_covers_every_slot_once() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut pool = AssociativePool::random(&mut rng, 16, 8).unwrap();
        let vectors: Vec<Vector> = pool.slots().iter().map(|s| s.vector().clone()).collect();

        let mut hits = vec![0; pool.len()];
        for i in 0..pool.len() {
            let slot = pool.record(100 + i as u8);
            hits[slot] += 1;
        }
        assert!(hits.iter().all(|&h| h == 1));
        assert_eq!(pool.cursor(), 0);
        for (i, slot) in pool.slots().iter().enumerate() {
            assert_eq!(slot.symbol, 100 + i as u8);
            assert_eq!(slot.vector(), &vectors[i]);
        }
    }

    #[test]
    fn test_slot_bounds_checked() {
        let pool = axis_pool();
        assert_eq!(pool.slot(1).unwrap().symbol, 11);
        assert!(matches!(
            pool.slot(3),
            Err(Error::IndexOutOfBounds { index: 3, len: 3, .. })
        ));
    }
}
