use std::sync::atomic::{AtomicBool, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::AutomatonConfig;
use crate::error::{Error, Result};
use crate::pool::AssociativePool;
use crate::predictor::Predictor;
use crate::tape::Tape;

/// One step of the automaton as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub step: u64,
    /// Predictor row that won the similarity search.
    pub row: usize,
    /// Pool slot that won the similarity search.
    pub slot: usize,
    pub head: usize,
    pub value: u8,
}

/// Retrieval-driven tape: the predictor proposes vectors, the pool answers
/// with a symbol, the symbol moves the head and is mixed into the tape, and
/// the new cell value flows back into both the pool and the predictor.
pub struct TapeAutomaton<P> {
    tape: Tape,
    pool: AssociativePool,
    predictor: P,
    steps: u64,
}

impl<P: Predictor> TapeAutomaton<P> {
    /// Draws a fresh pool from `config.seed` and seeds the predictor.
    pub fn new(config: AutomatonConfig, predictor: P) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let pool = AssociativePool::random(&mut rng, config.pool_size, config.dimension)?;
        Self::with_pool(config, pool, predictor)
    }

    /// Uses a caller-built pool; `config.pool_size` and `config.dimension`
    /// are ignored in favour of the pool's own shape.
    pub fn with_pool(config: AutomatonConfig, pool: AssociativePool, mut predictor: P) -> Result<Self> {
        if predictor.dimension() != pool.dimension() {
            return Err(Error::DimensionMismatch {
                expected: pool.dimension(),
                found: predictor.dimension(),
            });
        }
        let tape = Tape::new(config.tape_length)?;
        predictor.ingest(config.seed_symbol);
        debug!(
            tape_length = tape.len(),
            pool_size = pool.len(),
            dimension = pool.dimension(),
            seed = config.seed,
            "tape automaton ready"
        );
        Ok(Self {
            tape,
            pool,
            predictor,
            steps: 0,
        })
    }

    pub fn step(&mut self) -> Result<Observation> {
        let batch = self.predictor.predict();
        let hit = self.pool.nearest(&batch)?;

        self.tape.shift_for(hit.symbol);
        let value = self.tape.mix(hit.symbol);
        self.pool.record(value);
        self.predictor.ingest(value);

        let observation = Observation {
            step: self.steps,
            row: hit.row,
            slot: hit.slot,
            head: self.tape.head(),
            value,
        };
        self.steps += 1;
        trace!(
            step = observation.step,
            row = hit.row,
            slot = hit.slot,
            symbol = hit.symbol,
            similarity = hit.similarity,
            head = observation.head,
            value,
            "automaton step"
        );
        Ok(observation)
    }

    pub fn run(&mut self, steps: u64) -> Result<Vec<Observation>> {
        self.run_until(steps, &AtomicBool::new(false))
    }

    /// Like [`run`](Self::run), but checks `cancel` before every step and
    /// returns what has been observed so far once it is set.
    pub fn run_until(&mut self, steps: u64, cancel: &AtomicBool) -> Result<Vec<Observation>> {
        let mut observations = Vec::with_capacity(steps.min(1 << 20) as usize);
        for _ in 0..steps {
            if cancel.load(Ordering::Relaxed) {
                debug!(completed = observations.len(), "automaton run cancelled");
                break;
            }
            observations.push(self.step()?);
        }
        debug!(steps = observations.len(), total = self.steps, "automaton run finished");
        Ok(observations)
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn pool(&self) -> &AssociativePool {
        &self.pool
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    pub fn into_predictor(self) -> P {
        self.predictor
    }
}
