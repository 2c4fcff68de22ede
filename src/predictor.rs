use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::config::{MAX_MIXER_WINDOW, MixerConfig};
use crate::error::{Error, Result};
use crate::vector::Vector;

// --- CONSTANTS ---
const A_PLUS: f64 = 0.1;
const A_MINUS: f64 = 0.12;
/// Decay constant, measured in ingests.
const TAU: f64 = 2.0;
const NORMALIZATION_CAP: f64 = 5.0;
const SYMBOLS: usize = 256;

/// Numeric state that turns a symbol history into query vectors.
pub trait Predictor {
    fn dimension(&self) -> usize;

    fn ingest(&mut self, symbol: u8);

    /// At least one vector, each of [`dimension`](Self::dimension) components.
    fn predict(&mut self) -> Vec<Vector>;

    fn ingest_all(&mut self, symbols: &[u8]) {
        for &symbol in symbols {
            self.ingest(symbol);
        }
    }
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn ingest(&mut self, symbol: u8) {
        (**self).ingest(symbol)
    }

    fn predict(&mut self) -> Vec<Vector> {
        (**self).predict()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionWeights {
    pub weights: BTreeMap<u8, BTreeMap<u8, f64>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct WeightEntry {
    from: u8,
    to: u8,
    weight: f64,
}

impl TransitionWeights {
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let entries: Vec<WeightEntry> = self
            .weights
            .iter()
            .flat_map(|(from, outgoing)| {
                outgoing.iter().map(|(to, weight)| WeightEntry {
                    from: *from,
                    to: *to,
                    weight: *weight,
                })
            })
            .collect();
        serde_json::to_writer_pretty(BufWriter::new(file), &entries)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let entries: Vec<WeightEntry> = serde_json::from_reader(BufReader::new(file))?;
        let mut weights: BTreeMap<u8, BTreeMap<u8, f64>> = BTreeMap::new();
        for entry in entries {
            weights
                .entry(entry.from)
                .or_default()
                .insert(entry.to, entry.weight);
        }
        Ok(Self { weights })
    }

    /// Strongest successor of `from`; ties go to the lowest symbol.
    pub fn best_next(&self, from: u8) -> Option<u8> {
        let outgoing = self.weights.get(&from)?;
        let mut best: Option<(u8, f64)> = None;
        for (&to, &w) in outgoing {
            if best.is_none_or(|(_, bw)| w > bw) {
                best = Some((to, w));
            }
        }
        best.map(|(to, _)| to)
    }

    fn outgoing_sum(&self, from: u8) -> f64 {
        self.weights
            .get(&from)
            .map(|outgoing| outgoing.values().sum())
            .unwrap_or(0.0)
    }
}

/// Deterministic predictor: a decaying mix of per-symbol embeddings plus a
/// spike-timing weight table over recently ingested symbols.
#[derive(Clone, Debug)]
pub struct Mixer {
    config: MixerConfig,
    embeddings: Vec<Vector>,
    state: Vector,
    pub memory: TransitionWeights,
    recent: VecDeque<(u8, u64)>,
    tick: u64,
    last: Option<u8>,
}

impl Mixer {
    pub fn new(config: MixerConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let embeddings = (0..SYMBOLS)
            .map(|_| Vector::random(&mut rng, config.dimension))
            .collect();
        Self {
            embeddings,
            state: Vector::zeros(config.dimension),
            memory: TransitionWeights::default(),
            recent: VecDeque::new(),
            tick: 0,
            last: None,
            config,
        }
    }

    pub fn state(&self) -> &Vector {
        &self.state
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn best_next_symbol(&self, from: u8) -> Option<u8> {
        self.memory.best_next(from)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        self.memory.save_to_file(path)
    }

    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> io::Result<()> {
        self.memory = TransitionWeights::load_from_file(path)?;
        Ok(())
    }

    fn process_symbol(&mut self, current: u8) {
        let tick = self.tick;
        let window = self.config.window.min(MAX_MIXER_WINDOW);
        self.recent.retain(|&(_, t)| tick - t < window);

        let mut updates: Vec<(u8, u8, f64)> = Vec::new();
        let mut normalize_sources: BTreeSet<u8> = BTreeSet::new();
        for &(past, t) in &self.recent {
            let falloff = (-((tick - t) as f64) / TAU).exp();
            updates.push((past, current, A_PLUS * falloff));
            updates.push((current, past, -A_MINUS * falloff));
            normalize_sources.insert(past);
        }

        for (from, to, delta) in updates {
            *self
                .memory
                .weights
                .entry(from)
                .or_default()
                .entry(to)
                .or_insert(0.0) += delta;
        }

        // Keep outgoing weight from exploding.
        for source in normalize_sources {
            let sum = self.memory.outgoing_sum(source);
            if sum > NORMALIZATION_CAP {
                let factor = NORMALIZATION_CAP / sum;
                if let Some(outgoing) = self.memory.weights.get_mut(&source) {
                    for w in outgoing.values_mut() {
                        *w *= factor;
                    }
                }
            }
        }

        self.recent.push_back((current, tick));
    }
}

impl Predictor for Mixer {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn ingest(&mut self, symbol: u8) {
        self.tick += 1;
        self.process_symbol(symbol);
        self.state.scale(self.config.decay);
        self.state.add_scaled(&self.embeddings[symbol as usize], 1.0);
        self.last = Some(symbol);
    }

    /// Row 0 is the hidden state; further rows lean it toward the
    /// strongest positively weighted successors of the last symbol.
    fn predict(&mut self) -> Vec<Vector> {
        let mut rows = vec![self.state.clone()];
        let Some(outgoing) = self.last.and_then(|last| self.memory.weights.get(&last)) else {
            return rows;
        };

        let mut ranked: Vec<(u8, f64)> = outgoing
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(s, w)| (*s, *w))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        for (next, weight) in ranked.into_iter().take(self.config.rows.saturating_sub(1)) {
            let mut row = self.state.clone();
            row.add_scaled(&self.embeddings[next as usize], weight);
            rows.push(row);
        }
        rows
    }
}

/// Replays a fixed list of batches in order, cycling forever, and records
/// everything ingested.
#[derive(Clone, Debug)]
pub struct ScriptedPredictor {
    batches: Vec<Vec<Vector>>,
    next: usize,
    dimension: usize,
    ingested: Vec<u8>,
}

impl ScriptedPredictor {
    pub fn new(batches: Vec<Vec<Vector>>) -> Result<Self> {
        let dimension = batches
            .first()
            .and_then(|batch| batch.first())
            .ok_or(Error::EmptyBatch)?
            .dimension();
        for batch in &batches {
            if batch.is_empty() {
                return Err(Error::EmptyBatch);
            }
            if let Some(bad) = batch.iter().find(|v| v.dimension() != dimension) {
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    found: bad.dimension(),
                });
            }
        }
        Ok(Self {
            batches,
            next: 0,
            dimension,
            ingested: Vec::new(),
        })
    }

    pub fn ingested(&self) -> &[u8] {
        &self.ingested
    }
}

impl Predictor for ScriptedPredictor {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn ingest(&mut self, symbol: u8) {
        self.ingested.push(symbol);
    }

    fn predict(&mut self) -> Vec<Vector> {
        let batch = self.batches[self.next].clone();
        self.next = (self.next + 1) % self.batches.len();
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(seed: u64) -> MixerConfig {
        MixerConfig {
            dimension: 16,
            seed,
            ..MixerConfig::default()
        }
    }

    #[test]
    fn test_mixer_is_deterministic() {
        let mut a = Mixer::new(small_config(11));
        let mut b = Mixer::new(small_config(11));
        let history = [3u8, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5];
        a.ingest_all(&history);
        b.ingest_all(&history);
        assert_eq!(a.predict(), b.predict());
        assert_eq!(a.memory, b.memory);
    }

    #[test]
    fn test_seed_changes_embeddings() {
        let mut a = Mixer::new(small_config(1));
        let mut b = Mixer::new(small_config(2));
        a.ingest(7);
        b.ingest(7);
        assert_ne!(a.predict(), b.predict());
    }

    #[test]
    fn test_fresh_mixer_predicts_zero_row() {
        let mut mixer = Mixer::new(small_config(0));
        let rows = mixer.predict();
        assert_eq!(rows, vec![Vector::zeros(16)]);
    }

    #[test]
    fn test_learns_repeating_successor() {
        let mut mixer = Mixer::new(small_config(0));
        for _ in 0..20 {
            mixer.ingest_all(&[5, 6, 7]);
        }
        assert_eq!(mixer.best_next_symbol(5), Some(6));
        assert_eq!(mixer.best_next_symbol(6), Some(7));
        assert_eq!(mixer.best_next_symbol(7), Some(5));
        assert_eq!(mixer.ticks(), 60);
    }

    #[test]
    fn test_predict_row_bounds() {
        let config = MixerConfig {
            rows: 3,
            ..small_config(4)
        };
        let mut mixer = Mixer::new(config);
        for s in 0..=40u8 {
            mixer.ingest(s % 9);
            let rows = mixer.predict();
            assert!(!rows.is_empty() && rows.len() <= 3);
            assert!(rows.iter().all(|r| r.dimension() == 16));
        }
    }

    #[test]
    fn test_outgoing_weight_is_capped() {
        let mut mixer = Mixer::new(small_config(0));
        for _ in 0..500 {
            mixer.ingest_all(&[1, 2]);
        }
        for from in mixer.memory.weights.keys() {
            assert!(mixer.memory.outgoing_sum(*from) <= NORMALIZATION_CAP + 1e-9);
        }
    }

    #[test]
    fn test_huge_window_stays_bounded() {
        let config = MixerConfig {
            window: u64::MAX,
            ..small_config(0)
        };
        let mut mixer = Mixer::new(config);
        for i in 0..1100u32 {
            mixer.ingest((i % 251) as u8);
        }
        assert!(mixer.recent.len() <= MAX_MIXER_WINDOW as usize);
    }

    #[test]
    fn test_weights_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brain.json");

        let mut trained = Mixer::new(small_config(0));
        for _ in 0..10 {
            trained.ingest_all(&[5, 6, 7]);
        }
        trained.save_to_file(&path).unwrap();

        let mut restored = Mixer::new(small_config(0));
        restored.load_from_file(&path).unwrap();
        assert_eq!(restored.memory.weights.len(), trained.memory.weights.len());
        assert_eq!(restored.best_next_symbol(5), Some(6));
    }

    #[test]
    fn test_missing_brain_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut mixer = Mixer::new(small_config(0));
        assert!(mixer.load_from_file(dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_scripted_cycles_and_records() {
        let a = vec![Vector::from(vec![1.0, 0.0])];
        let b = vec![Vector::from(vec![0.0, 1.0]), Vector::from(vec![1.0, 1.0])];
        let mut scripted = ScriptedPredictor::new(vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(scripted.dimension(), 2);
        assert_eq!(scripted.predict(), a);
        assert_eq!(scripted.predict(), b);
        assert_eq!(scripted.predict(), a);
        scripted.ingest_all(&[4, 2]);
        assert_eq!(scripted.ingested(), &[4, 2]);
    }

    #[test]
    fn test_scripted_rejects_bad_batches() {
        assert!(ScriptedPredictor::new(vec![]).is_err());
        assert!(ScriptedPredictor::new(vec![vec![Vector::zeros(2)], vec![]]).is_err());
        assert!(ScriptedPredictor::new(vec![vec![Vector::zeros(2), Vector::zeros(3)]]).is_err());
    }
}
