use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Interpreter limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    pub memory_size: usize,
    pub cycle_limit: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            memory_size: 1024 * 1024,
            cycle_limit: 1024 * 1024,
        }
    }
}

/// Shape of the tape automaton and the seed its pool is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomatonConfig {
    pub tape_length: usize,
    pub pool_size: usize,
    pub dimension: usize,
    pub seed: u64,
    /// Symbol ingested once before the first step.
    pub seed_symbol: u8,
}

impl Default for AutomatonConfig {
    fn default() -> Self {
        Self {
            tape_length: 1024,
            pool_size: 1024,
            dimension: 256,
            seed: 0,
            seed_symbol: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub min_len: usize,
    pub max_len: usize,
    pub max_depth: usize,
    /// Chance of opening a block at any position while under `max_depth`.
    pub loop_probability: f64,
    /// Chance of closing the innermost open block.
    pub close_probability: f64,
    pub min_output: usize,
    pub max_output: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            min_len: 16,
            max_len: 128,
            max_depth: 4,
            loop_probability: 0.1,
            close_probability: 0.15,
            min_output: 8,
            max_output: 64,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_len > self.max_len {
            return Err(Error::InvalidConfig(
                "generator.min_len exceeds generator.max_len".to_string(),
            ));
        }
        if self.min_output > self.max_output {
            return Err(Error::InvalidConfig(
                "generator.min_output exceeds generator.max_output".to_string(),
            ));
        }
        for (name, p) in [
            ("generator.loop_probability", self.loop_probability),
            ("generator.close_probability", self.close_probability),
        ] {
            // NaN fails the range check too.
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::InvalidConfig(format!("{name} must lie in [0, 1]")));
            }
        }
        Ok(())
    }
}

/// Largest accepted `MixerConfig::window`; every ingest walks the window.
pub const MAX_MIXER_WINDOW: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    pub dimension: usize,
    /// Upper bound on rows returned by one `predict`.
    pub rows: usize,
    pub seed: u64,
    /// Hidden-state retention per ingest.
    pub decay: f64,
    /// Number of ingests a past symbol stays eligible for weight updates.
    pub window: u64,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            dimension: 256,
            rows: 4,
            seed: 0,
            decay: 0.9,
            window: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vm: VmConfig,
    pub automaton: AutomatonConfig,
    pub generator: GeneratorConfig,
    pub mixer: MixerConfig,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Config = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("vm.memory_size", self.vm.memory_size),
            ("vm.cycle_limit", self.vm.cycle_limit),
            ("automaton.tape_length", self.automaton.tape_length),
            ("automaton.pool_size", self.automaton.pool_size),
            ("automaton.dimension", self.automaton.dimension),
            ("mixer.dimension", self.mixer.dimension),
            ("mixer.rows", self.mixer.rows),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be non-zero")));
            }
        }
        if self.mixer.dimension != self.automaton.dimension {
            return Err(Error::InvalidConfig(format!(
                "mixer.dimension {} differs from automaton.dimension {}",
                self.mixer.dimension, self.automaton.dimension
            )));
        }
        self.generator.validate()?;
        if !(0.0..=1.0).contains(&self.mixer.decay) {
            return Err(Error::InvalidConfig("mixer.decay must lie in [0, 1]".to_string()));
        }
        if self.mixer.window > MAX_MIXER_WINDOW {
            return Err(Error::InvalidConfig(format!(
                "mixer.window {} exceeds {MAX_MIXER_WINDOW}",
                self.mixer.window
            )));
        }
        Ok(())
    }
}
