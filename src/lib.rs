pub mod automaton;
pub mod config;
pub mod error;
pub mod generator;
pub mod memory;
pub mod pool;
pub mod predictor;
pub mod program;
pub mod report;
pub mod tape;
pub mod vector;
pub mod vm;

pub use automaton::{Observation, TapeAutomaton};
pub use config::{AutomatonConfig, Config, GeneratorConfig, MixerConfig, VmConfig};
pub use error::{Error, Result};
pub use generator::{Hypothesis, ProgramGenerator};
pub use memory::{Addressing, Memory};
pub use pool::{AssociativePool, Match, PoolSlot};
pub use predictor::{Mixer, Predictor, ScriptedPredictor};
pub use program::{ALPHABET, Op, Program};
pub use tape::Tape;
pub use vector::{Vector, cosine_similarity};
pub use vm::{Execution, GenerativeMode, Halt, Interpreter, RawMode};
