use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::automaton::Observation;
use crate::error::Result;

pub const CSV_HEADER: &str = "step,row,slot,head,value";

pub fn write_csv<W: Write>(mut out: W, observations: &[Observation]) -> Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for o in observations {
        writeln!(out, "{},{},{},{},{}", o.step, o.row, o.slot, o.head, o.value)?;
    }
    out.flush()?;
    Ok(())
}

/// Everything needed to reproduce and inspect one automaton run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub seed: u64,
    pub steps: u64,
    pub observations: Vec<Observation>,
}

impl RunReport {
    pub fn new(seed: u64, observations: Vec<Observation>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            seed,
            steps: observations.len() as u64,
            observations,
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
