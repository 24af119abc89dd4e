use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use arbor_core::errors::ArborError;
use serde::{Deserialize, Serialize};

/// State of a chain recorded at a sampling iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainSample {
    /// Iteration at which the sample was taken.
    pub iteration: usize,
    /// Log-likelihood of the sampled state.
    pub log_likelihood: f64,
    /// Sum of the updaters' log priors.
    pub log_prior: f64,
    /// Tree length of the sampled tree.
    pub tree_length: f64,
}

/// Collects chain samples for CSV export.
#[derive(Debug, Default, Clone)]
pub struct TraceRecorder {
    samples: Vec<ChainSample>,
}

impl TraceRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one sample.
    pub fn push(&mut self, sample: ChainSample) {
        self.samples.push(sample);
    }

    /// Recorded samples in order.
    pub fn samples(&self) -> &[ChainSample] {
        &self.samples
    }

    /// Writes `iteration,log_likelihood,log_prior,tree_length` rows.
    pub fn write_csv(&self, path: &Path) -> Result<(), ArborError> {
        let io_err = |err| ArborError::io("trace-write", path, err);
        let mut file = BufWriter::new(File::create(path).map_err(io_err)?);
        writeln!(file, "iteration,log_likelihood,log_prior,tree_length").map_err(io_err)?;
        for sample in &self.samples {
            writeln!(
                file,
                "{},{:.6},{:.6},{:.6}",
                sample.iteration, sample.log_likelihood, sample.log_prior, sample.tree_length
            )
            .map_err(io_err)?;
        }
        file.flush().map_err(io_err)
    }
}

impl From<Vec<ChainSample>> for TraceRecorder {
    fn from(samples: Vec<ChainSample>) -> Self {
        Self { samples }
    }
}
