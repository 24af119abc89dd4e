use std::fs;
use std::path::{Path, PathBuf};

use arbor_core::errors::{ArborError, ErrorInfo};
use serde::{Deserialize, Serialize};

use crate::config::SamplerConfig;
use crate::updater::UpdaterStats;

/// Structured record of a completed sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Configuration used for the run.
    pub config: SamplerConfig,
    /// Master seed chain seeds were derived from.
    pub master_seed: u64,
    /// Seed label captured from the configuration.
    pub seed_label: Option<String>,
    /// Heating power of every chain, cold chain first.
    pub heating_powers: Vec<f64>,
    /// Final updater statistics of the cold chain.
    pub updater_stats: Vec<UpdaterStats>,
    /// Number of trees stored in the summary.
    pub trees_sampled: usize,
    /// Digest of the most frequently sampled topology.
    pub top_topology_hash: Option<String>,
    /// Artefacts written next to the manifest.
    pub artefacts: Vec<PathBuf>,
}

impl RunManifest {
    /// Writes the manifest as pretty JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<(), ArborError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| ArborError::io("manifest-mkdir", parent, err))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            ArborError::Serde(
                ErrorInfo::new("manifest-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| ArborError::io("manifest-write", path, err))
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, ArborError> {
        let contents = fs::read_to_string(path).map_err(|err| ArborError::io("manifest-read", path, err))?;
        serde_json::from_str(&contents).map_err(|err| {
            ArborError::Serde(
                ErrorInfo::new("manifest-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}
