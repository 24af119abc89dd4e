#![deny(missing_docs)]

//! Metropolis-Hastings machinery for the arbor sampler: the likelihood
//! boundary, the generic updater engine, proposal kinds, priors, chains and
//! the heated-chain ladder.

/// Single chains and their run schedule.
pub mod chain;
/// YAML configuration schema and defaults.
pub mod config;
/// Deterministic seed derivation helpers.
pub mod determinism;
/// Likelihood oracle boundary, model parameters and chain state.
pub mod likelihood;
/// Run manifest serialization helpers.
pub mod manifest;
/// Trace samples and CSV export.
pub mod metrics;
/// Prior densities shared by proposal kinds.
pub mod priors;
/// Proposal kinds driven by the updater engine.
pub mod proposals;
/// Heated chain ladder helpers.
pub mod tempering;
/// Generic Metropolis-Hastings updater engine.
pub mod updater;

pub use chain::{Chain, ChainSummary, RunSchedule};
pub use config::{LadderConfig, SamplerConfig, SeedPolicy, UpdaterConfig, UpdaterSpec};
pub use likelihood::{ChainState, FlatLikelihood, FnLikelihood, LikelihoodOracle, Model};
pub use manifest::RunManifest;
pub use metrics::{ChainSample, TraceRecorder};
pub use priors::{edge_length_prior, EdgeLengthPrior};
pub use proposals::{PinvarProposal, ProposalKind, StateFreqProposal, TreeLengthProposal};
pub use tempering::{build_ladder, run_ladder, LadderRun};
pub use updater::{Proposal, Updater, UpdaterStats};
