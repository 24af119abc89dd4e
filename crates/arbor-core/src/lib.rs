#![deny(missing_docs)]

//! Core error taxonomy, random source and numeric helpers shared by the
//! arbor crates.

pub mod errors;
pub mod rng;
pub mod special;

pub use errors::{ArborError, ErrorInfo};
pub use rng::{derive_substream_seed, Lot};

/// Smallest edge length stored on a tree. Shorter (or zero) edges read from
/// Newick descriptions are raised to this value so that edge-length
/// proportions never hit `ln(0)`.
pub const SMALLEST_EDGE_LENGTH: f64 = 1.0e-12;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ArborError>;
