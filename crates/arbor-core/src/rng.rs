//! Seeded random source ("lot") and seed-derivation helpers.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::{Distribution, Gamma};
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

use crate::errors::{ArborError, ErrorInfo};

/// Single seeded uniform random source shared by all updaters of a chain.
///
/// The lot is a thin wrapper around `StdRng`. Every draw made during a chain
/// comes from the same stream in a fixed order, so a run is reproducible from
/// its seed alone. A lot must never be shared between threads; independent
/// chains derive their own seeds through [`derive_substream_seed`].
#[derive(Debug, Clone)]
pub struct Lot {
    rng: StdRng,
    seed: u64,
}

impl Lot {
    /// Creates a new lot from a master seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed the lot was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform deviate on the open interval (0, 1).
    pub fn uniform(&mut self) -> f64 {
        loop {
            let u: f64 = self.rng.gen();
            if u > 0.0 {
                return u;
            }
        }
    }

    /// Natural log of a uniform deviate, as used by the acceptance test.
    pub fn log_uniform(&mut self) -> f64 {
        self.uniform().ln()
    }

    /// Gamma deviate with the given shape and scale.
    pub fn gamma(&mut self, shape: f64, scale: f64) -> Result<f64, ArborError> {
        let dist = Gamma::new(shape, scale).map_err(|err| {
            ArborError::Rng(
                ErrorInfo::new("gamma-parameters", err.to_string())
                    .with_context("shape", shape.to_string())
                    .with_context("scale", scale.to_string()),
            )
        })?;
        Ok(dist.sample(&mut self.rng))
    }
}

impl RngCore for Lot {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

/// Derives the deterministic seed for a specific substream.
///
/// Hashes `(master_seed, substream)` with SipHash-1-3 keyed with zeros, so
/// the rule is stable across platforms.
pub fn derive_substream_seed(master_seed: u64, substream: u64) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(master_seed);
    hasher.write_u64(substream);
    hasher.finish()
}
