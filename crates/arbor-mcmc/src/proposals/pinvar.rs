use arbor_core::errors::{ArborError, ErrorInfo};
use arbor_core::special::log_beta_density;
use arbor_core::Lot;

use crate::likelihood::ChainState;
use crate::updater::Proposal;

/// Symmetric sliding window on the proportion of invariable sites.
#[derive(Debug, Clone, Default)]
pub struct PinvarProposal {
    curr: f64,
    prev: f64,
}

impl PinvarProposal {
    /// Creates the proposal.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Proposal for PinvarProposal {
    fn name(&self) -> &str {
        "Proportion of Invariable Sites"
    }

    fn default_prior_parameters(&self) -> Vec<f64> {
        vec![1.0, 1.0]
    }

    fn pull_current_state(&mut self, state: &ChainState) {
        self.curr = state.model.pinvar;
    }

    fn push_current_state(&self, state: &mut ChainState) -> Result<(), ArborError> {
        state.model.pinvar = self.curr;
        Ok(())
    }

    fn propose_new_state(&mut self, lot: &mut Lot, lambda: f64) -> Result<f64, ArborError> {
        self.prev = self.curr;
        self.curr = self.prev + lambda * (lot.uniform() - 0.5);
        Ok(0.0)
    }

    fn revert(&mut self) {
        self.curr = self.prev;
    }

    fn calc_log_prior(&self, state: &ChainState, prior_parameters: &[f64]) -> Result<f64, ArborError> {
        match prior_parameters {
            [a, b] => Ok(log_beta_density(*a, *b, state.model.pinvar)),
            _ => Err(ArborError::Invariant(
                ErrorInfo::new("prior-parameter-count", "pinvar prior takes [a, b]")
                    .with_context("len", prior_parameters.len().to_string()),
            )),
        }
    }
}
