use arbor_core::errors::ArborError;
use arbor_core::Lot;

use crate::likelihood::ChainState;
use crate::priors::edge_length_prior;
use crate::updater::Proposal;

/// Rescales every edge by a common multiplier `m = exp(lambda * (u - 1/2))`.
///
/// The pre-proposal edge-length vector is kept so a rejection restores the
/// tree exactly rather than dividing the multiplier back out.
#[derive(Debug, Clone, Default)]
pub struct TreeLengthProposal {
    curr_lengths: Vec<f64>,
    prev_lengths: Vec<f64>,
}

impl TreeLengthProposal {
    /// Creates the proposal.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Proposal for TreeLengthProposal {
    fn name(&self) -> &str {
        "Tree Length"
    }

    fn default_prior_parameters(&self) -> Vec<f64> {
        vec![1.0, 10.0, 1.0]
    }

    fn pull_current_state(&mut self, state: &ChainState) {
        self.curr_lengths = state.tree.edge_lengths();
    }

    fn push_current_state(&self, state: &mut ChainState) -> Result<(), ArborError> {
        state.tree.set_edge_lengths(&self.curr_lengths)
    }

    fn propose_new_state(&mut self, lot: &mut Lot, lambda: f64) -> Result<f64, ArborError> {
        self.prev_lengths.clone_from(&self.curr_lengths);
        let log_m = lambda * (lot.uniform() - 0.5);
        let m = log_m.exp();
        for length in &mut self.curr_lengths {
            *length *= m;
        }
        Ok(log_m)
    }

    fn revert(&mut self) {
        std::mem::swap(&mut self.curr_lengths, &mut self.prev_lengths);
    }

    fn calc_log_prior(&self, state: &ChainState, prior_parameters: &[f64]) -> Result<f64, ArborError> {
        Ok(edge_length_prior(&state.tree, prior_parameters)?.total)
    }
}
