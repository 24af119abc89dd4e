use arbor_core::errors::{ArborError, ErrorInfo};
use arbor_core::special::log_dirichlet_density;
use arbor_core::Lot;

use crate::likelihood::ChainState;
use crate::updater::Proposal;

const NUM_STATES: usize = 4;

/// Dirichlet proposal on the four state frequencies.
///
/// The new point is drawn from a Dirichlet centred on the old one with
/// concentrations `x_i / lambda`, so a larger `lambda` makes bolder moves.
#[derive(Debug, Clone, Default)]
pub struct StateFreqProposal {
    curr_point: Vec<f64>,
    prev_point: Vec<f64>,
}

impl StateFreqProposal {
    /// Creates the proposal with an empty current point.
    pub fn new() -> Self {
        Self::default()
    }

    /// The point the proposal currently holds.
    pub fn current_point(&self) -> &[f64] {
        &self.curr_point
    }
}

fn concentrations(point: &[f64], lambda: f64) -> Vec<f64> {
    point.iter().map(|&x| x / lambda).collect()
}

impl Proposal for StateFreqProposal {
    fn name(&self) -> &str {
        "State Frequencies"
    }

    fn default_prior_parameters(&self) -> Vec<f64> {
        vec![1.0; NUM_STATES]
    }

    fn pull_current_state(&mut self, state: &ChainState) {
        self.curr_point.clone_from(&state.model.state_freqs);
    }

    fn push_current_state(&self, state: &mut ChainState) -> Result<(), ArborError> {
        if self.curr_point.len() != NUM_STATES {
            return Err(ArborError::Invariant(
                ErrorInfo::new("state-freq-length", "expected four state frequencies")
                    .with_context("len", self.curr_point.len().to_string()),
            ));
        }
        let sum: f64 = self.curr_point.iter().sum();
        if sum.is_nan() || (sum - 1.0).abs() >= 1.0e-8 {
            return Err(ArborError::Invariant(
                ErrorInfo::new("state-freq-sum", "state frequencies do not sum to 1")
                    .with_context("sum", sum.to_string()),
            ));
        }
        state.model.state_freqs.clone_from(&self.curr_point);
        Ok(())
    }

    fn propose_new_state(&mut self, lot: &mut Lot, lambda: f64) -> Result<f64, ArborError> {
        self.prev_point.clone_from(&self.curr_point);
        let forward = concentrations(&self.prev_point, lambda);
        let mut draws = Vec::with_capacity(forward.len());
        for &shape in &forward {
            draws.push(lot.gamma(shape, 1.0)?);
        }
        let total: f64 = draws.iter().sum();
        let point: Vec<f64> = draws.iter().map(|&draw| draw / total).collect();
        // Tiny shapes can underflow every draw; such a move leaves the simplex interior.
        if !(total.is_finite() && total > 0.0) || point.iter().any(|&x| !(x.is_finite() && x > 0.0)) {
            self.curr_point.clone_from(&self.prev_point);
            return Ok(f64::NEG_INFINITY);
        }
        self.curr_point = point;

        let reverse = concentrations(&self.curr_point, lambda);
        let log_reverse = log_dirichlet_density(&reverse, &self.prev_point);
        let log_forward = log_dirichlet_density(&forward, &self.curr_point);
        Ok(log_reverse - log_forward)
    }

    fn revert(&mut self) {
        std::mem::swap(&mut self.curr_point, &mut self.prev_point);
    }

    fn calc_log_prior(&self, state: &ChainState, prior_parameters: &[f64]) -> Result<f64, ArborError> {
        if prior_parameters.len() != state.model.state_freqs.len() {
            return Err(ArborError::Invariant(
                ErrorInfo::new("prior-parameter-count", "one Dirichlet parameter per state")
                    .with_context("expected", state.model.state_freqs.len().to_string())
                    .with_context("actual", prior_parameters.len().to_string()),
            ));
        }
        Ok(log_dirichlet_density(prior_parameters, &state.model.state_freqs))
    }
}
