use arbor_core::errors::ArborError;
use arbor_core::Lot;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::config::UpdaterConfig;
use crate::likelihood::ChainState;

/// Capability interface implemented by every proposal kind.
///
/// A kind holds a private copy of the parameters it moves (the "current
/// point"), copies it in from the chain state, perturbs it, and copies it
/// back. It must be able to restore the pre-proposal point exactly.
pub trait Proposal {
    /// Display name, e.g. `"State Frequencies"`.
    fn name(&self) -> &str;

    /// Prior parameters used when none are configured.
    fn default_prior_parameters(&self) -> Vec<f64>;

    /// Copies the parameters this kind moves out of `state`.
    fn pull_current_state(&mut self, state: &ChainState);

    /// Writes the current point into `state`.
    fn push_current_state(&self, state: &mut ChainState) -> Result<(), ArborError>;

    /// Replaces the current point with a proposal, remembering the previous
    /// one. Returns the log Hastings ratio of the move.
    fn propose_new_state(&mut self, lot: &mut Lot, lambda: f64) -> Result<f64, ArborError>;

    /// Restores the point saved by the last proposal.
    fn revert(&mut self);

    /// Log prior of the parameters as they currently stand in `state`.
    fn calc_log_prior(&self, state: &ChainState, prior_parameters: &[f64]) -> Result<f64, ArborError>;
}

/// Acceptance counters and tuning state of one updater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdaterStats {
    /// Updater name.
    pub name: String,
    /// Current boldness.
    pub lambda: f64,
    /// Accepted proposals.
    pub naccepts: u64,
    /// Attempted proposals.
    pub nattempts: u64,
    /// Acceptance percentage.
    pub accept_pct: f64,
}

/// Generic Metropolis-Hastings engine wrapped around one proposal kind.
pub struct Updater {
    kind: Box<dyn Proposal>,
    name: String,
    lambda: f64,
    target_acceptance: f64,
    naccepts: u64,
    nattempts: u64,
    tuning: bool,
    prior_parameters: Vec<f64>,
    heating_power: f64,
    log_hastings_ratio: f64,
}

const DEFAULT_LAMBDA: f64 = 0.0001;
const DEFAULT_TARGET_ACCEPTANCE: f64 = 0.3;
const MAX_LAMBDA: f64 = 1000.0;

impl Updater {
    /// Wraps `kind` with default engine settings.
    pub fn new(kind: Box<dyn Proposal>) -> Self {
        let mut updater = Self {
            name: kind.name().to_string(),
            kind,
            lambda: DEFAULT_LAMBDA,
            target_acceptance: DEFAULT_TARGET_ACCEPTANCE,
            naccepts: 0,
            nattempts: 0,
            tuning: true,
            prior_parameters: Vec::new(),
            heating_power: 1.0,
            log_hastings_ratio: 0.0,
        };
        updater.clear();
        updater
    }

    /// Builds an updater from its configuration block.
    pub fn from_config(kind: Box<dyn Proposal>, config: &UpdaterConfig) -> Self {
        let mut updater = Self::new(kind);
        updater.set_lambda(config.lambda_init);
        updater.set_target_acceptance(config.target_acceptance);
        updater.set_tuning(config.tuning_enabled);
        updater.set_heating_power(config.heating_power);
        if let Some(params) = &config.prior_params {
            updater.set_prior_parameters(params.clone());
        }
        updater
    }

    /// Resets every engine setting and counter to its default.
    pub fn clear(&mut self) {
        self.name = self.kind.name().to_string();
        self.tuning = true;
        self.lambda = DEFAULT_LAMBDA;
        self.target_acceptance = DEFAULT_TARGET_ACCEPTANCE;
        self.naccepts = 0;
        self.nattempts = 0;
        self.heating_power = 1.0;
        self.prior_parameters = self.kind.default_prior_parameters();
        self.reset();
    }

    fn reset(&mut self) {
        self.log_hastings_ratio = 0.0;
    }

    /// Performs one Metropolis-Hastings step and returns the log-likelihood
    /// of the state the chain is left in.
    ///
    /// On rejection the kind's previous point is pushed back and
    /// `prev_log_likelihood` is returned unchanged. A failure after the
    /// proposal was pushed also restores the previous point before the error
    /// is returned.
    pub fn update(&mut self, state: &mut ChainState, prev_log_likelihood: f64) -> Result<f64, ArborError> {
        self.kind.pull_current_state(state);
        let prev_log_prior = self.kind.calc_log_prior(state, &self.prior_parameters)?;

        self.log_hastings_ratio = self.kind.propose_new_state(&mut state.lot, self.lambda)?;

        let outcome = self
            .kind
            .push_current_state(state)
            .and_then(|()| self.evaluate(state, prev_log_likelihood, prev_log_prior));
        let accepted_log_likelihood = match outcome {
            Ok(value) => value,
            Err(err) => {
                self.kind.revert();
                if let Err(restore) = self.kind.push_current_state(state) {
                    warn!(updater = %self.name, error = %restore, "failed to restore state");
                }
                self.reset();
                return Err(err);
            }
        };

        let log_likelihood = match accepted_log_likelihood {
            Some(log_likelihood) => {
                self.naccepts += 1;
                log_likelihood
            }
            None => {
                self.kind.revert();
                if let Err(err) = self.kind.push_current_state(state) {
                    self.reset();
                    return Err(err);
                }
                prev_log_likelihood
            }
        };

        self.tune(accepted_log_likelihood.is_some());
        trace!(
            updater = %self.name,
            accepted = accepted_log_likelihood.is_some(),
            lambda = self.lambda,
            "update"
        );
        self.reset();
        Ok(log_likelihood)
    }

    /// Returns the new log-likelihood when the proposal is accepted.
    fn evaluate(
        &self,
        state: &mut ChainState,
        prev_log_likelihood: f64,
        prev_log_prior: f64,
    ) -> Result<Option<f64>, ArborError> {
        let log_likelihood = state.calc_log_likelihood()?;
        let log_prior = self.kind.calc_log_prior(state, &self.prior_parameters)?;
        if log_prior == f64::NEG_INFINITY {
            return Ok(None);
        }
        let log_diff = self.log_hastings_ratio
            + self.heating_power * ((log_likelihood + log_prior) - (prev_log_likelihood + prev_log_prior));
        let log_u = state.lot.log_uniform();
        Ok((log_u <= log_diff).then_some(log_likelihood))
    }

    /// Counts an attempt and, when tuning, nudges the boldness toward the
    /// target acceptance rate.
    pub fn tune(&mut self, accepted: bool) {
        self.nattempts += 1;
        if self.tuning {
            let gamma_n = 10.0 / (100.0 + self.nattempts as f64);
            if accepted {
                self.lambda *=
                    1.0 + gamma_n * (1.0 - self.target_acceptance) / (2.0 * self.target_acceptance);
            } else {
                self.lambda *= 1.0 - gamma_n * 0.5;
            }
            if self.lambda > MAX_LAMBDA {
                self.lambda = MAX_LAMBDA;
            }
        }
    }

    /// Current boldness.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Sets the boldness.
    pub fn set_lambda(&mut self, lambda: f64) {
        self.lambda = lambda;
    }

    /// Power applied to the posterior difference.
    pub fn heating_power(&self) -> f64 {
        self.heating_power
    }

    /// Sets the heating power.
    pub fn set_heating_power(&mut self, power: f64) {
        self.heating_power = power;
    }

    /// Turns tuning on or off; the acceptance counters restart from zero.
    pub fn set_tuning(&mut self, on: bool) {
        self.tuning = on;
        self.naccepts = 0;
        self.nattempts = 0;
    }

    /// Whether tuning is active.
    pub fn is_tuning(&self) -> bool {
        self.tuning
    }

    /// Sets the acceptance rate tuning aims for.
    pub fn set_target_acceptance(&mut self, target: f64) {
        self.target_acceptance = target;
    }

    /// Target acceptance rate.
    pub fn target_acceptance(&self) -> f64 {
        self.target_acceptance
    }

    /// Replaces the prior parameters.
    pub fn set_prior_parameters(&mut self, params: Vec<f64>) {
        self.prior_parameters = params;
    }

    /// Prior parameters handed to the kind.
    pub fn prior_parameters(&self) -> &[f64] {
        &self.prior_parameters
    }

    /// Log prior of the current state under this updater's prior.
    pub fn calc_log_prior(&self, state: &ChainState) -> Result<f64, ArborError> {
        self.kind.calc_log_prior(state, &self.prior_parameters)
    }

    /// Log Hastings ratio of the proposal in flight (0 between updates).
    pub fn log_hastings_ratio(&self) -> f64 {
        self.log_hastings_ratio
    }

    /// Percentage of attempts accepted, 0 before the first attempt.
    pub fn accept_pct(&self) -> f64 {
        if self.nattempts == 0 {
            0.0
        } else {
            100.0 * self.naccepts as f64 / self.nattempts as f64
        }
    }

    /// Accepted proposals so far.
    pub fn naccepts(&self) -> u64 {
        self.naccepts
    }

    /// Attempted proposals so far.
    pub fn nattempts(&self) -> u64 {
        self.nattempts
    }

    /// Updater name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> UpdaterStats {
        UpdaterStats {
            name: self.name.clone(),
            lambda: self.lambda,
            naccepts: self.naccepts,
            nattempts: self.nattempts,
            accept_pct: self.accept_pct(),
        }
    }
}

impl std::fmt::Debug for Updater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater")
            .field("name", &self.name)
            .field("lambda", &self.lambda)
            .field("target_acceptance", &self.target_acceptance)
            .field("naccepts", &self.naccepts)
            .field("nattempts", &self.nattempts)
            .field("tuning", &self.tuning)
            .field("prior_parameters", &self.prior_parameters)
            .field("heating_power", &self.heating_power)
            .finish()
    }
}
