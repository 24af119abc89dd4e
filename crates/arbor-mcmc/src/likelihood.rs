use std::fmt;

use arbor_core::errors::{ArborError, ErrorInfo};
use arbor_core::Lot;
use arbor_tree::Tree;
use serde::{Deserialize, Serialize};

/// Parameters of the substitution model that updaters read and write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
    /// Equilibrium frequencies of the four nucleotide states.
    pub state_freqs: Vec<f64>,
    /// Proportion of invariable sites.
    pub pinvar: f64,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            state_freqs: vec![0.25; 4],
            pinvar: 0.0,
        }
    }
}

impl Model {
    /// Checks that the frequencies form a distribution over four states and
    /// that the invariable-site proportion lies in `[0, 1)`.
    pub fn validate(&self) -> Result<(), ArborError> {
        if self.state_freqs.len() != 4 {
            return Err(ArborError::Invariant(
                ErrorInfo::new("state-freq-length", "expected four state frequencies")
                    .with_context("len", self.state_freqs.len().to_string()),
            ));
        }
        let sum: f64 = self.state_freqs.iter().sum();
        if (sum - 1.0).abs() >= 1.0e-8 || self.state_freqs.iter().any(|&freq| freq <= 0.0) {
            return Err(ArborError::Invariant(
                ErrorInfo::new("state-freq-sum", "state frequencies must be positive and sum to 1")
                    .with_context("sum", sum.to_string()),
            ));
        }
        if !(0.0..1.0).contains(&self.pinvar) {
            return Err(ArborError::Invariant(
                ErrorInfo::new("pinvar-range", "pinvar must lie in [0, 1)")
                    .with_context("pinvar", self.pinvar.to_string()),
            ));
        }
        Ok(())
    }
}

/// Computes the log-likelihood of a tree under a model.
///
/// Implementations may cache partial results between calls, which is why
/// evaluation takes `&mut self`.
pub trait LikelihoodOracle {
    /// Log-likelihood of the data given `tree` and `model`.
    fn calc_log_likelihood(&mut self, tree: &Tree, model: &Model) -> Result<f64, ArborError>;
}

/// Oracle that ignores the data, so the chain samples from the prior.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatLikelihood;

impl LikelihoodOracle for FlatLikelihood {
    fn calc_log_likelihood(&mut self, _tree: &Tree, _model: &Model) -> Result<f64, ArborError> {
        Ok(0.0)
    }
}

/// Adapts a closure into a [`LikelihoodOracle`].
pub struct FnLikelihood<F>(pub F);

impl<F> LikelihoodOracle for FnLikelihood<F>
where
    F: FnMut(&Tree, &Model) -> Result<f64, ArborError>,
{
    fn calc_log_likelihood(&mut self, tree: &Tree, model: &Model) -> Result<f64, ArborError> {
        (self.0)(tree, model)
    }
}

impl<F> fmt::Debug for FnLikelihood<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnLikelihood")
    }
}

/// Everything one chain mutates: the tree, the model, the random source and
/// the likelihood oracle.
///
/// Updaters receive the state by mutable reference for the duration of a
/// single call and never retain it.
pub struct ChainState {
    /// Current tree.
    pub tree: Tree,
    /// Current model parameters.
    pub model: Model,
    /// Random source owned by this chain.
    pub lot: Lot,
    oracle: Box<dyn LikelihoodOracle>,
}

impl ChainState {
    /// Bundles the pieces of a chain.
    pub fn new(tree: Tree, model: Model, lot: Lot, oracle: Box<dyn LikelihoodOracle>) -> Self {
        Self {
            tree,
            model,
            lot,
            oracle,
        }
    }

    /// Evaluates the oracle on the current tree and model.
    pub fn calc_log_likelihood(&mut self) -> Result<f64, ArborError> {
        self.oracle.calc_log_likelihood(&self.tree, &self.model)
    }
}

impl fmt::Debug for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainState")
            .field("tree", &self.tree)
            .field("model", &self.model)
            .field("lot", &self.lot)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_valid() {
        assert!(Model::default().validate().is_ok());
    }

    #[test]
    fn model_validation_rejects_bad_frequencies() {
        let model = Model {
            state_freqs: vec![0.5, 0.5, 0.5, 0.5],
            pinvar: 0.0,
        };
        let err = model.validate().unwrap_err();
        assert!(err.is_invariant());
        assert_eq!(err.info().code, "state-freq-sum");
    }

    #[test]
    fn closure_oracle_sees_current_state() {
        let tree = Tree::from_newick("(1:0.5,2:0.5,3:1.0);", false, false).unwrap();
        let oracle = FnLikelihood(|tree: &Tree, model: &Model| -> Result<f64, ArborError> {
            Ok(-tree.total_edge_length() - model.pinvar)
        });
        let mut state = ChainState::new(tree, Model::default(), Lot::from_seed(1), Box::new(oracle));
        assert_eq!(state.calc_log_likelihood().unwrap(), -2.0);
    }
}
