use std::cell::Cell;
use std::rc::Rc;

use arbor_core::errors::ErrorInfo;
use arbor_core::special::log_beta_density;
use arbor_core::{ArborError, Lot};
use arbor_mcmc::{
    ChainState, FlatLikelihood, FnLikelihood, Model, Proposal, StateFreqProposal, TreeLengthProposal, Updater,
};
use arbor_tree::Tree;

const NEWICK: &str = "((1:0.13,2:0.21):0.05,3:0.34,(4:0.08,5:0.55):0.17);";

/// Pushes an invalid pinvar whose Beta prior is `-inf`.
#[derive(Default)]
struct NegativePinvar {
    curr: f64,
    prev: f64,
}

impl Proposal for NegativePinvar {
    fn name(&self) -> &str {
        "negative pinvar"
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

    fn propose_new_state(&mut self, _lot: &mut Lot, _lambda: f64) -> Result<f64, ArborError> {
        self.prev = self.curr;
        self.curr = -0.5;
        Ok(0.0)
    }

    fn revert(&mut self) {
        self.curr = self.prev;
    }

    fn calc_log_prior(&self, state: &ChainState, params: &[f64]) -> Result<f64, ArborError> {
        Ok(log_beta_density(params[0], params[1], state.model.pinvar))
    }
}

fn model() -> Model {
    Model {
        state_freqs: vec![0.1, 0.2, 0.3, 0.4],
        pinvar: 0.2,
    }
}

#[test]
fn minus_infinity_prior_rejects_and_restores_model() {
    let tree = Tree::from_newick(NEWICK, false, false).unwrap();
    let mut state = ChainState::new(tree, model(), Lot::from_seed(3), Box::new(FlatLikelihood));
    let before = state.model.clone();
    let mut updater = Updater::new(Box::new(NegativePinvar::default()));

    let prev = -1234.5678;
    let returned = updater.update(&mut state, prev).unwrap();

    assert_eq!(returned.to_bits(), prev.to_bits());
    assert_eq!(state.model.pinvar.to_bits(), before.pinvar.to_bits());
    assert_eq!(state.model, before);
    assert_eq!(updater.naccepts(), 0);
    assert_eq!(updater.nattempts(), 1);
    assert_eq!(updater.log_hastings_ratio(), 0.0);
}

#[test]
fn rejected_tree_length_move_restores_every_edge() {
    let tree = Tree::from_newick(NEWICK, false, false).unwrap();
    let calls = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&calls);
    // the starting state is evaluated by the caller, so every oracle call
    // here is for a proposal and the proposal always loses
    let oracle = FnLikelihood(move |_: &Tree, _: &Model| -> Result<f64, ArborError> {
        counter.set(counter.get() + 1);
        Ok(f64::NEG_INFINITY)
    });
    let mut state = ChainState::new(tree, model(), Lot::from_seed(11), Box::new(oracle));
    let before: Vec<u64> = state.tree.edge_lengths().iter().map(|len| len.to_bits()).collect();
    let total_before = state.tree.total_edge_length();

    let mut updater = Updater::new(Box::new(TreeLengthProposal::new()));
    updater.set_lambda(2.0);
    for _ in 0..25 {
        let returned = updater.update(&mut state, -10.0).unwrap();
        assert_eq!(returned, -10.0);
    }

    let after: Vec<u64> = state.tree.edge_lengths().iter().map(|len| len.to_bits()).collect();
    assert_eq!(before, after);
    assert_eq!(state.tree.total_edge_length(), total_before);
    assert_eq!(calls.get(), 25);
}

#[test]
fn oracle_failure_restores_state_and_propagates() {
    let tree = Tree::from_newick(NEWICK, false, false).unwrap();
    let oracle = FnLikelihood(|_: &Tree, _: &Model| -> Result<f64, ArborError> {
        Err(ArborError::Invariant(ErrorInfo::new("oracle-failed", "likelihood unavailable")))
    });
    let mut state = ChainState::new(tree, model(), Lot::from_seed(5), Box::new(oracle));
    let before = state.model.clone();

    let mut updater = Updater::new(Box::new(StateFreqProposal::new()));
    updater.set_lambda(0.01);
    let err = updater.update(&mut state, 0.0).unwrap_err();

    assert_eq!(err.info().code, "oracle-failed");
    assert_eq!(state.model, before);
    assert_eq!(updater.nattempts(), 0);
}

#[test]
fn statefreq_proposals_stay_on_the_simplex() {
    let tree = Tree::from_newick(NEWICK, false, false).unwrap();
    let mut state = ChainState::new(tree, model(), Lot::from_seed(99), Box::new(FlatLikelihood));
    let mut updater = Updater::new(Box::new(StateFreqProposal::new()));
    updater.set_lambda(0.05);
    for _ in 0..500 {
        updater.update(&mut state, 0.0).unwrap();
        let sum: f64 = state.model.state_freqs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-8);
        assert!(state.model.state_freqs.iter().all(|&freq| freq > 0.0));
    }
    assert!(updater.naccepts() > 0);
}

#[test]
fn statefreq_at_lambda_cap_keeps_running() {
    let tree = Tree::from_newick(NEWICK, false, false).unwrap();
    let mut state = ChainState::new(tree, model(), Lot::from_seed(17), Box::new(FlatLikelihood));
    let mut updater = Updater::new(Box::new(StateFreqProposal::new()));
    updater.set_tuning(false);
    updater.set_lambda(1000.0);
    for _ in 0..200 {
        let returned = updater.update(&mut state, 0.0).unwrap();
        assert_eq!(returned, 0.0);
        let sum: f64 = state.model.state_freqs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-8);
        assert!(state.model.state_freqs.iter().all(|&freq| freq.is_finite() && freq > 0.0));
        assert_eq!(updater.log_hastings_ratio(), 0.0);
    }
    assert_eq!(updater.nattempts(), 200);
    assert_eq!(updater.lambda(), 1000.0);
}

/// Always loses and fails to write the old point back.
#[derive(Default)]
struct BrokenRestore {
    pushes: Cell<usize>,
}

impl Proposal for BrokenRestore {
    fn name(&self) -> &str {
        "broken restore"
    }

    fn default_prior_parameters(&self) -> Vec<f64> {
        Vec::new()
    }

    fn pull_current_state(&mut self, _state: &ChainState) {}

    fn push_current_state(&self, _state: &mut ChainState) -> Result<(), ArborError> {
        self.pushes.set(self.pushes.get() + 1);
        if self.pushes.get() > 1 {
            return Err(ArborError::Invariant(ErrorInfo::new("restore-failed", "cannot restore")));
        }
        Ok(())
    }

    fn propose_new_state(&mut self, _lot: &mut Lot, _lambda: f64) -> Result<f64, ArborError> {
        Ok(f64::NEG_INFINITY)
    }

    fn revert(&mut self) {}

    fn calc_log_prior(&self, _state: &ChainState, _params: &[f64]) -> Result<f64, ArborError> {
        Ok(0.0)
    }
}

#[test]
fn failed_restore_after_rejection_clears_the_ratio() {
    let tree = Tree::from_newick(NEWICK, false, false).unwrap();
    let mut state = ChainState::new(tree, model(), Lot::from_seed(23), Box::new(FlatLikelihood));
    let mut updater = Updater::new(Box::new(BrokenRestore::default()));

    let err = updater.update(&mut state, 0.0).unwrap_err();
    assert_eq!(err.info().code, "restore-failed");
    assert_eq!(updater.log_hastings_ratio(), 0.0);
    assert_eq!(updater.nattempts(), 0);
}
