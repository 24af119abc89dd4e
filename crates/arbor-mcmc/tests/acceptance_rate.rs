use arbor_core::{ArborError, Lot};
use arbor_mcmc::{ChainState, FlatLikelihood, Model, Proposal, Updater};
use arbor_tree::Tree;

/// Proposes a point whose log prior is `delta` above the current one.
struct FixedDelta {
    delta: f64,
    curr: f64,
    prev: f64,
}

impl Proposal for FixedDelta {
    fn name(&self) -> &str {
        "fixed delta"
    }

    fn default_prior_parameters(&self) -> Vec<f64> {
        Vec::new()
    }

    fn pull_current_state(&mut self, _state: &ChainState) {
        self.curr = 0.0;
    }

    fn push_current_state(&self, _state: &mut ChainState) -> Result<(), ArborError> {
        Ok(())
    }

    fn propose_new_state(&mut self, _lot: &mut Lot, _lambda: f64) -> Result<f64, ArborError> {
        self.prev = self.curr;
        self.curr = 1.0;
        Ok(0.0)
    }

    fn revert(&mut self) {
        self.curr = self.prev;
    }

    fn calc_log_prior(&self, _state: &ChainState, _params: &[f64]) -> Result<f64, ArborError> {
        Ok(self.curr * self.delta)
    }
}

fn state(seed: u64) -> ChainState {
    let tree = Tree::from_newick("((1:0.1,2:0.1):0.1,3:0.1,(4:0.1,5:0.1):0.1);", false, false).unwrap();
    ChainState::new(tree, Model::default(), Lot::from_seed(seed), Box::new(FlatLikelihood))
}

fn acceptance_rate(delta: f64, heating_power: f64, steps: usize) -> f64 {
    let mut state = state(2024);
    let mut updater = Updater::new(Box::new(FixedDelta {
        delta,
        curr: 0.0,
        prev: 0.0,
    }));
    updater.set_tuning(false);
    updater.set_heating_power(heating_power);
    let mut log_likelihood = 0.0;
    for _ in 0..steps {
        log_likelihood = updater.update(&mut state, log_likelihood).unwrap();
    }
    assert_eq!(updater.nattempts(), steps as u64);
    updater.naccepts() as f64 / steps as f64
}

#[test]
fn downhill_moves_accepted_at_exp_delta() {
    let rate = acceptance_rate(-1.0, 1.0, 20_000);
    assert!((rate - (-1.0_f64).exp()).abs() < 0.02, "rate {rate}");
}

#[test]
fn heating_flattens_the_target() {
    let rate = acceptance_rate(-1.0, 0.5, 20_000);
    assert!((rate - (-0.5_f64).exp()).abs() < 0.02, "rate {rate}");
}

#[test]
fn uphill_moves_always_accepted() {
    let rate = acceptance_rate(0.5, 1.0, 2_000);
    assert_eq!(rate, 1.0);
}

#[test]
fn accept_pct_matches_counters() {
    let mut state = state(7);
    let mut updater = Updater::new(Box::new(FixedDelta {
        delta: -1.0,
        curr: 0.0,
        prev: 0.0,
    }));
    assert_eq!(updater.accept_pct(), 0.0);
    for _ in 0..100 {
        updater.update(&mut state, 0.0).unwrap();
    }
    let expected = 100.0 * updater.naccepts() as f64 / 100.0;
    assert!((updater.accept_pct() - expected).abs() < 1e-12);
    assert_eq!(updater.log_hastings_ratio(), 0.0);
}
