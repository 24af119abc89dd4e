use arbor_core::{ArborError, Lot};
use arbor_mcmc::{ChainState, Proposal, StateFreqProposal, Updater};
use proptest::prelude::*;

fn updater() -> Updater {
    Updater::new(Box::new(StateFreqProposal::new()))
}

#[test]
fn clear_restores_defaults() {
    let mut updater = updater();
    updater.set_lambda(3.0);
    updater.set_target_acceptance(0.5);
    updater.set_heating_power(0.25);
    updater.set_tuning(false);
    updater.set_prior_parameters(vec![2.0; 4]);
    updater.tune(true);
    updater.clear();

    assert_eq!(updater.lambda(), 0.0001);
    assert_eq!(updater.target_acceptance(), 0.3);
    assert_eq!(updater.heating_power(), 1.0);
    assert!(updater.is_tuning());
    assert_eq!(updater.nattempts(), 0);
    assert_eq!(updater.naccepts(), 0);
    assert_eq!(updater.prior_parameters(), &[1.0, 1.0, 1.0, 1.0]);
    assert_eq!(updater.name(), "State Frequencies");
}

#[test]
fn first_accept_uses_gamma_of_one_attempt() {
    let mut updater = updater();
    updater.set_lambda(1.0);
    updater.tune(true);
    let gamma = 10.0 / 101.0;
    let expected = 1.0 + gamma * 0.7 / 0.6;
    assert!((updater.lambda() - expected).abs() < 1e-12);
}

#[test]
fn tuning_off_only_counts() {
    let mut updater = updater();
    updater.set_lambda(2.0);
    updater.set_tuning(false);
    updater.tune(true);
    updater.tune(false);
    assert_eq!(updater.lambda(), 2.0);
    assert_eq!(updater.nattempts(), 2);
}

#[test]
fn set_tuning_resets_counters() {
    let mut updater = updater();
    updater.tune(true);
    updater.tune(false);
    updater.set_tuning(true);
    assert_eq!(updater.nattempts(), 0);
}

#[test]
fn statefreq_push_rejects_bad_sum() {
    let tree = arbor_tree::Tree::from_newick("(1,2,3);", false, false).unwrap();
    let model = arbor_mcmc::Model {
        state_freqs: vec![0.4, 0.4, 0.4, 0.4],
        pinvar: 0.0,
    };
    let mut state = ChainState::new(tree, model, Lot::from_seed(1), Box::new(arbor_mcmc::FlatLikelihood));
    let mut proposal = StateFreqProposal::new();
    proposal.pull_current_state(&state);
    let err = proposal.push_current_state(&mut state).unwrap_err();
    assert!(matches!(err, ArborError::Invariant(ref info) if info.code == "state-freq-sum"));
}

proptest! {
    #[test]
    fn lambda_stays_bounded_and_moves_monotonically(
        start in 1.0e-4f64..2000.0,
        target in 0.05f64..0.95,
        outcomes in proptest::collection::vec(any::<bool>(), 1..300),
    ) {
        let mut updater = updater();
        updater.set_lambda(start.min(1000.0));
        updater.set_target_acceptance(target);
        for accepted in outcomes {
            let before = updater.lambda();
            updater.tune(accepted);
            let after = updater.lambda();
            prop_assert!(after <= 1000.0);
            if accepted {
                prop_assert!(after > before || after == 1000.0);
            } else {
                prop_assert!(after < before);
            }
        }
    }
}
