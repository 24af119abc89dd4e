use arbor_core::errors::{ArborError, ErrorInfo};
use arbor_core::Lot;
use arbor_tree::{Tree, TreeSummary};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::SamplerConfig;
use crate::determinism::chain_seed;
use crate::likelihood::{ChainState, LikelihoodOracle, Model};
use crate::metrics::{ChainSample, TraceRecorder};
use crate::tempering::build_ladder;
use crate::updater::{Updater, UpdaterStats};

/// Precision used when storing sampled trees as Newick.
const SAMPLE_PRECISION: usize = 5;

/// When a chain samples and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSchedule {
    /// Iterations to run.
    pub iterations: usize,
    /// Sample every `sample_freq` iterations after burn-in.
    pub sample_freq: usize,
    /// Log progress every `print_freq` iterations (0 disables).
    pub print_freq: usize,
    /// Iterations run before sampling starts.
    pub burn_in: usize,
}

impl RunSchedule {
    /// Extracts the schedule from a sampler configuration.
    pub fn from_config(config: &SamplerConfig) -> Self {
        Self {
            iterations: config.iterations,
            sample_freq: config.sample_freq.max(1),
            print_freq: config.print_freq,
            burn_in: config.burn_in,
        }
    }

    fn samples_at(&self, iteration: usize) -> bool {
        iteration > self.burn_in && (iteration - self.burn_in) % self.sample_freq == 0
    }
}

/// Outcome of [`Chain::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSummary {
    /// Heating power the chain ran at.
    pub heating_power: f64,
    /// Samples in iteration order.
    pub samples: Vec<ChainSample>,
    /// Updater statistics at the end of the run.
    pub updater_stats: Vec<UpdaterStats>,
    /// Log-likelihood of the final state.
    pub final_log_likelihood: f64,
}

/// One Markov chain: its state, its updaters and its heating power.
///
/// Updaters run strictly in order within an iteration, each one seeing the
/// state left by the previous one.
#[derive(Debug)]
pub struct Chain {
    state: ChainState,
    updaters: Vec<Updater>,
    weights: Vec<usize>,
    heating_power: f64,
    log_likelihood: f64,
    started: bool,
}

impl Chain {
    /// Creates a chain running every updater once per iteration at
    /// `heating_power`.
    pub fn new(state: ChainState, updaters: Vec<Updater>, heating_power: f64) -> Self {
        let weights = vec![1; updaters.len()];
        let mut chain = Self {
            state,
            updaters,
            weights,
            heating_power,
            log_likelihood: 0.0,
            started: false,
        };
        chain.set_heating_power(heating_power);
        chain
    }

    /// Builds chain `chain_index` of the ladder described by `config`.
    ///
    /// The chain's random source is seeded from the master seed and the
    /// chain index. Heated chains (index above 0) run every updater at their
    /// ladder power; the cold chain keeps the configured powers.
    pub fn from_config(
        config: &SamplerConfig,
        tree: Tree,
        model: Model,
        oracle: Box<dyn LikelihoodOracle>,
        chain_index: usize,
    ) -> Result<Self, ArborError> {
        config.validate()?;
        model.validate()?;
        let lot = Lot::from_seed(chain_seed(config.seed_policy.master_seed, chain_index));
        let state = ChainState::new(tree, model, lot, oracle);
        let mut updaters = Vec::with_capacity(config.updaters.len());
        let mut weights = Vec::with_capacity(config.updaters.len());
        for spec in &config.updaters {
            updaters.push(Updater::from_config(spec.kind.build(), &spec.config));
            weights.push(spec.config.weight);
        }
        let ladder = build_ladder(&config.ladder);
        let mut chain = Self {
            state,
            updaters,
            weights,
            heating_power: 1.0,
            log_likelihood: 0.0,
            started: false,
        };
        if chain_index > 0 {
            chain.set_heating_power(ladder.get(chain_index).copied().unwrap_or(1.0));
        }
        Ok(chain)
    }

    /// Computes the starting log-likelihood.
    ///
    /// Fails when the starting state lies outside the support of any
    /// updater's prior.
    pub fn start(&mut self) -> Result<f64, ArborError> {
        for updater in &self.updaters {
            let log_prior = updater.calc_log_prior(&self.state)?;
            if log_prior.is_nan() || log_prior == f64::NEG_INFINITY {
                return Err(ArborError::Config(
                    ErrorInfo::new("start-outside-prior", "starting state has zero prior density")
                        .with_context("updater", updater.name())
                        .with_hint("start every sampled parameter inside its prior's support"),
                ));
            }
        }
        self.log_likelihood = self.state.calc_log_likelihood()?;
        self.started = true;
        debug!(
            seed = self.state.lot.seed(),
            heating_power = self.heating_power,
            log_likelihood = self.log_likelihood,
            "chain started"
        );
        Ok(self.log_likelihood)
    }

    /// Runs every updater (as many times as its weight) once.
    pub fn next_step(&mut self, iteration: usize) -> Result<(), ArborError> {
        if !self.started {
            self.start()?;
        }
        for (updater, &weight) in self.updaters.iter_mut().zip(&self.weights) {
            for _ in 0..weight {
                self.log_likelihood = updater.update(&mut self.state, self.log_likelihood)?;
            }
        }
        trace!(iteration, log_likelihood = self.log_likelihood, "iteration complete");
        Ok(())
    }

    /// Sum of the updaters' log priors for the current state.
    pub fn log_prior(&self) -> Result<f64, ArborError> {
        self.updaters
            .iter()
            .map(|updater| updater.calc_log_prior(&self.state))
            .sum()
    }

    /// Snapshot of the current state.
    pub fn sample(&self, iteration: usize) -> Result<ChainSample, ArborError> {
        Ok(ChainSample {
            iteration,
            log_likelihood: self.log_likelihood,
            log_prior: self.log_prior()?,
            tree_length: self.state.tree.total_edge_length(),
        })
    }

    /// Runs the chain for `schedule.iterations`, storing every sampled tree
    /// in `summary`.
    pub fn run(&mut self, schedule: &RunSchedule, summary: &mut TreeSummary) -> Result<ChainSummary, ArborError> {
        if !self.started {
            self.start()?;
        }
        let mut trace = TraceRecorder::new();
        for iteration in 1..=schedule.iterations {
            self.next_step(iteration)?;
            if schedule.samples_at(iteration) {
                let sample = self.sample(iteration)?;
                let tree = &self.state.tree;
                summary.add_tree(&tree.to_newick(SAMPLE_PRECISION), Some(tree.compute_splits()))?;
                trace.push(sample);
            }
            if schedule.print_freq > 0 && iteration % schedule.print_freq == 0 {
                info!(
                    iteration,
                    heating_power = self.heating_power,
                    log_likelihood = self.log_likelihood,
                    tree_length = self.state.tree.total_edge_length(),
                    "progress"
                );
            }
        }
        Ok(ChainSummary {
            heating_power: self.heating_power,
            samples: trace.samples().to_vec(),
            updater_stats: self.updater_stats(),
            final_log_likelihood: self.log_likelihood,
        })
    }

    /// Sets the heating power of the chain and all of its updaters.
    pub fn set_heating_power(&mut self, power: f64) {
        self.heating_power = power;
        for updater in &mut self.updaters {
            updater.set_heating_power(power);
        }
    }

    /// Heating power of the chain.
    pub fn heating_power(&self) -> f64 {
        self.heating_power
    }

    /// Log-likelihood of the current state.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Current state.
    pub fn state(&self) -> &ChainState {
        &self.state
    }

    /// Mutable access to the current state.
    pub fn state_mut(&mut self) -> &mut ChainState {
        &mut self.state
    }

    /// Updaters in execution order.
    pub fn updaters(&self) -> &[Updater] {
        &self.updaters
    }

    /// Statistics of every updater.
    pub fn updater_stats(&self) -> Vec<UpdaterStats> {
        self.updaters.iter().map(Updater::stats).collect()
    }
}
