use arbor_core::errors::ArborError;
use arbor_tree::{NewickOptions, Tree, TreeSummary};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chain::{Chain, ChainSummary, RunSchedule};
use crate::config::{LadderConfig, SamplerConfig};
use crate::likelihood::{LikelihoodOracle, Model};

/// Heating powers of the ladder, cold chain first: chain `i` gets
/// `1 / (1 + i * heating_lambda)`.
pub fn build_ladder(config: &LadderConfig) -> Vec<f64> {
    (0..config.chains.max(1))
        .map(|index| 1.0 / (1.0 + index as f64 * config.heating_lambda))
        .collect()
}

/// Results of every chain of a ladder run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderRun {
    /// Heating powers, cold chain first.
    pub heating_powers: Vec<f64>,
    /// Per-chain summaries in ladder order.
    pub chains: Vec<ChainSummary>,
}

impl LadderRun {
    /// Summary of the cold chain.
    pub fn cold(&self) -> Option<&ChainSummary> {
        self.chains.first()
    }
}

/// Runs every chain of the ladder one after the other from the same
/// starting tree and model.
///
/// Chains do not exchange states. Only the cold chain stores its trees in
/// `summary`; heated chains sample into a scratch summary that is dropped.
pub fn run_ladder<F>(
    config: &SamplerConfig,
    tree: &Tree,
    model: &Model,
    mut oracle_factory: F,
    summary: &mut TreeSummary,
) -> Result<LadderRun, ArborError>
where
    F: FnMut(usize) -> Box<dyn LikelihoodOracle>,
{
    config.validate()?;
    let heating_powers = build_ladder(&config.ladder);
    let schedule = RunSchedule::from_config(config);
    let mut chains = Vec::with_capacity(heating_powers.len());
    for (index, &power) in heating_powers.iter().enumerate() {
        info!(chain = index, heating_power = power, "starting chain");
        let mut chain = Chain::from_config(config, tree.clone(), model.clone(), oracle_factory(index), index)?;
        let result = if index == 0 {
            chain.run(&schedule, summary)?
        } else {
            let mut scratch = TreeSummary::with_options(NewickOptions {
                allow_polytomies: config.allow_polytomies,
                rooted: config.rooted,
            });
            chain.run(&schedule, &mut scratch)?
        };
        info!(
            chain = index,
            final_log_likelihood = result.final_log_likelihood,
            samples = result.samples.len(),
            "chain finished"
        );
        chains.push(result);
    }
    Ok(LadderRun {
        heating_powers,
        chains,
    })
}
