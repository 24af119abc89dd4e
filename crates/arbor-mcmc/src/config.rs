use std::fs;
use std::path::Path;

use arbor_core::errors::{ArborError, ErrorInfo};
use serde::{Deserialize, Serialize};

use crate::likelihood::Model;
use crate::proposals::ProposalKind;

/// YAML-configurable parameters governing a sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Number of iterations per chain.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Interval at which the cold chain's tree is stored in the summary.
    #[serde(default = "default_sample_freq")]
    pub sample_freq: usize,
    /// Interval at which progress is logged (0 disables progress lines).
    #[serde(default = "default_print_freq")]
    pub print_freq: usize,
    /// Iterations discarded before sampling starts.
    #[serde(default)]
    pub burn_in: usize,
    /// Master seed and label.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    /// Heated chain ladder.
    #[serde(default)]
    pub ladder: LadderConfig,
    /// Accept polytomies in the starting tree.
    #[serde(default)]
    pub allow_polytomies: bool,
    /// Treat the starting tree as rooted.
    #[serde(default)]
    pub rooted: bool,
    /// Updaters applied in order every iteration.
    #[serde(default = "default_updaters")]
    pub updaters: Vec<UpdaterSpec>,
    /// Starting model parameters.
    #[serde(default)]
    pub model: Model,
}

fn default_iterations() -> usize {
    1000
}

fn default_sample_freq() -> usize {
    10
}

fn default_print_freq() -> usize {
    100
}

fn default_updaters() -> Vec<UpdaterSpec> {
    vec![
        UpdaterSpec {
            kind: ProposalKind::StateFreqs,
            config: UpdaterConfig {
                lambda_init: 0.001,
                ..UpdaterConfig::default()
            },
        },
        UpdaterSpec {
            kind: ProposalKind::TreeLength,
            config: UpdaterConfig {
                lambda_init: 0.2,
                ..UpdaterConfig::default()
            },
        },
    ]
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            sample_freq: default_sample_freq(),
            print_freq: default_print_freq(),
            burn_in: 0,
            seed_policy: SeedPolicy::default(),
            ladder: LadderConfig::default(),
            allow_polytomies: false,
            rooted: false,
            updaters: default_updaters(),
            model: Model::default(),
        }
    }
}

fn config_error(code: &str, message: impl Into<String>, field: &str, value: impl ToString) -> ArborError {
    ArborError::Config(ErrorInfo::new(code, message).with_context(field, value.to_string()))
}

impl SamplerConfig {
    /// Parses a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ArborError> {
        serde_yaml::from_str(text)
            .map_err(|err| ArborError::Serde(ErrorInfo::new("config-parse", err.to_string())))
    }

    /// Loads and validates a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self, ArborError> {
        let text = fs::read_to_string(path).map_err(|err| ArborError::io("config-read", path, err))?;
        let config = Self::from_yaml_str(&text).map_err(|err| match err {
            ArborError::Serde(info) => {
                ArborError::Serde(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the sampler cannot run with.
    pub fn validate(&self) -> Result<(), ArborError> {
        if self.sample_freq == 0 {
            return Err(config_error("sample-freq", "sample_freq must be positive", "sample_freq", 0));
        }
        if self.ladder.chains == 0 {
            return Err(config_error("ladder-chains", "the ladder needs at least one chain", "chains", 0));
        }
        if !(self.ladder.heating_lambda >= 0.0 && self.ladder.heating_lambda.is_finite()) {
            return Err(config_error(
                "heating-lambda",
                "heating_lambda must be finite and non-negative",
                "heating_lambda",
                self.ladder.heating_lambda,
            ));
        }
        self.model.validate().map_err(|err| match err {
            ArborError::Invariant(info) => ArborError::Config(info),
            other => other,
        })?;
        for (slot, spec) in self.updaters.iter().enumerate() {
            spec.config
                .validate()
                .map_err(|err| match err {
                    ArborError::Config(info) => ArborError::Config(info.with_context("updater", slot.to_string())),
                    other => other,
                })?;
        }
        Ok(())
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed; chain seeds are derived from it.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded in manifests.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0x05EE_D5EE_DD15_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

/// Heated chain ladder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Number of chains; chain 0 is the cold chain.
    #[serde(default = "default_chains")]
    pub chains: usize,
    /// Chain `i` runs at power `1 / (1 + i * heating_lambda)`.
    #[serde(default = "default_heating_lambda")]
    pub heating_lambda: f64,
}

fn default_chains() -> usize {
    1
}

fn default_heating_lambda() -> f64 {
    0.5
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            chains: default_chains(),
            heating_lambda: default_heating_lambda(),
        }
    }
}

/// One configured updater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdaterSpec {
    /// Proposal kind.
    pub kind: ProposalKind,
    /// Engine settings.
    #[serde(flatten)]
    pub config: UpdaterConfig,
}

/// Engine settings of one updater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Starting boldness.
    #[serde(default = "default_lambda_init")]
    pub lambda_init: f64,
    /// Acceptance rate tuning aims for.
    #[serde(default = "default_target_acceptance")]
    pub target_acceptance: f64,
    /// Adapt the boldness during the run.
    #[serde(default = "default_tuning_enabled")]
    pub tuning_enabled: bool,
    /// Heating power of the cold chain; heated chains use their ladder power.
    #[serde(default = "default_heating_power")]
    pub heating_power: f64,
    /// Prior parameters; `None` keeps the kind's defaults.
    #[serde(default)]
    pub prior_params: Option<Vec<f64>>,
    /// Number of times the updater runs per iteration.
    #[serde(default = "default_weight")]
    pub weight: usize,
}

fn default_lambda_init() -> f64 {
    0.0001
}

fn default_target_acceptance() -> f64 {
    0.3
}

fn default_tuning_enabled() -> bool {
    true
}

fn default_heating_power() -> f64 {
    1.0
}

fn default_weight() -> usize {
    1
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            lambda_init: default_lambda_init(),
            target_acceptance: default_target_acceptance(),
            tuning_enabled: default_tuning_enabled(),
            heating_power: default_heating_power(),
            prior_params: None,
            weight: default_weight(),
        }
    }
}

impl UpdaterConfig {
    /// Checks the ranges of every setting.
    pub fn validate(&self) -> Result<(), ArborError> {
        if !(self.target_acceptance > 0.0 && self.target_acceptance < 1.0) {
            return Err(config_error(
                "target-acceptance",
                "target_acceptance must lie in (0, 1)",
                "target_acceptance",
                self.target_acceptance,
            ));
        }
        if !(self.heating_power > 0.0 && self.heating_power <= 1.0) {
            return Err(config_error(
                "heating-power",
                "heating_power must lie in (0, 1]",
                "heating_power",
                self.heating_power,
            ));
        }
        if !(self.lambda_init > 0.0 && self.lambda_init.is_finite()) {
            return Err(config_error(
                "lambda-init",
                "lambda_init must be positive",
                "lambda_init",
                self.lambda_init,
            ));
        }
        Ok(())
    }
}
