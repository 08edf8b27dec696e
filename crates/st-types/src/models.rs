//! Declarative configuration for the surrogate models an experiment fits.
//!
//! Model fitting lives outside this workspace; these types only describe
//! the hyperparameter priors, kernels and optimizer settings an experiment
//! asks for, so they can be stored next to the pool configuration.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Expected standard deviation of observation noise under the standard priors.
pub const EXPECTED_OBSERVATION_NOISE: f64 = 0.1;

/// Gamma `(concentration, rate)` prior on the kernel variance.
pub const KERNEL_VARIANCE_GAMMA: (f64, f64) = (2.0, 3.0);

/// Gamma `(concentration, rate)` prior on each kernel lengthscale.
pub const KERNEL_LENGTHSCALE_GAMMA: (f64, f64) = (2.0, 2.0);

/// Hyperparameter priors shared by kernels and likelihoods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorParameters {
    pub expected_observation_noise: f64,
    pub kernel_variance_gamma: (f64, f64),
    pub kernel_lengthscale_gamma: (f64, f64),
}

impl PriorParameters {
    pub fn standard() -> Self {
        Self {
            expected_observation_noise: EXPECTED_OBSERVATION_NOISE,
            kernel_variance_gamma: KERNEL_VARIANCE_GAMMA,
            kernel_lengthscale_gamma: KERNEL_LENGTHSCALE_GAMMA,
        }
    }

    /// Rate of the exponential prior on the noise variance, `1 / noise²`.
    pub fn noise_variance_exponential_lambda(&self) -> f64 {
        1.0 / self.expected_observation_noise.powi(2)
    }
}

impl Default for PriorParameters {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelKind {
    Rbf,
    Matern52,
}

/// Stationary kernel over the input space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    pub kind: KernelKind,
    pub input_dimension: usize,
    #[serde(default = "default_hyperparameter")]
    pub base_lengthscale: f64,
    #[serde(default = "default_hyperparameter")]
    pub base_variance: f64,
    /// Put gamma priors on variance and lengthscales.
    #[serde(default)]
    pub add_prior: bool,
    #[serde(default)]
    pub priors: PriorParameters,
}

fn default_hyperparameter() -> f64 {
    1.0
}

impl KernelConfig {
    pub fn new(kind: KernelKind, input_dimension: usize) -> Self {
        Self {
            kind,
            input_dimension,
            base_lengthscale: default_hyperparameter(),
            base_variance: default_hyperparameter(),
            add_prior: false,
            priors: PriorParameters::standard(),
        }
    }

    pub fn with_prior(mut self, priors: PriorParameters) -> Self {
        self.add_prior = true;
        self.priors = priors;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_dimension == 0 {
            return Err(ConfigError::InvalidValue {
                field: "input_dimension".to_string(),
                message: "kernel needs at least one input".to_string(),
            });
        }
        for (field, value) in [
            ("base_lengthscale", self.base_lengthscale),
            ("base_variance", self.base_variance),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("must be positive, got {}", value),
                });
            }
        }
        Ok(())
    }
}

/// How hyperparameters are initialized before optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitialParameters {
    /// Perturb the current values.
    Perturb,
    /// Draw uniformly within the initial bounds.
    UniformDistribution,
}

/// Whether predictions include observation noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionQuantity {
    PredictY,
    PredictF,
}

/// Named presets of [`GpModelConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpModelVariant {
    Basic,
    WithNoisePrior,
    ExtensiveOptimization,
    UniformInitialization,
    Fast,
    FixedNoise,
    SmallPerturbation,
}

impl GpModelVariant {
    pub fn name(&self) -> &'static str {
        match self {
            GpModelVariant::Basic => "GPModel",
            GpModelVariant::WithNoisePrior => "GPModelWithNoisePrior",
            GpModelVariant::ExtensiveOptimization => "GPModelExtenseOptimization",
            GpModelVariant::UniformInitialization => "GPModelUniformInitialization",
            GpModelVariant::Fast => "GPModelFast",
            GpModelVariant::FixedNoise => "GPModelFixedNoise",
            GpModelVariant::SmallPerturbation => "GPModelSmallPertubation",
        }
    }
}

/// Single-task Gaussian process settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpModelConfig {
    pub name: String,
    pub kernel: KernelConfig,
    pub observation_noise: f64,
    pub optimize_hps: bool,
    pub train_likelihood_variance: bool,
    pub sample_initial_parameters_at_start: bool,
    pub initial_parameter_strategy: InitialParameters,
    pub perturbation_for_multistart_opt: f64,
    pub perturbation_for_singlestart_opt: f64,
    pub perform_multi_start_optimization: bool,
    pub initial_uniform_lower_bound: f64,
    pub initial_uniform_upper_bound: f64,
    pub n_starts_for_multistart_opt: usize,
    pub set_prior_on_observation_noise: bool,
    pub expected_observation_noise: f64,
    pub prediction_quantity: PredictionQuantity,
}

impl GpModelConfig {
    pub fn new(kernel: KernelConfig) -> Self {
        Self {
            name: GpModelVariant::Basic.name().to_string(),
            kernel,
            observation_noise: 0.01,
            optimize_hps: true,
            train_likelihood_variance: true,
            sample_initial_parameters_at_start: true,
            initial_parameter_strategy: InitialParameters::Perturb,
            perturbation_for_multistart_opt: 0.5,
            perturbation_for_singlestart_opt: 0.1,
            perform_multi_start_optimization: true,
            initial_uniform_lower_bound: -0.5,
            initial_uniform_upper_bound: 0.5,
            n_starts_for_multistart_opt: 10,
            set_prior_on_observation_noise: false,
            expected_observation_noise: EXPECTED_OBSERVATION_NOISE,
            prediction_quantity: PredictionQuantity::PredictY,
        }
    }

    /// The basic settings with the overrides of `variant` applied.
    pub fn variant(kernel: KernelConfig, variant: GpModelVariant) -> Self {
        let mut config = Self::new(kernel);
        config.name = variant.name().to_string();
        match variant {
            GpModelVariant::Basic => {}
            GpModelVariant::WithNoisePrior => config.set_prior_on_observation_noise = true,
            GpModelVariant::ExtensiveOptimization => config.n_starts_for_multistart_opt = 20,
            GpModelVariant::UniformInitialization => {
                config.initial_parameter_strategy = InitialParameters::UniformDistribution
            }
            GpModelVariant::Fast => config.perform_multi_start_optimization = false,
            GpModelVariant::FixedNoise => config.train_likelihood_variance = false,
            GpModelVariant::SmallPerturbation => config.perturbation_for_multistart_opt = 0.1,
        }
        config
    }

    pub fn with_observation_noise(mut self, observation_noise: f64) -> Self {
        self.observation_noise = observation_noise;
        self
    }

    pub fn with_starts(mut self, n_starts: usize) -> Self {
        self.n_starts_for_multistart_opt = n_starts;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.kernel.validate()?;
        if self.observation_noise <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "observation_noise".to_string(),
                message: format!("must be positive, got {}", self.observation_noise),
            });
        }
        if self.perform_multi_start_optimization && self.n_starts_for_multistart_opt == 0 {
            return Err(ConfigError::InvalidValue {
                field: "n_starts_for_multistart_opt".to_string(),
                message: "multi-start optimization needs at least one start".to_string(),
            });
        }
        if self.initial_uniform_lower_bound >= self.initial_uniform_upper_bound {
            return Err(ConfigError::InvalidValue {
                field: "initial_uniform_upper_bound".to_string(),
                message: format!(
                    "{} is not above the lower bound {}",
                    self.initial_uniform_upper_bound, self.initial_uniform_lower_bound
                ),
            });
        }
        Ok(())
    }
}

/// Which data the source-task hyperparameters are trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceTraining {
    /// Fit on source data alone, then freeze.
    WithoutTarget,
    /// Refit jointly with the target data.
    WithTarget,
}

/// Multi-output transfer Gaussian process settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferGpModelConfig {
    pub name: String,
    pub kernel: KernelConfig,
    pub observation_noise: f64,
    pub expected_observation_noise: f64,
    pub optimize_hps: bool,
    pub train_likelihood_variance: bool,
    pub source_training_mode: SourceTraining,
    pub perturb_parameters_at_start: bool,
    pub perturbation_at_start: f64,
    pub perturbation_for_multistart_opt: f64,
    pub perform_multi_start_optimization: bool,
    pub n_starts_for_multistart_opt: usize,
    pub set_prior_on_observation_noise: bool,
    pub prediction_quantity: PredictionQuantity,
}

impl TransferGpModelConfig {
    pub fn new(kernel: KernelConfig) -> Self {
        Self {
            name: "BasicTransferGP".to_string(),
            kernel,
            observation_noise: 0.1,
            expected_observation_noise: 0.3,
            optimize_hps: true,
            train_likelihood_variance: true,
            source_training_mode: SourceTraining::WithoutTarget,
            perturb_parameters_at_start: false,
            perturbation_at_start: 0.5,
            perturbation_for_multistart_opt: 0.5,
            perform_multi_start_optimization: true,
            n_starts_for_multistart_opt: 5,
            set_prior_on_observation_noise: false,
            prediction_quantity: PredictionQuantity::PredictY,
        }
    }

    pub fn with_source_training(mut self, mode: SourceTraining) -> Self {
        self.source_training_mode = mode;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.kernel.validate()?;
        if self.observation_noise <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "observation_noise".to_string(),
                message: format!("must be positive, got {}", self.observation_noise),
            });
        }
        if self.perform_multi_start_optimization && self.n_starts_for_multistart_opt == 0 {
            return Err(ConfigError::InvalidValue {
                field: "n_starts_for_multistart_opt".to_string(),
                message: "multi-start optimization needs at least one start".to_string(),
            });
        }
        Ok(())
    }
}

/// Surrogate model of an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelConfig {
    Gp(GpModelConfig),
    TransferGp(TransferGpModelConfig),
}

impl ModelConfig {
    pub fn name(&self) -> &str {
        match self {
            ModelConfig::Gp(config) => &config.name,
            ModelConfig::TransferGp(config) => &config.name,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ModelConfig::Gp(config) => config.validate(),
            ModelConfig::TransferGp(config) => config.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rbf() -> KernelConfig {
        KernelConfig::new(KernelKind::Rbf, 2)
    }

    #[test]
    fn standard_priors() {
        let priors = PriorParameters::default();
        assert_eq!(priors.kernel_variance_gamma, (2.0, 3.0));
        assert_eq!(priors.kernel_lengthscale_gamma, (2.0, 2.0));
        assert!((priors.noise_variance_exponential_lambda() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn variants_override_only_their_setting() {
        let basic = GpModelConfig::new(rbf());
        assert_eq!(basic.name, "GPModel");
        assert_eq!(basic.expected_observation_noise, EXPECTED_OBSERVATION_NOISE);

        let extensive = GpModelConfig::variant(rbf(), GpModelVariant::ExtensiveOptimization);
        assert_eq!(extensive.n_starts_for_multistart_opt, 20);
        assert_eq!(extensive.perturbation_for_multistart_opt, basic.perturbation_for_multistart_opt);

        let fast = GpModelConfig::variant(rbf(), GpModelVariant::Fast);
        assert!(!fast.perform_multi_start_optimization);
        assert_eq!(fast.initial_parameter_strategy, InitialParameters::Perturb);

        let uniform = GpModelConfig::variant(rbf(), GpModelVariant::UniformInitialization);
        assert_eq!(uniform.initial_parameter_strategy, InitialParameters::UniformDistribution);

        assert!(GpModelConfig::variant(rbf(), GpModelVariant::WithNoisePrior).set_prior_on_observation_noise);
        assert!(!GpModelConfig::variant(rbf(), GpModelVariant::FixedNoise).train_likelihood_variance);
        assert_eq!(
            GpModelConfig::variant(rbf(), GpModelVariant::SmallPerturbation).perturbation_for_multistart_opt,
            0.1
        );
    }

    #[test]
    fn transfer_defaults() {
        let config = TransferGpModelConfig::new(rbf());
        assert_eq!(config.observation_noise, 0.1);
        assert_eq!(config.expected_observation_noise, 0.3);
        assert_eq!(config.n_starts_for_multistart_opt, 5);
        assert_eq!(config.source_training_mode, SourceTraining::WithoutTarget);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let no_starts = GpModelConfig::new(rbf()).with_starts(0);
        assert!(matches!(no_starts.validate(), Err(ConfigError::InvalidValue { .. })));

        let silent = GpModelConfig::new(rbf()).with_observation_noise(0.0);
        assert!(silent.validate().is_err());

        let flat = GpModelConfig::new(KernelConfig::new(KernelKind::Matern52, 0));
        match flat.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "input_dimension"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn model_config_is_tagged() {
        let model = ModelConfig::TransferGp(TransferGpModelConfig::new(rbf().with_prior(PriorParameters::standard())));
        let json = serde_json::to_string(&model).unwrap();
        assert!(json.contains("\"type\":\"transfer_gp\""), "{json}");
        let parsed: ModelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, model);
        assert_eq!(parsed.name(), "BasicTransferGP");
    }
}
