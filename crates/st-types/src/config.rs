//! Declarative configuration for pools and transfer-learning experiments.
//!
//! Every config is a plain serde struct with a `Default` and `with_*`
//! builders, so experiments can be described in JSON and loaded with
//! [`ExperimentConfig::from_json_str`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::Bound;
use crate::errors::{ConfigError, StResult};
use crate::models::ModelConfig;

/// Settings for a pool that wraps a synthetic oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OraclePoolConfig {
    /// Seed for the pool's own random generator.
    pub seed: u64,
    /// Size of the finite candidate set; 0 means the domain stays continuous.
    pub n_candidates: usize,
    pub with_replacement: bool,
    pub allow_query_nonexistent: bool,
    /// Input coordinates pinned to a constant, as `(dimension, value)`.
    pub fixed_inputs: Vec<(usize, f64)>,
}

impl Default for OraclePoolConfig {
    fn default() -> Self {
        Self {
            seed: 1234,
            n_candidates: 0,
            with_replacement: false,
            allow_query_nonexistent: true,
            fixed_inputs: Vec::new(),
        }
    }
}

impl OraclePoolConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Discretize the domain into `n` uniform candidates. Querying outside
    /// the candidate set is disabled.
    pub fn with_candidates(mut self, n: usize) -> Self {
        self.n_candidates = n;
        self.allow_query_nonexistent = false;
        self
    }

    pub fn with_replacement(mut self, with_replacement: bool) -> Self {
        self.with_replacement = with_replacement;
        self
    }

    pub fn with_fixed_input(mut self, dimension: usize, value: f64) -> Self {
        self.fixed_inputs.push((dimension, value));
        self
    }
}

/// Settings for a pool backed by three recorded tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetPoolConfig {
    pub name: String,
    pub x_path: PathBuf,
    pub y_path: PathBuf,
    pub z_path: PathBuf,
    /// Columns of the X table used as inputs; empty selects all.
    #[serde(default)]
    pub input_idx: Vec<usize>,
    /// Column of the Y table used as the primary output.
    #[serde(default)]
    pub output_idx: usize,
    /// Columns of the Z table used as safety outputs; empty selects all.
    #[serde(default)]
    pub safety_idx: Vec<usize>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub with_replacement: bool,
    #[serde(default)]
    pub allow_query_nonexistent: bool,
}

fn default_seed() -> u64 {
    1234
}

impl DatasetPoolConfig {
    pub fn new(
        name: &str,
        x_path: impl Into<PathBuf>,
        y_path: impl Into<PathBuf>,
        z_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.to_string(),
            x_path: x_path.into(),
            y_path: y_path.into(),
            z_path: z_path.into(),
            input_idx: Vec::new(),
            output_idx: 0,
            safety_idx: Vec::new(),
            seed: default_seed(),
            with_replacement: false,
            allow_query_nonexistent: false,
        }
    }

    pub fn with_columns(mut self, input_idx: Vec<usize>, output_idx: usize, safety_idx: Vec<usize>) -> Self {
        self.input_idx = input_idx;
        self.output_idx = output_idx;
        self.safety_idx = safety_idx;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::MissingField {
                field: "name".to_string(),
            });
        }
        for (field, path) in [("x_path", &self.x_path), ("y_path", &self.y_path), ("z_path", &self.z_path)] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A transfer-learning experiment: source tasks with recorded data and one
/// target task, composed into a multitask pool with the target last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferTaskConfig {
    pub name: String,
    pub source_tasks: Vec<DatasetPoolConfig>,
    pub target_task: DatasetPoolConfig,
    /// Lower corner of the region initial target data is drawn from.
    #[serde(default)]
    pub target_box_lower: Vec<f64>,
    #[serde(default)]
    pub target_box_width: Vec<f64>,
    /// Base seed; task `i` samples with `seed + i`.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl TransferTaskConfig {
    pub fn new(name: &str, target_task: DatasetPoolConfig) -> Self {
        Self {
            name: name.to_string(),
            source_tasks: Vec::new(),
            target_task,
            target_box_lower: Vec::new(),
            target_box_width: Vec::new(),
            seed: default_seed(),
        }
    }

    pub fn with_source(mut self, source: DatasetPoolConfig) -> Self {
        self.source_tasks.push(source);
        self
    }

    pub fn with_target_box(mut self, lower: Vec<f64>, width: Vec<f64>) -> Self {
        self.target_box_lower = lower;
        self.target_box_width = width;
        self
    }

    /// Task configs in pool order: sources first, target last.
    pub fn tasks(&self) -> impl Iterator<Item = &DatasetPoolConfig> {
        self.source_tasks.iter().chain(std::iter::once(&self.target_task))
    }

    pub fn n_tasks(&self) -> usize {
        self.source_tasks.len() + 1
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::MissingField {
                field: "name".to_string(),
            });
        }
        for task in self.tasks() {
            task.validate()?;
        }
        if self.target_box_lower.len() != self.target_box_width.len() {
            return Err(ConfigError::InvalidValue {
                field: "target_box_width".to_string(),
                message: format!(
                    "has {} entries but target_box_lower has {}",
                    self.target_box_width.len(),
                    self.target_box_lower.len()
                ),
            });
        }
        if self.target_box_width.iter().any(|w| *w < 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "target_box_width".to_string(),
                message: "widths must be non-negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Top-level experiment description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub name: String,
    /// Number of initial points drawn before acquisition starts.
    pub n_initial: usize,
    /// Number of acquisition steps.
    pub n_steps: usize,
    /// Lower safety bound; a single value applies to every safety output.
    pub safety_lower: Option<Bound>,
    pub safety_upper: Option<Bound>,
    pub tasks: Option<TransferTaskConfig>,
    pub oracle_pool: OraclePoolConfig,
    #[serde(default)]
    pub model: Option<ModelConfig>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: "experiment".to_string(),
            n_initial: 10,
            n_steps: 50,
            safety_lower: None,
            safety_upper: None,
            tasks: None,
            oracle_pool: OraclePoolConfig::default(),
            model: None,
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(json: &str) -> StResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> StResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_initial == 0 {
            return Err(ConfigError::InvalidValue {
                field: "n_initial".to_string(),
                message: "at least one initial point is required".to_string(),
            });
        }
        if let (Some(Bound::PerDim(lower)), Some(Bound::PerDim(upper))) =
            (&self.safety_lower, &self.safety_upper)
        {
            if lower.len() != upper.len() {
                return Err(ConfigError::InvalidValue {
                    field: "safety_upper".to_string(),
                    message: format!(
                        "has {} entries but safety_lower has {}",
                        upper.len(),
                        lower.len()
                    ),
                });
            }
        }
        if let Some(tasks) = &self.tasks {
            tasks.validate()?;
        }
        if let Some(model) = &self.model {
            model.validate()?;
        }
        Ok(())
    }
}
