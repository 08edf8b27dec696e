//! Branin–Hoo benchmark with transfer-learning task variants.

use ndarray::ArrayView1;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use st_types::PoolResult;

use crate::oracle::Oracle;

const NORMALIZE_MEAN: f64 = 60.088767740805736;
const NORMALIZE_SCALE: f64 = 62.34134408167649;

/// Branin–Hoo on the unit square.
///
/// Inputs in `[0, 1]^2` are rescaled to `x1 ∈ [-5, 10]`, `x2 ∈ [0, 15]` and
/// evaluated as `a (x2 - b x1² + c x1 - r)² + s (1 - t) cos(x1) + s`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BraninHoo {
    /// `(a, b, c, r, s, t)`.
    pub constants: [f64; 6],
    pub observation_noise: f64,
    normalize_mean: f64,
    normalize_scale: f64,
}

impl BraninHoo {
    pub fn new(observation_noise: f64) -> Self {
        Self {
            constants: Self::default_constants(),
            observation_noise,
            normalize_mean: 0.0,
            normalize_scale: 1.0,
        }
    }

    pub fn default_constants() -> [f64; 6] {
        [
            1.0,
            5.1 / 4.0 / (PI * PI),
            5.0 / PI,
            6.0,
            10.0,
            1.0 / 8.0 / PI,
        ]
    }

    pub fn with_constants(mut self, constants: [f64; 6]) -> Self {
        self.constants = constants;
        self
    }

    /// Standardize outputs with the benchmark's mean and scale.
    pub fn normalized(mut self) -> Self {
        self.normalize_mean = NORMALIZE_MEAN;
        self.normalize_scale = NORMALIZE_SCALE;
        self
    }

    /// Draw constants for a related task.
    ///
    /// Ranges follow Tighineanu et al. (AISTATS 2022) and Rothfuss et al.
    /// (CoRL 2022).
    pub fn sample_constants<R: Rng + ?Sized>(rng: &mut R) -> [f64; 6] {
        [
            rng.gen_range(0.5..1.5),
            rng.gen_range(0.1..0.15),
            rng.gen_range(1.0..2.0),
            rng.gen_range(5.0..7.0),
            rng.gen_range(8.0..12.0),
            rng.gen_range(0.03..0.05),
        ]
    }

    /// A Branin–Hoo task with randomly drawn constants.
    pub fn random_task<R: Rng + ?Sized>(observation_noise: f64, rng: &mut R) -> Self {
        Self::new(observation_noise).with_constants(Self::sample_constants(rng))
    }

    fn rescale(&self, x1: f64, x2: f64) -> (f64, f64) {
        let (low, high) = self.bounds();
        let span = high - low;
        ((x1 - low) / span * 15.0 - 5.0, (x2 - low) / span * 15.0)
    }

    pub fn expression(&self) -> String {
        let [a, b, c, r, s, t] = self.constants;
        format!("{a}(x2 - {b} x1^2 + {c} x1 - {r})^2 + {s}(1-{t}) cos(x1) + {s}")
    }
}

impl Default for BraninHoo {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl Oracle for BraninHoo {
    fn name(&self) -> &str {
        "branin_hoo"
    }

    fn dimension(&self) -> usize {
        2
    }

    fn bounds(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn observation_noise(&self) -> f64 {
        self.observation_noise
    }

    fn evaluate(&self, x: ArrayView1<'_, f64>) -> PoolResult<f64> {
        self.check_dimension(x)?;
        let [a, b, c, r, s, t] = self.constants;
        let (x1, x2) = self.rescale(x[0], x[1]);
        let raw = a * (x2 - b * x1 * x1 + c * x1 - r).powi(2) + s * (1.0 - t) * x1.cos() + s;
        Ok((raw - self.normalize_mean) / self.normalize_scale)
    }
}
