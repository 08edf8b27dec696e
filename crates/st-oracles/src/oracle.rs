//! The oracle contract and a closure-backed implementation.

use ndarray::ArrayView1;
use st_types::{PoolError, PoolResult};
use std::fmt;

/// A deterministic function over the box `[low, high]^D`.
pub trait Oracle: Send + Sync {
    /// Human-readable oracle name.
    fn name(&self) -> &str;

    /// Input dimension `D`.
    fn dimension(&self) -> usize;

    /// Per-dimension input box `(low, high)`, shared by every dimension.
    fn bounds(&self) -> (f64, f64);

    /// Standard deviation of the Gaussian noise added to noisy observations.
    fn observation_noise(&self) -> f64;

    /// Noiseless value at `x`.
    fn evaluate(&self, x: ArrayView1<'_, f64>) -> PoolResult<f64>;

    /// Reject inputs whose length is not `D`.
    fn check_dimension(&self, x: ArrayView1<'_, f64>) -> PoolResult<()> {
        if x.len() != self.dimension() {
            return Err(PoolError::DimensionMismatch {
                expected: self.dimension(),
                actual: x.len(),
            });
        }
        Ok(())
    }
}

type OracleFn = Box<dyn Fn(ArrayView1<'_, f64>) -> f64 + Send + Sync>;

/// Oracle defined by an arbitrary closure.
pub struct FunctionOracle {
    name: String,
    dimension: usize,
    bounds: (f64, f64),
    observation_noise: f64,
    function: OracleFn,
}

impl FunctionOracle {
    pub fn new<F>(name: &str, dimension: usize, function: F) -> Self
    where
        F: Fn(ArrayView1<'_, f64>) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            dimension,
            bounds: (0.0, 1.0),
            observation_noise: 0.0,
            function: Box::new(function),
        }
    }

    pub fn with_bounds(mut self, low: f64, high: f64) -> Self {
        self.bounds = (low, high);
        self
    }

    pub fn with_noise(mut self, observation_noise: f64) -> Self {
        self.observation_noise = observation_noise;
        self
    }
}

impl fmt::Debug for FunctionOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionOracle")
            .field("name", &self.name)
            .field("dimension", &self.dimension)
            .field("bounds", &self.bounds)
            .field("observation_noise", &self.observation_noise)
            .finish()
    }
}

impl Oracle for FunctionOracle {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn bounds(&self) -> (f64, f64) {
        self.bounds
    }

    fn observation_noise(&self) -> f64 {
        self.observation_noise
    }

    fn evaluate(&self, x: ArrayView1<'_, f64>) -> PoolResult<f64> {
        self.check_dimension(x)?;
        Ok((self.function)(x))
    }
}
