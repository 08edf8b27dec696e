use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{PoolError, PoolResult};

/// How a pool lays out its outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputType {
    /// One primary output per input row.
    SingleOutput,
    /// Several outputs flattened into one input space with a trailing task-index column.
    MultiOutputFlattened,
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputType::SingleOutput => "SingleOutput",
            OutputType::MultiOutputFlattened => "MultiOutputFlattened",
        };
        write!(f, "{}", s)
    }
}

/// A bound that is either shared by every dimension or given per dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    Scalar(f64),
    PerDim(Vec<f64>),
}

impl Bound {
    pub fn unbounded_below() -> Self {
        Bound::Scalar(f64::NEG_INFINITY)
    }

    pub fn unbounded_above() -> Self {
        Bound::Scalar(f64::INFINITY)
    }

    /// Expand to exactly `len` values. A scalar is repeated; a vector must
    /// already have `len` entries.
    pub fn broadcast(&self, len: usize) -> PoolResult<Array1<f64>> {
        match self {
            Bound::Scalar(v) => Ok(Array1::from_elem(len, *v)),
            Bound::PerDim(values) if values.len() == len => Ok(Array1::from_vec(values.clone())),
            Bound::PerDim(values) => Err(PoolError::DimensionMismatch {
                expected: len,
                actual: values.len(),
            }),
        }
    }
}

impl From<f64> for Bound {
    fn from(value: f64) -> Self {
        Bound::Scalar(value)
    }
}

impl From<Vec<f64>> for Bound {
    fn from(values: Vec<f64>) -> Self {
        Bound::PerDim(values)
    }
}

impl From<&[f64]> for Bound {
    fn from(values: &[f64]) -> Self {
        Bound::PerDim(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Bound {
    fn from(values: [f64; N]) -> Self {
        Bound::PerDim(values.to_vec())
    }
}

/// Axis-aligned box `[lower, lower + width]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxRegion {
    pub lower: Array1<f64>,
    pub upper: Array1<f64>,
}

impl BoxRegion {
    pub fn new(lower: &Bound, width: &Bound, dimension: usize) -> PoolResult<Self> {
        let lower = lower.broadcast(dimension)?;
        let width = width.broadcast(dimension)?;
        if width.iter().any(|w| *w < 0.0 || w.is_nan()) {
            return Err(PoolError::InvalidInput {
                message: format!("box width must be non-negative, got {}", width),
            });
        }
        let upper = &lower + &width;
        Ok(Self { lower, upper })
    }

    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    pub fn contains(&self, x: ArrayView1<'_, f64>) -> bool {
        x.len() == self.lower.len()
            && x
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(v, (lo, hi))| *v >= *lo && *v <= *hi)
    }

    /// Intersection with another box of the same dimension, `None` when empty.
    pub fn intersect(&self, other: &BoxRegion) -> Option<BoxRegion> {
        if self.dimension() != other.dimension() {
            return None;
        }
        let lower = Array1::from_iter(self.lower.iter().zip(other.lower.iter()).map(|(a, b)| a.max(*b)));
        let upper = Array1::from_iter(self.upper.iter().zip(other.upper.iter()).map(|(a, b)| a.min(*b)));
        if lower.iter().zip(upper.iter()).any(|(lo, hi)| lo > hi) {
            return None;
        }
        Some(BoxRegion { lower, upper })
    }
}

/// Componentwise bounds on the safety vector.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyConstraint {
    pub lower: Array1<f64>,
    pub upper: Array1<f64>,
}

impl SafetyConstraint {
    pub fn new(lower: &Bound, upper: &Bound, safety_dimension: usize) -> PoolResult<Self> {
        Ok(Self {
            lower: lower.broadcast(safety_dimension)?,
            upper: upper.broadcast(safety_dimension)?,
        })
    }

    pub fn is_satisfied(&self, safety: ArrayView1<'_, f64>) -> bool {
        safety.len() == self.lower.len()
            && safety
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(z, (lo, hi))| *z >= *lo && *z <= *hi)
    }
}

/// Result of evaluating a single point: primary value plus safety vector.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub value: f64,
    pub safety: Array1<f64>,
}

impl QueryResult {
    pub fn new(value: f64, safety: Array1<f64>) -> Self {
        Self { value, safety }
    }
}

/// Inputs with their primary and safety observations.
///
/// `x` is `[n, D]`, `y` is `[n, 1]`, `z` is `[n, Q]`. Rows correspond positionally.
#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    pub x: Array2<f64>,
    pub y: Array2<f64>,
    pub z: Array2<f64>,
}

impl Observations {
    pub fn new(x: Array2<f64>, y: Array2<f64>, z: Array2<f64>) -> PoolResult<Self> {
        let n = x.nrows();
        if y.nrows() != n || z.nrows() != n {
            return Err(PoolError::InvalidInput {
                message: format!(
                    "row counts differ: x has {}, y has {}, z has {}",
                    n,
                    y.nrows(),
                    z.nrows()
                ),
            });
        }
        if y.ncols() != 1 {
            return Err(PoolError::DimensionMismatch {
                expected: 1,
                actual: y.ncols(),
            });
        }
        Ok(Self { x, y, z })
    }

    /// Empty observation set with the given input and safety widths.
    pub fn with_dimensions(input_dimension: usize, safety_dimension: usize) -> Self {
        Self {
            x: Array2::zeros((0, input_dimension)),
            y: Array2::zeros((0, 1)),
            z: Array2::zeros((0, safety_dimension)),
        }
    }

    /// Append one input row with its observation.
    pub fn push(&mut self, x: ArrayView1<'_, f64>, result: &QueryResult) -> PoolResult<()> {
        if x.len() != self.x.ncols() {
            return Err(PoolError::DimensionMismatch {
                expected: self.x.ncols(),
                actual: x.len(),
            });
        }
        if result.safety.len() != self.z.ncols() {
            return Err(PoolError::DimensionMismatch {
                expected: self.z.ncols(),
                actual: result.safety.len(),
            });
        }
        let shape_error = |e: ndarray::ShapeError| PoolError::InvalidInput {
            message: format!("failed to append observation: {}", e),
        };
        self.x.push_row(x).map_err(shape_error)?;
        self.y
            .push_row(ArrayView1::from(std::slice::from_ref(&result.value)))
            .map_err(shape_error)?;
        self.z.push_row(result.safety.view()).map_err(shape_error)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn input_dimension(&self) -> usize {
        self.x.ncols()
    }

    pub fn safety_dimension(&self) -> usize {
        self.z.ncols()
    }

    /// Keep only the rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
            z: self.z.select(Axis(0), indices),
        }
    }
}
