//! The pool contract.
//!
//! [`Pool`] has required methods every information source must answer
//! (point queries, unconstrained random data, dimensions, sampling flags) and
//! provided methods for the optional sampling variants that report
//! [`PoolError::Unsupported`] unless a concrete pool overrides them.
//!
//! Capabilities that only some pools have (maximum finding, context status)
//! are separate traits exposed through [`Pool::max_finder`] and
//! [`Pool::context`], so callers probe for them explicitly.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use st_types::{Bound, Observations, OutputType, PoolError, PoolResult, QueryResult};

/// Stateful accessor over one information source.
pub trait Pool: Send {
    fn output_type(&self) -> OutputType {
        OutputType::SingleOutput
    }

    fn with_replacement(&self) -> bool;

    /// Applies to later sampling calls only.
    fn set_replacement(&mut self, with_replacement: bool);

    fn query_nonexistent(&self) -> bool;

    /// Applies to later queries only.
    fn set_query_nonexistent(&mut self, allow: bool);

    /// Input dimension `D`.
    fn dimension(&self) -> usize;

    /// Number of inputs that are not fixed to a constant.
    fn variable_dimension(&self) -> usize {
        self.dimension()
    }

    /// Safety dimension `Q`.
    fn safety_dimension(&self) -> usize;

    /// Evaluate one point of length `D`.
    fn query(&mut self, x: ArrayView1<'_, f64>, noisy: bool) -> PoolResult<QueryResult>;

    /// Evaluate every row of `x`, returning `(y [n,1], z [n,Q])`.
    fn batch_query(
        &mut self,
        x: ArrayView2<'_, f64>,
        noisy: bool,
    ) -> PoolResult<(Array2<f64>, Array2<f64>)> {
        let mut observations = Observations::with_dimensions(x.ncols(), self.safety_dimension());
        for row in x.outer_iter() {
            let result = self.query(row, noisy)?;
            observations.push(row, &result)?;
        }
        Ok((observations.y, observations.z))
    }

    /// `n` uniform draws from the pool's domain with their observations.
    fn get_random_data(&mut self, n: usize, noisy: bool) -> PoolResult<Observations>;

    /// `n` uniform draws from the box `[lower, lower + width]`.
    fn get_random_data_in_box(
        &mut self,
        _n: usize,
        _lower: &Bound,
        _width: &Bound,
        _noisy: bool,
    ) -> PoolResult<Observations> {
        Err(PoolError::unsupported("get_random_data_in_box"))
    }

    /// `n` draws whose safety values lie in `[constraint_lower, constraint_upper]`.
    fn get_random_constrained_data(
        &mut self,
        _n: usize,
        _noisy: bool,
        _constraint_lower: &Bound,
        _constraint_upper: &Bound,
    ) -> PoolResult<Observations> {
        Err(PoolError::unsupported("get_random_constrained_data"))
    }

    /// Box and safety filters combined.
    fn get_random_constrained_data_in_box(
        &mut self,
        _n: usize,
        _lower: &Bound,
        _width: &Bound,
        _noisy: bool,
        _constraint_lower: &Bound,
        _constraint_upper: &Bound,
    ) -> PoolResult<Observations> {
        Err(PoolError::unsupported("get_random_constrained_data_in_box"))
    }

    /// Observations on a regular grid with `n_per_dim` points per variable dimension.
    fn get_grid_data(&mut self, _n_per_dim: usize, _noisy: bool) -> PoolResult<Observations> {
        Err(PoolError::unsupported("get_grid_data"))
    }

    /// Observations of the stored rows at `indices`.
    fn get_data_from_idx(&mut self, _indices: &[usize], _noisy: bool) -> PoolResult<Observations> {
        Err(PoolError::unsupported("get_data_from_idx"))
    }

    /// The finite candidate set, `[m, D]`.
    fn possible_queries(&self) -> PoolResult<Array2<f64>> {
        Err(PoolError::unsupported("possible_queries"))
    }

    fn max_finder(&self) -> Option<&dyn MaxFinder> {
        None
    }

    fn context(&self) -> Option<&dyn ContextAware> {
        None
    }
}

/// Pools that know their noiseless optimum.
pub trait MaxFinder {
    fn get_max(&self) -> PoolResult<f64>;

    /// Largest value among points whose noiseless safety lies in the bounds.
    fn get_constrained_max(&self, constraint_lower: &Bound, constraint_upper: &Bound) -> PoolResult<f64>;
}

/// Pools with inputs pinned to a context.
pub trait ContextAware {
    /// For each row of `x`, whether it matches the pool's context.
    fn get_context_status(&self, x: ArrayView2<'_, f64>) -> PoolResult<Array1<bool>>;
}

impl std::fmt::Debug for dyn Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("output_type", &self.output_type())
            .field("dimension", &self.dimension())
            .field("safety_dimension", &self.safety_dimension())
            .field("with_replacement", &self.with_replacement())
            .field("query_nonexistent", &self.query_nonexistent())
            .finish()
    }
}
