//! Pool over a synthetic oracle, with optional safety oracles.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use st_oracles::Oracle;
use st_types::{
    invalid_config, Bound, BoxRegion, Observations, OraclePoolConfig, PoolError, PoolResult,
    QueryResult, SafetyConstraint,
};

use crate::pool::{ContextAware, MaxFinder, Pool};
use crate::sampling::{
    choose_indices, find_row, gaussian, grid_points, seeded_rng, uniform_in_box, without_rows,
    PoolRng, REJECTION_BUDGET_PER_POINT,
};

/// Upper bound on grid size when searching for the maximum of a continuous pool.
const MAX_SEARCH_POINTS: usize = 10_000;

/// Seed of the uniform search used when the grid would be too large.
const SEARCH_SEED: u64 = 0;

const FIXED_TOLERANCE: f64 = 1e-9;

/// Pool backed by an [`Oracle`].
///
/// Without safety oracles the safety vector is the observed value itself
/// (`Q = 1`). With `n_candidates > 0` the domain is discretized into a finite
/// candidate set; while querying non-existent points is disabled, queries
/// must hit a candidate and random data is drawn from the candidates.
pub struct OraclePool {
    oracle: Box<dyn Oracle>,
    safety_oracles: Vec<Box<dyn Oracle>>,
    domain: BoxRegion,
    candidates: Option<Array2<f64>>,
    fixed_inputs: Vec<(usize, f64)>,
    with_replacement: bool,
    allow_query_nonexistent: bool,
    rng: PoolRng,
}

impl OraclePool {
    pub fn new(
        oracle: Box<dyn Oracle>,
        safety_oracles: Vec<Box<dyn Oracle>>,
        config: OraclePoolConfig,
    ) -> PoolResult<Self> {
        let dimension = oracle.dimension();
        if dimension == 0 {
            return Err(invalid_config!("oracle {} has no inputs", oracle.name()));
        }
        if let Some(bad) = safety_oracles.iter().find(|s| s.dimension() != dimension) {
            return Err(invalid_config!(
                "safety oracle {} has dimension {}, main oracle {} has {}",
                bad.name(),
                bad.dimension(),
                oracle.name(),
                dimension
            ));
        }
        for (i, (dim, _)) in config.fixed_inputs.iter().enumerate() {
            if *dim >= dimension {
                return Err(PoolError::IndexOutOfRange {
                    index: *dim,
                    len: dimension,
                });
            }
            if config.fixed_inputs[..i].iter().any(|(other, _)| other == dim) {
                return Err(invalid_config!("input {} is fixed twice", dim));
            }
        }

        let (low, high) = oracle.bounds();
        let domain = BoxRegion::new(&Bound::from(low), &Bound::from(high - low), dimension)?;

        let mut pool = Self {
            oracle,
            safety_oracles,
            domain,
            candidates: None,
            fixed_inputs: config.fixed_inputs,
            with_replacement: config.with_replacement,
            allow_query_nonexistent: config.allow_query_nonexistent,
            rng: seeded_rng(config.seed),
        };

        if config.n_candidates > 0 {
            let domain = pool.domain.clone();
            let candidates = pool.draw_continuous(config.n_candidates, &domain);
            pool.candidates = Some(candidates);
        }

        info!(
            "Created oracle pool over {} (D={}, Q={}, candidates={})",
            pool.oracle.name(),
            dimension,
            pool.safety_dimension(),
            config.n_candidates
        );
        Ok(pool)
    }

    /// Pool over a single oracle whose output doubles as the safety value.
    pub fn from_oracle(oracle: impl Oracle + 'static, config: OraclePoolConfig) -> PoolResult<Self> {
        Self::new(Box::new(oracle), Vec::new(), config)
    }

    pub fn oracle(&self) -> &dyn Oracle {
        self.oracle.as_ref()
    }

    pub fn fixed_inputs(&self) -> &[(usize, f64)] {
        &self.fixed_inputs
    }

    /// Number of remaining candidates, `None` for a continuous pool.
    pub fn n_candidates(&self) -> Option<usize> {
        self.candidates.as_ref().map(|c| c.nrows())
    }

    fn is_finite(&self) -> bool {
        self.candidates.is_some() && !self.allow_query_nonexistent
    }

    fn apply_fixed_inputs(&self, x: &mut Array1<f64>) {
        for (dim, value) in &self.fixed_inputs {
            x[*dim] = *value;
        }
    }

    fn draw_continuous(&mut self, n: usize, region: &BoxRegion) -> Array2<f64> {
        let mut points = Array2::zeros((n, region.dimension()));
        for mut row in points.outer_iter_mut() {
            let mut x = uniform_in_box(&mut self.rng, region);
            self.apply_fixed_inputs(&mut x);
            row.assign(&x);
        }
        points
    }

    fn ground_truth(&self, x: ArrayView1<'_, f64>) -> PoolResult<QueryResult> {
        let value = self.oracle.evaluate(x)?;
        let safety = if self.safety_oracles.is_empty() {
            Array1::from_elem(1, value)
        } else {
            self.safety_oracles
                .iter()
                .map(|s| s.evaluate(x))
                .collect::<PoolResult<Vec<f64>>>()?
                .into()
        };
        Ok(QueryResult::new(value, safety))
    }

    fn observe(&mut self, x: ArrayView1<'_, f64>, noisy: bool) -> PoolResult<QueryResult> {
        let mut result = self.ground_truth(x)?;
        if !noisy {
            return Ok(result);
        }
        result.value += gaussian(&mut self.rng, self.oracle.observation_noise());
        if self.safety_oracles.is_empty() {
            result.safety[0] = result.value;
        } else {
            for (z, oracle) in result.safety.iter_mut().zip(self.safety_oracles.iter()) {
                *z += gaussian(&mut self.rng, oracle.observation_noise());
            }
        }
        Ok(result)
    }

    /// The requested box clipped to the domain, with fixed inputs collapsed
    /// to their values. Empty when the box misses a fixed value.
    fn sampling_region(&self, lower: &Bound, width: &Bound, n: usize) -> PoolResult<BoxRegion> {
        let requested = BoxRegion::new(lower, width, self.dimension())?;
        let empty = || PoolError::InsufficientData {
            requested: n,
            available: 0,
        };
        let mut region = requested.intersect(&self.domain).ok_or_else(|| {
            warn!("Requested box lies outside the domain of {}", self.oracle.name());
            empty()
        })?;
        for (dim, value) in &self.fixed_inputs {
            if *value < region.lower[*dim] || *value > region.upper[*dim] {
                warn!(
                    "Requested box excludes fixed input {} = {} of {}",
                    dim,
                    value,
                    self.oracle.name()
                );
                return Err(empty());
            }
            region.lower[*dim] = *value;
            region.upper[*dim] = *value;
        }
        Ok(region)
    }

    /// Shared body of every random-data variant.
    fn sample(
        &mut self,
        n: usize,
        region: &BoxRegion,
        noisy: bool,
        constraint: Option<&SafetyConstraint>,
    ) -> PoolResult<Observations> {
        debug!(
            "Sampling {} points from {} (constrained: {}, finite: {})",
            n,
            self.oracle.name(),
            constraint.is_some(),
            self.is_finite()
        );
        if self.is_finite() {
            self.sample_candidates(n, region, noisy, constraint)
        } else {
            self.sample_continuous(n, region, noisy, constraint)
        }
    }

    fn sample_continuous(
        &mut self,
        n: usize,
        region: &BoxRegion,
        noisy: bool,
        constraint: Option<&SafetyConstraint>,
    ) -> PoolResult<Observations> {
        let mut observations = Observations::with_dimensions(self.dimension(), self.safety_dimension());
        let budget = n.saturating_mul(REJECTION_BUDGET_PER_POINT);
        let mut attempts = 0;
        while observations.len() < n {
            if attempts >= budget {
                warn!(
                    "Rejection sampling on {} exhausted after {} draws",
                    self.oracle.name(),
                    attempts
                );
                return Err(PoolError::InsufficientData {
                    requested: n,
                    available: observations.len(),
                });
            }
            attempts += 1;
            let mut x = uniform_in_box(&mut self.rng, region);
            self.apply_fixed_inputs(&mut x);
            let result = self.observe(x.view(), noisy)?;
            if constraint.map_or(true, |c| c.is_satisfied(result.safety.view())) {
                observations.push(x.view(), &result)?;
            }
        }
        Ok(observations)
    }

    fn sample_candidates(
        &mut self,
        n: usize,
        region: &BoxRegion,
        noisy: bool,
        constraint: Option<&SafetyConstraint>,
    ) -> PoolResult<Observations> {
        let candidates = match &self.candidates {
            Some(candidates) => candidates.clone(),
            None => return Err(PoolError::unsupported("sampling from an empty candidate set")),
        };
        let eligible: Vec<usize> = candidates
            .outer_iter()
            .enumerate()
            .filter(|(_, row)| region.contains(*row))
            .map(|(i, _)| i)
            .collect();
        if eligible.is_empty() && n > 0 {
            warn!("No candidates of {} lie in the requested box", self.oracle.name());
            return Err(PoolError::InsufficientData {
                requested: n,
                available: 0,
            });
        }

        let mut observations = Observations::with_dimensions(self.dimension(), self.safety_dimension());
        let mut accepted = Vec::with_capacity(n);

        if self.with_replacement {
            let budget = n.saturating_mul(REJECTION_BUDGET_PER_POINT);
            let mut attempts = 0;
            while observations.len() < n && attempts < budget {
                attempts += 1;
                let pick = choose_indices(&mut self.rng, eligible.len(), 1, true)?[0];
                let x = candidates.row(eligible[pick]);
                let result = self.observe(x, noisy)?;
                if constraint.map_or(true, |c| c.is_satisfied(result.safety.view())) {
                    observations.push(x, &result)?;
                }
            }
        } else {
            if constraint.is_none() && n > eligible.len() {
                return Err(PoolError::InsufficientData {
                    requested: n,
                    available: eligible.len(),
                });
            }
            let mut order = eligible;
            order.shuffle(&mut self.rng);
            for idx in order {
                if observations.len() == n {
                    break;
                }
                let x = candidates.row(idx);
                let result = self.observe(x, noisy)?;
                if constraint.map_or(true, |c| c.is_satisfied(result.safety.view())) {
                    observations.push(x, &result)?;
                    accepted.push(idx);
                }
            }
        }

        if observations.len() < n {
            return Err(PoolError::InsufficientData {
                requested: n,
                available: observations.len(),
            });
        }
        if !accepted.is_empty() {
            self.candidates = Some(without_rows(&candidates, &accepted));
        }
        Ok(observations)
    }

    /// Points the maximum is searched over: the candidates, a grid over the
    /// domain, or `MAX_SEARCH_POINTS` uniform draws once even a two-point grid
    /// would exceed that many rows.
    fn search_points(&self) -> Array2<f64> {
        if let Some(candidates) = &self.candidates {
            return candidates.clone();
        }
        let variable = self.variable_dimension().max(1) as f64;
        let n_per_dim = (MAX_SEARCH_POINTS as f64).powf(1.0 / variable).floor() as usize;
        if n_per_dim >= 2 {
            return self.grid(n_per_dim);
        }

        let mut rng = seeded_rng(SEARCH_SEED);
        let mut points = Array2::zeros((MAX_SEARCH_POINTS, self.dimension()));
        for mut row in points.outer_iter_mut() {
            let mut x = uniform_in_box(&mut rng, &self.domain);
            self.apply_fixed_inputs(&mut x);
            row.assign(&x);
        }
        points
    }

    fn grid(&self, n_per_dim: usize) -> Array2<f64> {
        let mut region = self.domain.clone();
        for (dim, value) in &self.fixed_inputs {
            region.lower[*dim] = *value;
            region.upper[*dim] = *value;
        }
        grid_points(&region, n_per_dim)
    }
}

impl Pool for OraclePool {
    fn with_replacement(&self) -> bool {
        self.with_replacement
    }

    fn set_replacement(&mut self, with_replacement: bool) {
        debug!("Oracle pool {}: with_replacement = {}", self.oracle.name(), with_replacement);
        self.with_replacement = with_replacement;
    }

    fn query_nonexistent(&self) -> bool {
        self.allow_query_nonexistent
    }

    fn set_query_nonexistent(&mut self, allow: bool) {
        debug!("Oracle pool {}: query_nonexistent = {}", self.oracle.name(), allow);
        self.allow_query_nonexistent = allow;
    }

    fn dimension(&self) -> usize {
        self.oracle.dimension()
    }

    fn variable_dimension(&self) -> usize {
        self.dimension() - self.fixed_inputs.len()
    }

    fn safety_dimension(&self) -> usize {
        self.safety_oracles.len().max(1)
    }

    fn query(&mut self, x: ArrayView1<'_, f64>, noisy: bool) -> PoolResult<QueryResult> {
        self.oracle.check_dimension(x)?;
        let position = self.candidates.as_ref().and_then(|c| find_row(c.view(), x));
        if self.is_finite() && position.is_none() {
            return Err(PoolError::PointNotInPool);
        }
        let result = self.observe(x, noisy)?;
        if let (Some(idx), false) = (position, self.with_replacement) {
            let remaining = self.candidates.as_ref().map(|c| without_rows(c, &[idx]));
            self.candidates = remaining;
        }
        Ok(result)
    }

    fn get_random_data(&mut self, n: usize, noisy: bool) -> PoolResult<Observations> {
        let domain = self.domain.clone();
        self.sample(n, &domain, noisy, None)
    }

    fn get_random_data_in_box(
        &mut self,
        n: usize,
        lower: &Bound,
        width: &Bound,
        noisy: bool,
    ) -> PoolResult<Observations> {
        let region = self.sampling_region(lower, width, n)?;
        self.sample(n, &region, noisy, None)
    }

    fn get_random_constrained_data(
        &mut self,
        n: usize,
        noisy: bool,
        constraint_lower: &Bound,
        constraint_upper: &Bound,
    ) -> PoolResult<Observations> {
        let constraint = SafetyConstraint::new(constraint_lower, constraint_upper, self.safety_dimension())?;
        let domain = self.domain.clone();
        self.sample(n, &domain, noisy, Some(&constraint))
    }

    fn get_random_constrained_data_in_box(
        &mut self,
        n: usize,
        lower: &Bound,
        width: &Bound,
        noisy: bool,
        constraint_lower: &Bound,
        constraint_upper: &Bound,
    ) -> PoolResult<Observations> {
        let constraint = SafetyConstraint::new(constraint_lower, constraint_upper, self.safety_dimension())?;
        let region = self.sampling_region(lower, width, n)?;
        self.sample(n, &region, noisy, Some(&constraint))
    }

    fn get_grid_data(&mut self, n_per_dim: usize, noisy: bool) -> PoolResult<Observations> {
        let grid = self.grid(n_per_dim);
        let mut observations = Observations::with_dimensions(self.dimension(), self.safety_dimension());
        for row in grid.outer_iter() {
            let result = self.observe(row, noisy)?;
            observations.push(row, &result)?;
        }
        Ok(observations)
    }

    fn possible_queries(&self) -> PoolResult<Array2<f64>> {
        self.candidates
            .clone()
            .ok_or_else(|| PoolError::unsupported("possible_queries on a continuous oracle pool"))
    }

    fn max_finder(&self) -> Option<&dyn MaxFinder> {
        Some(self)
    }

    fn context(&self) -> Option<&dyn ContextAware> {
        Some(self)
    }
}

impl MaxFinder for OraclePool {
    fn get_max(&self) -> PoolResult<f64> {
        let points = self.search_points();
        let mut best: Option<f64> = None;
        for row in points.outer_iter() {
            let value = self.oracle.evaluate(row)?;
            best = Some(best.map_or(value, |b| b.max(value)));
        }
        best.ok_or(PoolError::InsufficientData {
            requested: 1,
            available: 0,
        })
    }

    fn get_constrained_max(&self, constraint_lower: &Bound, constraint_upper: &Bound) -> PoolResult<f64> {
        let constraint = SafetyConstraint::new(constraint_lower, constraint_upper, self.safety_dimension())?;
        let points = self.search_points();
        let mut best: Option<f64> = None;
        for row in points.outer_iter() {
            let result = self.ground_truth(row)?;
            if constraint.is_satisfied(result.safety.view()) {
                best = Some(best.map_or(result.value, |b| b.max(result.value)));
            }
        }
        best.ok_or(PoolError::InsufficientData {
            requested: 1,
            available: 0,
        })
    }
}

impl ContextAware for OraclePool {
    fn get_context_status(&self, x: ArrayView2<'_, f64>) -> PoolResult<Array1<bool>> {
        if x.ncols() != self.dimension() {
            return Err(PoolError::DimensionMismatch {
                expected: self.dimension(),
                actual: x.ncols(),
            });
        }
        Ok(x.outer_iter()
            .map(|row| {
                self.fixed_inputs
                    .iter()
                    .all(|(dim, value)| (row[*dim] - value).abs() <= FIXED_TOLERANCE)
            })
            .collect())
    }
}

impl std::fmt::Debug for OraclePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OraclePool")
            .field("oracle", &self.oracle.name())
            .field("safety_oracles", &self.safety_oracles.len())
            .field("candidates", &self.n_candidates())
            .field("fixed_inputs", &self.fixed_inputs)
            .field("with_replacement", &self.with_replacement)
            .field("allow_query_nonexistent", &self.allow_query_nonexistent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use st_oracles::{BraninHoo, FunctionOracle};

    fn sum_oracle(dimension: usize) -> FunctionOracle {
        FunctionOracle::new("sum", dimension, |x| x.sum())
    }

    fn continuous(dimension: usize) -> OraclePool {
        OraclePool::from_oracle(sum_oracle(dimension), OraclePoolConfig::default()).unwrap()
    }

    #[test]
    fn query_checks_dimension() {
        let mut pool = continuous(2);
        let result = pool.query(array![0.1, 0.2, 0.3].view(), false);
        assert!(matches!(
            result,
            Err(PoolError::DimensionMismatch { expected: 2, actual: 3 })
        ));
        let ok = pool.query(array![0.1, 0.2].view(), false).unwrap();
        assert!((ok.value - 0.3).abs() < 1e-12);
        assert_eq!(ok.safety.len(), 1);
        assert_eq!(ok.safety[0], ok.value);
    }

    #[test]
    fn random_data_shapes() {
        let mut pool = continuous(3);
        let data = pool.get_random_data(5, true).unwrap();
        assert_eq!(data.x.dim(), (5, 3));
        assert_eq!(data.y.dim(), (5, 1));
        assert_eq!(data.z.dim(), (5, 1));
    }

    #[test]
    fn box_sampling_stays_in_box() {
        let oracle = sum_oracle(2).with_bounds(-2.0, 2.0);
        let mut pool = OraclePool::from_oracle(oracle, OraclePoolConfig::default()).unwrap();
        let data = pool
            .get_random_data_in_box(50, &Bound::from([0.0, 0.0]), &Bound::from([1.0, 1.0]), true)
            .unwrap();
        for row in data.x.outer_iter() {
            assert!(row.iter().all(|v| (0.0..=1.0).contains(v)), "{row}");
        }
    }

    #[test]
    fn box_sampling_pins_fixed_inputs_inside_box() {
        let config = OraclePoolConfig::default().with_fixed_input(1, 0.25);
        let mut pool = OraclePool::from_oracle(sum_oracle(2), config).unwrap();
        let data = pool
            .get_random_data_in_box(5, &Bound::from(0.0), &Bound::from(0.5), true)
            .unwrap();
        for row in data.x.outer_iter() {
            assert!((0.0..=0.5).contains(&row[0]), "{row}");
            assert_eq!(row[1], 0.25);
        }
    }

    #[test]
    fn box_excluding_fixed_input_is_insufficient() {
        let config = OraclePoolConfig::default().with_fixed_input(1, 0.9);
        let mut pool = OraclePool::from_oracle(sum_oracle(2), config).unwrap();
        let lower = Bound::from(0.0);
        let width = Bound::from(0.5);
        assert!(matches!(
            pool.get_random_data_in_box(5, &lower, &width, true),
            Err(PoolError::InsufficientData { requested: 5, available: 0 })
        ));
        assert!(matches!(
            pool.get_random_constrained_data_in_box(5, &lower, &width, true, &Bound::from(0.0), &Bound::from(2.0)),
            Err(PoolError::InsufficientData { .. })
        ));
    }

    #[test]
    fn max_search_stays_bounded_in_high_dimensions() {
        let pool = continuous(16);
        let points = pool.search_points();
        assert_eq!(points.dim(), (MAX_SEARCH_POINTS, 16));
        assert!(points.iter().all(|v| (0.0..=1.0).contains(v)));

        let max = pool.max_finder().unwrap().get_max().unwrap();
        assert!(max > 8.0 && max < 16.0, "max = {max}");

        // a 13-D grid with two points per axis still fits
        assert_eq!(continuous(13).search_points().nrows(), 1 << 13);
    }

    #[test]
    fn box_outside_domain_is_insufficient() {
        let mut pool = continuous(2);
        let result = pool.get_random_data_in_box(3, &Bound::from(5.0), &Bound::from(1.0), true);
        assert!(matches!(result, Err(PoolError::InsufficientData { .. })));
    }

    #[test]
    fn constrained_sampling_respects_safety_bounds() {
        let safety = FunctionOracle::new("first", 2, |x| 2.0 * x[0] - 0.5);
        let mut pool = OraclePool::new(
            Box::new(sum_oracle(2)),
            vec![Box::new(safety)],
            OraclePoolConfig::default(),
        )
        .unwrap();
        let data = pool
            .get_random_constrained_data(40, true, &Bound::from(0.0), &Bound::from(1.0))
            .unwrap();
        assert_eq!(data.len(), 40);
        for z in data.z.iter() {
            assert!((0.0..=1.0).contains(z), "z = {z}");
        }
    }

    #[test]
    fn constrained_box_sampling_combines_filters() {
        let mut pool = continuous(2);
        let data = pool
            .get_random_constrained_data_in_box(
                20,
                &Bound::from(0.0),
                &Bound::from(0.5),
                false,
                &Bound::from(0.0),
                &Bound::from(0.5),
            )
            .unwrap();
        for (row, z) in data.x.outer_iter().zip(data.z.iter()) {
            assert!(row.iter().all(|v| (0.0..=0.5).contains(v)));
            assert!(*z <= 0.5);
        }
    }

    #[test]
    fn impossible_constraint_exhausts_budget() {
        let mut pool = continuous(1);
        let result = pool.get_random_constrained_data(2, false, &Bound::from(5.0), &Bound::from(6.0));
        assert!(matches!(result, Err(PoolError::InsufficientData { requested: 2, .. })));
    }

    #[test]
    fn finite_pool_consumes_candidates_without_replacement() {
        let config = OraclePoolConfig::default().with_candidates(10);
        let mut pool = OraclePool::from_oracle(sum_oracle(2), config).unwrap();
        let candidates = pool.possible_queries().unwrap();
        assert_eq!(candidates.nrows(), 10);

        let first = candidates.row(0).to_owned();
        pool.query(first.view(), false).unwrap();
        assert_eq!(pool.n_candidates(), Some(9));
        assert!(matches!(pool.query(first.view(), false), Err(PoolError::PointNotInPool)));

        let data = pool.get_random_data(9, false).unwrap();
        assert_eq!(data.len(), 9);
        assert_eq!(pool.n_candidates(), Some(0));
        assert!(matches!(
            pool.get_random_data(1, false),
            Err(PoolError::InsufficientData { requested: 1, available: 0 })
        ));
    }

    #[test]
    fn finite_pool_with_replacement_keeps_candidates() {
        let config = OraclePoolConfig::default().with_candidates(5).with_replacement(true);
        let mut pool = OraclePool::from_oracle(sum_oracle(2), config).unwrap();
        let data = pool.get_random_data(20, true).unwrap();
        assert_eq!(data.len(), 20);
        assert_eq!(pool.n_candidates(), Some(5));
    }

    #[test]
    fn nonexistent_points_allowed_after_flag() {
        let config = OraclePoolConfig::default().with_candidates(5);
        let mut pool = OraclePool::from_oracle(sum_oracle(2), config).unwrap();
        let outside = array![0.123456, 0.654321];
        assert!(matches!(pool.query(outside.view(), false), Err(PoolError::PointNotInPool)));
        pool.set_query_nonexistent(true);
        assert!(pool.query(outside.view(), false).is_ok());
        assert_eq!(pool.n_candidates(), Some(5));
    }

    #[test]
    fn fixed_inputs_reduce_variable_dimension() {
        let config = OraclePoolConfig::default().with_fixed_input(1, 0.25);
        let mut pool = OraclePool::from_oracle(sum_oracle(3), config).unwrap();
        assert_eq!(pool.dimension(), 3);
        assert_eq!(pool.variable_dimension(), 2);
        let data = pool.get_random_data(10, false).unwrap();
        assert!(data.x.column(1).iter().all(|v| *v == 0.25));

        let status = pool
            .context()
            .unwrap()
            .get_context_status(array![[0.1, 0.25, 0.3], [0.1, 0.5, 0.3]].view())
            .unwrap();
        assert_eq!(status, array![true, false]);
    }

    #[test]
    fn duplicate_fixed_inputs_are_rejected() {
        let config = OraclePoolConfig::default()
            .with_fixed_input(0, 0.1)
            .with_fixed_input(0, 0.2);
        let result = OraclePool::from_oracle(sum_oracle(2), config);
        assert!(matches!(result, Err(PoolError::InvalidConfiguration { .. })));
    }

    #[test]
    fn grid_data_covers_domain() {
        let mut pool = continuous(2);
        let data = pool.get_grid_data(4, false).unwrap();
        assert_eq!(data.len(), 16);
        assert_eq!(data.y[[15, 0]], 2.0);
    }

    #[test]
    fn max_of_sum_is_at_corner() {
        let pool = continuous(2);
        let max = pool.max_finder().unwrap().get_max().unwrap();
        assert!((max - 2.0).abs() < 1e-12);
        let constrained = pool
            .max_finder()
            .unwrap()
            .get_constrained_max(&Bound::from(0.0), &Bound::from(1.0))
            .unwrap();
        assert!(constrained <= 1.0 && constrained > 0.9);
    }

    #[test]
    fn branin_max_is_finite() {
        let pool = OraclePool::from_oracle(BraninHoo::new(0.0), OraclePoolConfig::default()).unwrap();
        let max = pool.max_finder().unwrap().get_max().unwrap();
        assert!(max.is_finite() && max > 100.0);
    }

    #[test]
    fn same_seed_same_samples() {
        let mut a = continuous(2);
        let mut b = continuous(2);
        assert_eq!(
            a.get_random_data(5, true).unwrap(),
            b.get_random_data(5, true).unwrap()
        );
    }
}
