//! Pool over recorded experiments.

use ndarray::{Array2, ArrayView1, Axis};
use tracing::{debug, info, warn};

use st_types::{
    invalid_config, Bound, BoxRegion, DatasetPoolConfig, Observations, PoolError, PoolResult,
    QueryResult, SafetyConstraint,
};

use crate::loader::load_data;
use crate::pool::Pool;
use crate::sampling::{choose_indices, find_row, nearest_row, seeded_rng, without_rows, PoolRng};

/// Pool backed by recorded `(x, y, z)` rows.
///
/// Recorded values already carry measurement noise, so every request for
/// noiseless data is `Unsupported`. Without replacement, rows handed out by
/// `query` or random sampling leave the pool.
#[derive(Debug)]
pub struct DatasetPool {
    name: String,
    x: Array2<f64>,
    y: Array2<f64>,
    z: Array2<f64>,
    with_replacement: bool,
    allow_query_nonexistent: bool,
    rng: PoolRng,
}

impl DatasetPool {
    pub fn new(name: &str, x: Array2<f64>, y: Array2<f64>, z: Array2<f64>, seed: u64) -> PoolResult<Self> {
        // validates row alignment and the single output column
        let data = Observations::new(x, y, z)?;
        if data.input_dimension() == 0 {
            return Err(invalid_config!("dataset {} has no input columns", name));
        }
        info!(
            "Created dataset pool {} with {} rows (D={}, Q={})",
            name,
            data.len(),
            data.input_dimension(),
            data.safety_dimension()
        );
        Ok(Self {
            name: name.to_string(),
            x: data.x,
            y: data.y,
            z: data.z,
            with_replacement: false,
            allow_query_nonexistent: false,
            rng: seeded_rng(seed),
        })
    }

    /// Load the three tables named in `config` and keep the configured columns.
    pub fn from_config(config: &DatasetPoolConfig) -> PoolResult<Self> {
        config
            .validate()
            .map_err(|e| invalid_config!("dataset {}: {}", config.name, e))?;
        let (x, y, z) = load_data(&config.x_path, &config.y_path, &config.z_path)?;

        let x = select_columns(&x, &config.input_idx, "input_idx")?;
        let y = select_columns(&y, &[config.output_idx], "output_idx")?;
        let z = select_columns(&z, &config.safety_idx, "safety_idx")?;

        let mut pool = Self::new(&config.name, x, y, z, config.seed)?;
        pool.with_replacement = config.with_replacement;
        pool.allow_query_nonexistent = config.allow_query_nonexistent;
        Ok(pool)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rows still available.
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn require_noisy(&self, noisy: bool, operation: &str) -> PoolResult<()> {
        if noisy {
            Ok(())
        } else {
            Err(PoolError::Unsupported {
                operation: format!("noiseless {} on recorded dataset {}", operation, self.name),
            })
        }
    }

    fn row_result(&self, idx: usize) -> QueryResult {
        QueryResult::new(self.y[[idx, 0]], self.z.row(idx).to_owned())
    }

    fn remove_rows(&mut self, removed: &[usize]) {
        self.x = without_rows(&self.x, removed);
        self.y = without_rows(&self.y, removed);
        self.z = without_rows(&self.z, removed);
    }

    /// Shared body of every random-data variant: filter rows, then draw.
    fn sample(
        &mut self,
        n: usize,
        region: Option<&BoxRegion>,
        constraint: Option<&SafetyConstraint>,
    ) -> PoolResult<Observations> {
        let eligible: Vec<usize> = (0..self.len())
            .filter(|&i| region.map_or(true, |r| r.contains(self.x.row(i))))
            .filter(|&i| constraint.map_or(true, |c| c.is_satisfied(self.z.row(i))))
            .collect();
        debug!(
            "Sampling {} of {} eligible rows from dataset {}",
            n,
            eligible.len(),
            self.name
        );
        if eligible.is_empty() && n > 0 {
            warn!("No rows of dataset {} pass the requested filters", self.name);
        }

        let picks = choose_indices(&mut self.rng, eligible.len(), n, self.with_replacement)?;
        let rows: Vec<usize> = picks.into_iter().map(|p| eligible[p]).collect();
        let observations = Observations::new(
            self.x.select(Axis(0), &rows),
            self.y.select(Axis(0), &rows),
            self.z.select(Axis(0), &rows),
        )?;
        if !self.with_replacement {
            self.remove_rows(&rows);
        }
        Ok(observations)
    }
}

fn select_columns(table: &Array2<f64>, columns: &[usize], field: &str) -> PoolResult<Array2<f64>> {
    if columns.is_empty() {
        return Ok(table.clone());
    }
    if let Some(&bad) = columns.iter().find(|&&c| c >= table.ncols()) {
        return Err(invalid_config!(
            "{} refers to column {} but the table has {} columns",
            field,
            bad,
            table.ncols()
        ));
    }
    Ok(table.select(Axis(1), columns))
}

impl Pool for DatasetPool {
    fn with_replacement(&self) -> bool {
        self.with_replacement
    }

    fn set_replacement(&mut self, with_replacement: bool) {
        debug!("Dataset pool {}: with_replacement = {}", self.name, with_replacement);
        self.with_replacement = with_replacement;
    }

    fn query_nonexistent(&self) -> bool {
        self.allow_query_nonexistent
    }

    fn set_query_nonexistent(&mut self, allow: bool) {
        debug!("Dataset pool {}: query_nonexistent = {}", self.name, allow);
        self.allow_query_nonexistent = allow;
    }

    fn dimension(&self) -> usize {
        self.x.ncols()
    }

    fn safety_dimension(&self) -> usize {
        self.z.ncols()
    }

    /// Looks `x` up among the remaining rows. With non-existent queries
    /// allowed, the nearest row answers instead.
    fn query(&mut self, x: ArrayView1<'_, f64>, noisy: bool) -> PoolResult<QueryResult> {
        self.require_noisy(noisy, "query")?;
        if x.len() != self.dimension() {
            return Err(PoolError::DimensionMismatch {
                expected: self.dimension(),
                actual: x.len(),
            });
        }
        let idx = match find_row(self.x.view(), x) {
            Some(idx) => idx,
            None if self.allow_query_nonexistent => {
                nearest_row(self.x.view(), x).ok_or(PoolError::InsufficientData {
                    requested: 1,
                    available: 0,
                })?
            }
            None => return Err(PoolError::PointNotInPool),
        };
        let result = self.row_result(idx);
        if !self.with_replacement {
            self.remove_rows(&[idx]);
        }
        Ok(result)
    }

    fn get_random_data(&mut self, n: usize, noisy: bool) -> PoolResult<Observations> {
        self.require_noisy(noisy, "get_random_data")?;
        self.sample(n, None, None)
    }

    fn get_random_data_in_box(
        &mut self,
        n: usize,
        lower: &Bound,
        width: &Bound,
        noisy: bool,
    ) -> PoolResult<Observations> {
        self.require_noisy(noisy, "get_random_data_in_box")?;
        let region = BoxRegion::new(lower, width, self.dimension())?;
        self.sample(n, Some(&region), None)
    }

    fn get_random_constrained_data(
        &mut self,
        n: usize,
        noisy: bool,
        constraint_lower: &Bound,
        constraint_upper: &Bound,
    ) -> PoolResult<Observations> {
        self.require_noisy(noisy, "get_random_constrained_data")?;
        let constraint = SafetyConstraint::new(constraint_lower, constraint_upper, self.safety_dimension())?;
        self.sample(n, None, Some(&constraint))
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
        self.require_noisy(noisy, "get_random_constrained_data_in_box")?;
        let region = BoxRegion::new(lower, width, self.dimension())?;
        let constraint = SafetyConstraint::new(constraint_lower, constraint_upper, self.safety_dimension())?;
        self.sample(n, Some(&region), Some(&constraint))
    }

    /// Rows are addressed by their current position; nothing is removed.
    fn get_data_from_idx(&mut self, indices: &[usize], noisy: bool) -> PoolResult<Observations> {
        self.require_noisy(noisy, "get_data_from_idx")?;
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(PoolError::IndexOutOfRange {
                index: bad,
                len: self.len(),
            });
        }
        Observations::new(
            self.x.select(Axis(0), indices),
            self.y.select(Axis(0), indices),
            self.z.select(Axis(0), indices),
        )
    }

    fn possible_queries(&self) -> PoolResult<Array2<f64>> {
        Ok(self.x.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn grid_dataset() -> DatasetPool {
        // 4x4 grid on [0, 1.5]^2, y = x0 + x1, z = [x0, -x1]
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut z = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                let (a, b) = (i as f64 * 0.5, j as f64 * 0.5);
                x.extend([a, b]);
                y.push(a + b);
                z.extend([a, -b]);
            }
        }
        DatasetPool::new(
            "grid",
            Array2::from_shape_vec((16, 2), x).unwrap(),
            Array2::from_shape_vec((16, 1), y).unwrap(),
            Array2::from_shape_vec((16, 2), z).unwrap(),
            42,
        )
        .unwrap()
    }

    #[test]
    fn noiseless_requests_are_unsupported() {
        let mut pool = grid_dataset();
        let err = pool.get_random_data(2, false).unwrap_err();
        assert!(matches!(err, PoolError::Unsupported { .. }));
        assert!(err.is_capability_absence());
        assert!(pool.query(array![0.0, 0.0].view(), false).is_err());
        assert_eq!(pool.len(), 16);
    }

    #[test]
    fn query_returns_recorded_row_and_consumes_it() {
        let mut pool = grid_dataset();
        let result = pool.query(array![0.5, 1.0].view(), true).unwrap();
        assert_eq!(result.value, 1.5);
        assert_eq!(result.safety, array![0.5, -1.0]);
        assert_eq!(pool.len(), 15);
        assert!(matches!(
            pool.query(array![0.5, 1.0].view(), true),
            Err(PoolError::PointNotInPool)
        ));
    }

    #[test]
    fn nonexistent_query_uses_nearest_row() {
        let mut pool = grid_dataset();
        pool.set_query_nonexistent(true);
        pool.set_replacement(true);
        let result = pool.query(array![0.9, 0.1].view(), true).unwrap();
        assert_eq!(result.value, 1.0);
        assert_eq!(pool.len(), 16);
    }

    #[test]
    fn query_checks_dimension() {
        let mut pool = grid_dataset();
        assert!(matches!(
            pool.query(array![0.5].view(), true),
            Err(PoolError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn sampling_without_replacement_exhausts_rows() {
        let mut pool = grid_dataset();
        let data = pool.get_random_data(10, true).unwrap();
        assert_eq!(data.len(), 10);
        assert_eq!(pool.len(), 6);
        assert!(matches!(
            pool.get_random_data(7, true),
            Err(PoolError::InsufficientData { requested: 7, available: 6 })
        ));
    }

    #[test]
    fn sampled_rows_stay_paired() {
        let mut pool = grid_dataset();
        let data = pool.get_random_data(8, true).unwrap();
        for i in 0..data.len() {
            let (a, b) = (data.x[[i, 0]], data.x[[i, 1]]);
            assert_eq!(data.y[[i, 0]], a + b);
            assert_eq!(data.z.row(i), array![a, -b]);
        }
    }

    #[test]
    fn replacement_flag_applies_to_later_calls() {
        let mut pool = grid_dataset();
        pool.set_replacement(true);
        let data = pool.get_random_data(40, true).unwrap();
        assert_eq!(data.len(), 40);
        assert_eq!(pool.len(), 16);
        pool.set_replacement(false);
        pool.get_random_data(1, true).unwrap();
        assert_eq!(pool.len(), 15);
    }

    #[test]
    fn box_filter() {
        let mut pool = grid_dataset();
        let data = pool
            .get_random_data_in_box(4, &Bound::from([0.0, 0.0]), &Bound::from([0.5, 0.5]), true)
            .unwrap();
        for row in data.x.outer_iter() {
            assert!(row.iter().all(|v| (0.0..=0.5).contains(v)));
        }
        assert!(pool
            .get_random_data_in_box(1, &Bound::from(0.0), &Bound::from(0.5), true)
            .is_err());
    }

    #[test]
    fn constraint_filter() {
        let mut pool = grid_dataset();
        let data = pool
            .get_random_constrained_data(4, true, &Bound::from(-0.5), &Bound::from([1.0, 0.0]))
            .unwrap();
        for z in data.z.outer_iter() {
            assert!(z[0] <= 1.0 && z[1] >= -0.5);
        }
    }

    #[test]
    fn constrained_box_filter() {
        let mut pool = grid_dataset();
        let data = pool
            .get_random_constrained_data_in_box(
                2,
                &Bound::from(1.0),
                &Bound::from(0.5),
                true,
                &Bound::from(-1.0),
                &Bound::from(2.0),
            )
            .unwrap();
        for (x, z) in data.x.outer_iter().zip(data.z.outer_iter()) {
            assert!(x.iter().all(|v| (1.0..=1.5).contains(v)));
            assert!(z[1] >= -1.0);
        }
    }

    #[test]
    fn data_from_idx_does_not_consume() {
        let mut pool = grid_dataset();
        let data = pool.get_data_from_idx(&[0, 5], true).unwrap();
        assert_eq!(data.x, array![[0.0, 0.0], [0.5, 0.5]]);
        assert_eq!(pool.len(), 16);
        assert!(matches!(
            pool.get_data_from_idx(&[16], true),
            Err(PoolError::IndexOutOfRange { index: 16, len: 16 })
        ));
    }

    #[test]
    fn dataset_has_no_optional_capabilities() {
        let pool = grid_dataset();
        assert!(pool.max_finder().is_none());
        assert!(pool.context().is_none());
        assert_eq!(pool.possible_queries().unwrap().nrows(), 16);
    }

    fn table_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn from_config_selects_columns() {
        let x = table_file("0.1 9.0 0.2\n0.3 9.0 0.4\n");
        let y = table_file("1.0 10.0\n2.0 20.0\n");
        let z = table_file("0.5 0.6\n0.7 0.8\n");
        let config = DatasetPoolConfig::new("engine", x.path(), y.path(), z.path())
            .with_columns(vec![0, 2], 1, vec![1]);
        let mut pool = DatasetPool::from_config(&config).unwrap();
        assert_eq!(pool.dimension(), 2);
        assert_eq!(pool.safety_dimension(), 1);
        let result = pool.query(array![0.3, 0.4].view(), true).unwrap();
        assert_eq!(result.value, 20.0);
        assert_eq!(result.safety, array![0.8]);
    }

    #[test]
    fn from_config_rejects_unknown_columns() {
        let x = table_file("0.1 0.2\n");
        let y = table_file("1.0\n");
        let z = table_file("0.5\n");
        let config = DatasetPoolConfig::new("engine", x.path(), y.path(), z.path())
            .with_columns(vec![0, 3], 0, Vec::new());
        assert!(matches!(
            DatasetPool::from_config(&config),
            Err(PoolError::InvalidConfiguration { .. })
        ));
    }
}
