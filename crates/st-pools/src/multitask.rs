//! Multitask composition of single-output pools.
//!
//! [`MultitaskPool`] never modifies the data of its pools. Inputs handed out
//! by the active pool are decorated into the flattened multi-output layout
//! `[N, D + 1]`, whose last column is the task index; inputs coming back in
//! are stripped to the active pool's `D` columns.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use tracing::{debug, info};

use st_types::{
    invalid_config, Bound, Observations, OutputType, PoolError, PoolResult, QueryResult,
    TransferTaskConfig,
};

use crate::dataset_pool::DatasetPool;
use crate::pool::{ContextAware, MaxFinder, Pool};

/// Input accepted by [`augment_with_task_index`].
#[derive(Debug, Clone, Copy)]
pub enum TaskInput<'a> {
    /// Treated as a `[1, 1]` matrix.
    Scalar(f64),
    /// Treated as a single row.
    Row(ArrayView1<'a, f64>),
    Rows(ArrayView2<'a, f64>),
}

impl From<f64> for TaskInput<'_> {
    fn from(value: f64) -> Self {
        TaskInput::Scalar(value)
    }
}

impl<'a> From<ArrayView1<'a, f64>> for TaskInput<'a> {
    fn from(row: ArrayView1<'a, f64>) -> Self {
        TaskInput::Row(row)
    }
}

impl<'a> From<ArrayView2<'a, f64>> for TaskInput<'a> {
    fn from(rows: ArrayView2<'a, f64>) -> Self {
        TaskInput::Rows(rows)
    }
}

impl<'a> From<&'a Array1<f64>> for TaskInput<'a> {
    fn from(row: &'a Array1<f64>) -> Self {
        TaskInput::Row(row.view())
    }
}

impl<'a> From<&'a Array2<f64>> for TaskInput<'a> {
    fn from(rows: &'a Array2<f64>) -> Self {
        TaskInput::Rows(rows.view())
    }
}

/// Keep the first `dimension` columns of `input` and append a column equal
/// to `task_index`, giving `[N, dimension + 1]`.
pub fn augment_with_task_index<'a>(
    input: impl Into<TaskInput<'a>>,
    dimension: usize,
    task_index: usize,
) -> PoolResult<Array2<f64>> {
    let rows: Array2<f64> = match input.into() {
        TaskInput::Scalar(value) => Array2::from_elem((1, 1), value),
        TaskInput::Row(row) => row.insert_axis(Axis(0)).to_owned(),
        TaskInput::Rows(rows) => rows.to_owned(),
    };
    if rows.ncols() < dimension {
        return Err(PoolError::InvalidInput {
            message: format!(
                "input has {} columns, task {} needs {}",
                rows.ncols(),
                task_index,
                dimension
            ),
        });
    }
    let n = rows.nrows();
    let mut augmented = Array2::from_elem((n, dimension + 1), task_index as f64);
    augmented
        .slice_mut(s![.., ..dimension])
        .assign(&rows.slice(s![.., ..dimension]));
    Ok(augmented)
}

/// Replace the inputs of `observations` with their augmented form.
fn augment_observations(
    observations: Observations,
    dimension: usize,
    task_index: usize,
) -> PoolResult<Observations> {
    let x = augment_with_task_index(&observations.x, dimension, task_index)?;
    Observations::new(x, observations.y, observations.z)
}

/// N single-output pools presented as one flattened multi-output pool.
///
/// Every operation is routed to the pool selected by the task mode, which
/// defaults to the last pool.
#[derive(Debug)]
pub struct MultitaskPool {
    pools: Vec<Box<dyn Pool>>,
    task_mode: usize,
    allow_query_nonexistent: bool,
    /// Region initial target data is drawn from, as `(lower, width)`.
    target_box: Option<(Bound, Bound)>,
}

impl MultitaskPool {
    pub fn new(pools: Vec<Box<dyn Pool>>) -> PoolResult<Self> {
        if pools.is_empty() {
            return Err(invalid_config!("a multitask pool needs at least one pool"));
        }
        if let Some((idx, pool)) = pools
            .iter()
            .enumerate()
            .find(|(_, p)| p.output_type() != OutputType::SingleOutput)
        {
            return Err(invalid_config!(
                "pool {} has output type {}, expected {}",
                idx,
                pool.output_type(),
                OutputType::SingleOutput
            ));
        }

        let task_mode = pools.len() - 1;
        info!("Created multitask pool with {} tasks", pools.len());
        Ok(Self {
            pools,
            task_mode,
            allow_query_nonexistent: false,
            target_box: None,
        })
    }

    /// One dataset pool per task, sources first and the target last.
    ///
    /// Task `i` is seeded with `config.seed + i`, replacing the seed of its
    /// dataset config.
    pub fn from_transfer_config(config: &TransferTaskConfig) -> PoolResult<Self> {
        config
            .validate()
            .map_err(|e| invalid_config!("transfer task {}: {}", config.name, e))?;
        let pools = config
            .tasks()
            .enumerate()
            .map(|(i, task)| {
                let task = task.clone().with_seed(config.seed.wrapping_add(i as u64));
                DatasetPool::from_config(&task).map(|p| Box::new(p) as Box<dyn Pool>)
            })
            .collect::<PoolResult<Vec<_>>>()?;
        let mut pool = Self::new(pools)?;
        if !config.target_box_lower.is_empty() {
            pool.target_box = Some((
                Bound::from(config.target_box_lower.clone()),
                Bound::from(config.target_box_width.clone()),
            ));
        }
        Ok(pool)
    }

    pub fn with_target_box(mut self, lower: impl Into<Bound>, width: impl Into<Bound>) -> Self {
        self.target_box = Some((lower.into(), width.into()));
        self
    }

    /// Switch to the target task (the last pool) and draw `n` noisy initial
    /// points, restricted to the target box when one is set.
    pub fn get_initial_target_data(&mut self, n: usize) -> PoolResult<Observations> {
        self.set_task_mode(self.pools.len() - 1)?;
        match self.target_box.clone() {
            Some((lower, width)) => self.get_random_data_in_box(n, &lower, &width, true),
            None => self.get_random_data(n, true),
        }
    }

    pub fn set_task_mode(&mut self, task_index: usize) -> PoolResult<()> {
        if task_index >= self.pools.len() {
            return Err(PoolError::IndexOutOfRange {
                index: task_index,
                len: self.pools.len(),
            });
        }
        debug!("Multitask pool: task mode {} -> {}", self.task_mode, task_index);
        self.task_mode = task_index;
        Ok(())
    }

    pub fn task_index(&self) -> usize {
        self.task_mode
    }

    /// Number of tasks, independent of the task mode.
    pub fn output_dimension(&self) -> usize {
        self.pools.len()
    }

    pub fn pools(&self) -> &[Box<dyn Pool>] {
        &self.pools
    }

    pub fn pool(&self, task_index: usize) -> Option<&dyn Pool> {
        self.pools.get(task_index).map(|p| p.as_ref())
    }

    fn active(&self) -> &dyn Pool {
        self.pools[self.task_mode].as_ref()
    }

    fn active_mut(&mut self) -> &mut dyn Pool {
        self.pools[self.task_mode].as_mut()
    }

    /// Run `operation` on the active pool and augment the inputs it returns.
    fn delegate_data<F>(&mut self, operation: F) -> PoolResult<Observations>
    where
        F: FnOnce(&mut dyn Pool) -> PoolResult<Observations>,
    {
        let task_index = self.task_mode;
        let pool = self.active_mut();
        let dimension = pool.dimension();
        let observations = operation(pool)?;
        augment_observations(observations, dimension, task_index)
    }

    pub fn get_max(&self) -> PoolResult<f64> {
        self.active()
            .max_finder()
            .ok_or_else(|| PoolError::capability("get_max"))?
            .get_max()
    }

    pub fn get_constrained_max(&self, constraint_lower: &Bound, constraint_upper: &Bound) -> PoolResult<f64> {
        self.active()
            .max_finder()
            .ok_or_else(|| PoolError::capability("get_constrained_max"))?
            .get_constrained_max(constraint_lower, constraint_upper)
    }

    pub fn get_context_status(&self, x: ArrayView2<'_, f64>) -> PoolResult<Array1<bool>> {
        let pool = self.active();
        let context = pool
            .context()
            .ok_or_else(|| PoolError::capability("get_context_status"))?;
        let dimension = pool.dimension().min(x.ncols());
        context.get_context_status(x.slice(s![.., ..dimension]))
    }
}

impl Pool for MultitaskPool {
    fn output_type(&self) -> OutputType {
        OutputType::MultiOutputFlattened
    }

    fn with_replacement(&self) -> bool {
        self.active().with_replacement()
    }

    /// Only the active pool changes.
    fn set_replacement(&mut self, with_replacement: bool) {
        self.active_mut().set_replacement(with_replacement);
    }

    fn query_nonexistent(&self) -> bool {
        self.allow_query_nonexistent
    }

    /// Every pool changes, not only the active one.
    fn set_query_nonexistent(&mut self, allow: bool) {
        self.allow_query_nonexistent = allow;
        for pool in &mut self.pools {
            pool.set_query_nonexistent(allow);
        }
    }

    /// The active pool's `D`; the task-index column is not counted.
    fn dimension(&self) -> usize {
        self.active().dimension()
    }

    fn variable_dimension(&self) -> usize {
        self.active().variable_dimension()
    }

    fn safety_dimension(&self) -> usize {
        self.active().safety_dimension()
    }

    /// The trailing task-index column is dropped without being checked
    /// against the task mode.
    fn query(&mut self, x: ArrayView1<'_, f64>, noisy: bool) -> PoolResult<QueryResult> {
        let task_index = self.task_mode;
        let pool = self.active_mut();
        let dimension = pool.dimension().min(x.len());
        if let Some(encoded) = x.get(pool.dimension()) {
            if *encoded != task_index as f64 {
                debug!(
                    "Query encodes task {} while task {} is active",
                    encoded, task_index
                );
            }
        }
        pool.query(x.slice(s![..dimension]), noisy)
    }

    fn batch_query(
        &mut self,
        x: ArrayView2<'_, f64>,
        noisy: bool,
    ) -> PoolResult<(Array2<f64>, Array2<f64>)> {
        let pool = self.active_mut();
        let dimension = pool.dimension().min(x.ncols());
        pool.batch_query(x.slice(s![.., ..dimension]), noisy)
    }

    fn get_random_data(&mut self, n: usize, noisy: bool) -> PoolResult<Observations> {
        self.delegate_data(|pool| pool.get_random_data(n, noisy))
    }

    fn get_random_data_in_box(
        &mut self,
        n: usize,
        lower: &Bound,
        width: &Bound,
        noisy: bool,
    ) -> PoolResult<Observations> {
        self.delegate_data(|pool| pool.get_random_data_in_box(n, lower, width, noisy))
    }

    fn get_random_constrained_data(
        &mut self,
        n: usize,
        noisy: bool,
        constraint_lower: &Bound,
        constraint_upper: &Bound,
    ) -> PoolResult<Observations> {
        self.delegate_data(|pool| {
            pool.get_random_constrained_data(n, noisy, constraint_lower, constraint_upper)
        })
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
        self.delegate_data(|pool| {
            pool.get_random_constrained_data_in_box(
                n,
                lower,
                width,
                noisy,
                constraint_lower,
                constraint_upper,
            )
        })
    }

    fn get_grid_data(&mut self, n_per_dim: usize, noisy: bool) -> PoolResult<Observations> {
        self.delegate_data(|pool| pool.get_grid_data(n_per_dim, noisy))
    }

    fn get_data_from_idx(&mut self, indices: &[usize], noisy: bool) -> PoolResult<Observations> {
        self.delegate_data(|pool| pool.get_data_from_idx(indices, noisy))
    }

    fn possible_queries(&self) -> PoolResult<Array2<f64>> {
        let pool = self.active();
        let candidates = pool.possible_queries()?;
        augment_with_task_index(&candidates, pool.dimension(), self.task_mode)
    }

    fn max_finder(&self) -> Option<&dyn MaxFinder> {
        self.active().max_finder()
    }

    fn context(&self) -> Option<&dyn ContextAware> {
        self.active().context()
    }
}
