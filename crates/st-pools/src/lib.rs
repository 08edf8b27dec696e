//! # st-pools
//!
//! Data pools for safe Bayesian optimization experiments.
//!
//! A pool answers point queries and hands out random, box-restricted,
//! safety-constrained or grid-shaped observation sets. [`OraclePool`] wraps
//! analytic oracles, [`DatasetPool`] serves recorded measurements and
//! [`MultitaskPool`] presents several single-output pools as one
//! multi-output pool whose inputs carry a task-index column.

mod dataset_pool;
mod loader;
mod multitask;
mod oracle_pool;
mod pool;
pub mod sampling;

pub use dataset_pool::DatasetPool;
pub use loader::{load_data, load_table, Tables};
pub use multitask::{augment_with_task_index, MultitaskPool, TaskInput};
pub use oracle_pool::OraclePool;
pub use pool::{ContextAware, MaxFinder, Pool};
