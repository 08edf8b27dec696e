//! # st-acquisition
//!
//! Acquisition scoring over the candidate sets exposed by SafeTL pools.
//!
//! An [`AcquisitionFunction`] ranks the rows of a pool's possible queries and
//! [`select_next`] picks the best-scoring row, ready to be passed back to
//! [`Pool::query`](st_pools::Pool::query).

mod random;

pub use random::RandomAcquisition;

use ndarray::{Array1, ArrayView2};
use tracing::debug;

use st_pools::Pool;
use st_types::{invalid_input, PoolError, PoolResult};

/// Scores candidate inputs; higher is better.
pub trait AcquisitionFunction: Send {
    /// One score per row of `candidates`.
    fn score(&mut self, candidates: ArrayView2<'_, f64>) -> Array1<f64>;

    /// Human-readable acquisition name.
    fn name(&self) -> &str;
}

/// Score every possible query of `pool` and return the best row.
///
/// Ties go to the earliest row. Pools without a finite candidate set report
/// their capability error unchanged.
pub fn select_next(
    pool: &dyn Pool,
    acquisition: &mut dyn AcquisitionFunction,
) -> PoolResult<Array1<f64>> {
    let candidates = pool.possible_queries()?;
    if candidates.nrows() == 0 {
        return Err(PoolError::InsufficientData {
            requested: 1,
            available: 0,
        });
    }

    let scores = acquisition.score(candidates.view());
    if scores.len() != candidates.nrows() {
        return Err(invalid_input!(
            "{} returned {} scores for {} candidates",
            acquisition.name(),
            scores.len(),
            candidates.nrows()
        ));
    }

    let mut best = 0;
    for (idx, score) in scores.iter().enumerate() {
        if *score > scores[best] {
            best = idx;
        }
    }
    debug!(
        "{} selected candidate {} of {} (score {:.4})",
        acquisition.name(),
        best,
        candidates.nrows(),
        scores[best]
    );
    Ok(candidates.row(best).to_owned())
}
