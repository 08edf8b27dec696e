use ndarray::{Array1, ArrayView2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::AcquisitionFunction;

/// Uninformed baseline: every candidate gets a distinct score in `[0, 1)`.
///
/// Scores are a random permutation of `0..N` divided by `N`.
#[derive(Debug, Clone)]
pub struct RandomAcquisition {
    rng: ChaCha8Rng,
}

impl RandomAcquisition {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl AcquisitionFunction for RandomAcquisition {
    fn score(&mut self, candidates: ArrayView2<'_, f64>) -> Array1<f64> {
        let n = candidates.nrows();
        let mut ranks: Vec<usize> = (0..n).collect();
        ranks.shuffle(&mut self.rng);
        ranks.into_iter().map(|r| r as f64 / n as f64).collect()
    }

    fn name(&self) -> &str {
        "random"
    }
}
