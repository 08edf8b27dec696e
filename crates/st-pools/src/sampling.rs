//! Random-draw and row-lookup helpers shared by the concrete pools.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::seq::index;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use st_types::{BoxRegion, PoolError, PoolResult};

/// Random generator owned by every pool.
pub type PoolRng = ChaCha8Rng;

/// Rejection sampling gives up after this many draws per requested point.
pub(crate) const REJECTION_BUDGET_PER_POINT: usize = 1000;

/// Rows closer than this are considered the same point.
const MATCH_TOLERANCE: f64 = 1e-9;

pub fn seeded_rng(seed: u64) -> PoolRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Zero-mean Gaussian draw (Box-Muller transform).
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    // u1 in (0, 1] keeps ln finite
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Uniform point inside `region`.
pub fn uniform_in_box<R: Rng + ?Sized>(rng: &mut R, region: &BoxRegion) -> Array1<f64> {
    Array1::from_iter(
        region
            .lower
            .iter()
            .zip(region.upper.iter())
            .map(|(lo, hi)| if hi > lo { rng.gen_range(*lo..=*hi) } else { *lo }),
    )
}

/// Pick `n` positions out of `available`.
///
/// Without replacement every position appears at most once and `n` may not
/// exceed `available`.
pub fn choose_indices<R: Rng + ?Sized>(
    rng: &mut R,
    available: usize,
    n: usize,
    with_replacement: bool,
) -> PoolResult<Vec<usize>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    if available == 0 || (!with_replacement && n > available) {
        return Err(PoolError::InsufficientData {
            requested: n,
            available,
        });
    }
    if with_replacement {
        Ok((0..n).map(|_| rng.gen_range(0..available)).collect())
    } else {
        Ok(index::sample(rng, available, n).into_vec())
    }
}

/// Cartesian grid with `n_per_dim` evenly spaced values per dimension.
pub fn grid_points(region: &BoxRegion, n_per_dim: usize) -> Array2<f64> {
    let steps = n_per_dim.max(1);
    let axes: Vec<Vec<f64>> = region
        .lower
        .iter()
        .zip(region.upper.iter())
        .map(|(lo, hi)| {
            if steps == 1 || hi <= lo {
                vec![*lo]
            } else {
                (0..steps)
                    .map(|i| lo + (hi - lo) * i as f64 / (steps - 1) as f64)
                    .collect()
            }
        })
        .collect();

    // Cartesian product
    let mut rows: Vec<Vec<f64>> = vec![Vec::new()];
    for axis in &axes {
        let mut next = Vec::with_capacity(rows.len() * axis.len());
        for existing in &rows {
            for value in axis {
                let mut row = existing.clone();
                row.push(*value);
                next.push(row);
            }
        }
        rows = next;
    }

    let dimension = region.dimension();
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let n_rows = if dimension == 0 { 0 } else { flat.len() / dimension };
    Array2::from_shape_vec((n_rows, dimension), flat).unwrap_or_else(|_| Array2::zeros((0, dimension)))
}

/// Position of the row equal to `x`, if any.
pub fn find_row(rows: ArrayView2<'_, f64>, x: ArrayView1<'_, f64>) -> Option<usize> {
    if rows.ncols() != x.len() {
        return None;
    }
    rows.outer_iter().position(|row| {
        row.iter()
            .zip(x.iter())
            .all(|(a, b)| (a - b).abs() <= MATCH_TOLERANCE)
    })
}

/// Position of the row closest to `x` in Euclidean distance.
pub fn nearest_row(rows: ArrayView2<'_, f64>, x: ArrayView1<'_, f64>) -> Option<usize> {
    if rows.ncols() != x.len() {
        return None;
    }
    rows.outer_iter()
        .map(|row| {
            row.iter()
                .zip(x.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
        })
        .enumerate()
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}

/// Copy of `rows` without the positions in `removed`.
pub fn without_rows(rows: &Array2<f64>, removed: &[usize]) -> Array2<f64> {
    let keep: Vec<usize> = (0..rows.nrows()).filter(|i| !removed.contains(i)).collect();
    rows.select(Axis(0), &keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use st_types::Bound;

    #[test]
    fn gaussian_draws_have_expected_spread() {
        let mut rng = seeded_rng(3);
        let draws: Vec<f64> = (0..5000).map(|_| gaussian(&mut rng, 2.0)).collect();
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        let var = draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / draws.len() as f64;
        assert!(mean.abs() < 0.15, "mean = {mean}");
        assert!((var.sqrt() - 2.0).abs() < 0.15, "std = {}", var.sqrt());
    }

    #[test]
    fn zero_noise_is_exact() {
        let mut rng = seeded_rng(3);
        assert_eq!(gaussian(&mut rng, 0.0), 0.0);
    }

    #[test]
    fn uniform_draws_stay_in_box() {
        let mut rng = seeded_rng(11);
        let region = BoxRegion::new(&Bound::from([-1.0, 2.0]), &Bound::from([0.5, 0.0]), 2).unwrap();
        for _ in 0..200 {
            let x = uniform_in_box(&mut rng, &region);
            assert!(region.contains(x.view()));
            assert_eq!(x[1], 2.0);
        }
    }

    #[test]
    fn indices_without_replacement_are_unique() {
        let mut rng = seeded_rng(5);
        let mut picked = choose_indices(&mut rng, 10, 10, false).unwrap();
        picked.sort_unstable();
        assert_eq!(picked, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn too_many_indices_without_replacement_fail() {
        let mut rng = seeded_rng(5);
        match choose_indices(&mut rng, 3, 4, false) {
            Err(PoolError::InsufficientData { requested: 4, available: 3 }) => (),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(choose_indices(&mut rng, 3, 4, true).unwrap().len(), 4);
    }

    #[test]
    fn grid_covers_box_corners() {
        let region = BoxRegion::new(&Bound::from(0.0), &Bound::from(1.0), 2).unwrap();
        let grid = grid_points(&region, 3);
        assert_eq!(grid.dim(), (9, 2));
        assert_eq!(grid.row(0), array![0.0, 0.0]);
        assert_eq!(grid.row(8), array![1.0, 1.0]);
        assert_eq!(grid.row(4), array![0.5, 0.5]);
    }

    #[test]
    fn row_lookup() {
        let rows = array![[0.0, 0.0], [1.0, 2.0], [3.0, 3.0]];
        assert_eq!(find_row(rows.view(), array![1.0, 2.0].view()), Some(1));
        assert_eq!(find_row(rows.view(), array![1.0, 2.5].view()), None);
        assert_eq!(nearest_row(rows.view(), array![2.6, 2.9].view()), Some(2));
        assert_eq!(without_rows(&rows, &[0, 2]), array![[1.0, 2.0]]);
    }
}
