//! Lloyd's k-means with k-means++ seeding and parallel restarts.
//!
//! Each restart owns an `StdRng` seeded with `seed + restart`, so a fixed
//! seed gives the same result regardless of how rayon schedules the work.
//! The restart with the lowest inertia wins; ties go to the lower restart.

use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use tracing::debug;

use crate::error::InputError;

/// Tuning knobs for [`fit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
    /// Number of clusters, `1..=points.len()`.
    pub k: usize,
    /// Independent seeded initializations.
    pub restarts: usize,
    /// Lloyd iterations per restart.
    pub max_iterations: usize,
    /// Stop once the summed squared centroid shift drops to this value.
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            k: 2,
            restarts: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

/// Outcome of the best restart.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub centroids: Vec<Vec<f64>>,
    /// Cluster label per input point, in `0..k`.
    pub labels: Vec<usize>,
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,
    pub iterations: usize,
    /// Index of the restart that produced this fit.
    pub restart: usize,
}

/// Clusters `points` into `params.k` groups.
///
/// # Errors
///
/// Returns an `InputError` if `points` is empty, rows differ in width,
/// `k` is 0 or exceeds the number of points, or `restarts` is 0.
pub fn fit(points: &[Vec<f64>], params: &KMeansParams) -> Result<KMeansFit, InputError> {
    if points.is_empty() {
        return Err(InputError::EmptyInput("k-means points"));
    }
    let width = points[0].len();
    if points.iter().any(|p| p.len() != width) {
        return Err(InputError::InvalidParameter {
            name: "points",
            message: "all rows must have the same number of features".to_string(),
        });
    }
    if params.k == 0 || params.k > points.len() {
        return Err(InputError::InvalidParameter {
            name: "k",
            message: format!("must be in 1..={}, got {}", points.len(), params.k),
        });
    }
    if params.restarts == 0 {
        return Err(InputError::InvalidParameter {
            name: "restarts",
            message: "must be at least 1".to_string(),
        });
    }

    let runs: Vec<KMeansFit> = (0..params.restarts)
        .into_par_iter()
        .map(|restart| run_once(points, params, restart))
        .collect();

    let best = runs
        .into_iter()
        .reduce(|best, cand| if cand.inertia < best.inertia { cand } else { best })
        .ok_or(InputError::EmptyInput("k-means restarts"))?;

    debug!(
        k = params.k,
        inertia = best.inertia,
        restart = best.restart,
        iterations = best.iterations,
        "k-means fit"
    );
    Ok(best)
}

/// Number of distinct rows in `points`, compared bit-for-bit.
pub fn distinct_count(points: &[Vec<f64>]) -> usize {
    // `+ 0.0` folds -0.0 into 0.0
    let mut keys: Vec<Vec<u64>> = points
        .iter()
        .map(|p| p.iter().map(|v| (v + 0.0).to_bits()).collect())
        .collect();
    keys.sort_unstable();
    keys.dedup();
    keys.len()
}

pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn run_once(points: &[Vec<f64>], params: &KMeansParams, restart: usize) -> KMeansFit {
    let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(restart as u64));
    let mut centroids = plus_plus_init(points, params.k, &mut rng);
    let mut labels = vec![0usize; points.len()];
    let mut iterations = 0;

    for _ in 0..params.max_iterations.max(1) {
        iterations += 1;
        assign(points, &centroids, &mut labels);
        let next = update(points, &centroids, &labels);
        let shift: f64 = centroids
            .iter()
            .zip(&next)
            .map(|(a, b)| squared_distance(a, b))
            .sum();
        centroids = next;
        if shift <= params.tolerance {
            break;
        }
    }

    assign(points, &centroids, &mut labels);
    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &l)| squared_distance(p, &centroids[l]))
        .sum();

    KMeansFit {
        centroids,
        labels,
        inertia,
        iterations,
        restart,
    }
}

/// k-means++ seeding: each new centre is drawn with probability
/// proportional to its squared distance from the nearest chosen centre.
fn plus_plus_init(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut centers = Vec::with_capacity(k);
    centers.push(points[rng.random_range(0..n)].clone());
    let mut d2: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centers[0]))
        .collect();

    while centers.len() < k {
        let total: f64 = d2.iter().sum();
        let idx = if total > 0.0 {
            weighted_index(&d2, rng.random::<f64>() * total)
        } else {
            rng.random_range(0..n)
        };
        let chosen = points[idx].clone();
        for (d, p) in d2.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &chosen));
        }
        centers.push(chosen);
    }
    centers
}

fn weighted_index(weights: &[f64], mut draw: f64) -> usize {
    for (i, w) in weights.iter().enumerate() {
        if draw < *w {
            return i;
        }
        draw -= w;
    }
    // rounding left the draw past the end
    weights.iter().rposition(|w| *w > 0.0).unwrap_or(0)
}

/// Nearest-centroid assignment; ties go to the lower cluster index.
fn assign(points: &[Vec<f64>], centroids: &[Vec<f64>], labels: &mut [usize]) {
    for (p, label) in points.iter().zip(labels.iter_mut()) {
        let mut best = 0;
        let mut best_d = f64::INFINITY;
        for (j, c) in centroids.iter().enumerate() {
            let d = squared_distance(p, c);
            if d < best_d {
                best_d = d;
                best = j;
            }
        }
        *label = best;
    }
}

/// Recomputes centroids as member means. An empty cluster is re-seeded with
/// the point farthest from its current centroid.
fn update(points: &[Vec<f64>], centroids: &[Vec<f64>], labels: &[usize]) -> Vec<Vec<f64>> {
    let k = centroids.len();
    let width = centroids.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; width]; k];
    let mut counts = vec![0usize; k];

    for (p, &l) in points.iter().zip(labels) {
        counts[l] += 1;
        for (s, v) in sums[l].iter_mut().zip(p) {
            *s += v;
        }
    }

    let mut taken = vec![false; points.len()];
    for j in 0..k {
        if counts[j] > 0 {
            let c = counts[j] as f64;
            for s in &mut sums[j] {
                *s /= c;
            }
            continue;
        }
        let far = points
            .iter()
            .zip(labels)
            .enumerate()
            .filter(|(i, _)| !taken[*i])
            .map(|(i, (p, &l))| (i, squared_distance(p, &centroids[l])))
            .fold(None, |acc: Option<(usize, f64)>, (i, d)| match acc {
                Some((_, best)) if best >= d => acc,
                _ => Some((i, d)),
            });
        match far {
            Some((i, _)) => {
                taken[i] = true;
                sums[j] = points[i].clone();
            }
            None => sums[j] = centroids[j].clone(),
        }
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.0],
            vec![10.0, 10.1],
        ]
    }

    fn params(k: usize) -> KMeansParams {
        KMeansParams {
            k,
            ..KMeansParams::default()
        }
    }

    #[test]
    fn separates_two_blobs() {
        let labels = fit(&blobs(), &params(2)).unwrap().labels;
        assert_eq!(labels.len(), 6);
        assert!(labels[..3].iter().all(|l| *l == labels[0]));
        assert!(labels[3..].iter().all(|l| *l == labels[3]));
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn same_seed_is_idempotent() {
        let a = fit(&blobs(), &params(3)).unwrap();
        let b = fit(&blobs(), &params(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn k_equal_to_distinct_points_has_zero_inertia() {
        let points = vec![vec![1.0], vec![5.0], vec![9.0]];
        assert_eq!(fit(&points, &params(3)).unwrap().inertia, 0.0);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(matches!(
            fit(&blobs(), &params(7)),
            Err(InputError::InvalidParameter { name: "k", .. })
        ));
        assert!(matches!(
            fit(&blobs(), &params(0)),
            Err(InputError::InvalidParameter { name: "k", .. })
        ));
        assert!(matches!(fit(&[], &params(1)), Err(InputError::EmptyInput(_))));
        let zero_restarts = KMeansParams {
            restarts: 0,
            ..params(2)
        };
        assert!(fit(&blobs(), &zero_restarts).is_err());
    }

    #[test]
    fn distinct_count_ignores_duplicates_and_signed_zero() {
        let points = vec![vec![0.0, 1.0], vec![-0.0, 1.0], vec![2.0, 1.0]];
        assert_eq!(distinct_count(&points), 2);
    }

    #[test]
    fn weighted_index_skips_zero_weights() {
        assert_eq!(weighted_index(&[0.0, 2.0, 0.0], 1.5), 1);
        assert_eq!(weighted_index(&[1.0, 2.0, 0.0], 3.0), 1);
    }
}
