//! Density-based clustering (DBSCAN).
//!
//! A point with at least `min_samples` neighbours within `eps` (itself
//! included) is a core point. Clusters grow from core points through their
//! neighbourhoods; points reachable from no core point are noise.

use std::collections::VecDeque;

use rayon::prelude::*;

use super::kmeans::squared_distance;
use crate::error::InputError;

/// Label code used for noise when labels are flattened to integers.
pub const NOISE: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dbscan {
    eps: f64,
    min_samples: usize,
}

impl Dbscan {
    /// # Errors
    ///
    /// Returns an `InputError` unless `eps` is finite and positive and
    /// `min_samples` is at least 1.
    pub fn new(eps: f64, min_samples: usize) -> Result<Self, InputError> {
        if !eps.is_finite() || eps <= 0.0 {
            return Err(InputError::InvalidParameter {
                name: "eps",
                message: format!("must be finite and > 0, got {eps}"),
            });
        }
        if min_samples == 0 {
            return Err(InputError::InvalidParameter {
                name: "min_samples",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(Self { eps, min_samples })
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Labels every point with its cluster, or `None` for noise.
    ///
    /// Cluster ids are assigned in order of the lowest-index core point that
    /// starts each cluster.
    pub fn fit(&self, points: &[Vec<f64>]) -> Vec<Option<usize>> {
        let eps2 = self.eps * self.eps;
        let neighbours: Vec<Vec<usize>> = points
            .par_iter()
            .map(|p| {
                points
                    .iter()
                    .enumerate()
                    .filter(|(_, q)| squared_distance(p, q) <= eps2)
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();

        let n = points.len();
        let mut labels: Vec<Option<usize>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut next_cluster = 0;

        for i in 0..n {
            if visited[i] {
                continue;
            }
            visited[i] = true;
            if neighbours[i].len() < self.min_samples {
                continue;
            }

            let cluster = next_cluster;
            next_cluster += 1;
            labels[i] = Some(cluster);

            let mut frontier: VecDeque<usize> = neighbours[i].iter().copied().collect();
            while let Some(j) = frontier.pop_front() {
                if labels[j].is_none() {
                    labels[j] = Some(cluster);
                }
                if visited[j] {
                    continue;
                }
                visited[j] = true;
                if neighbours[j].len() >= self.min_samples {
                    frontier.extend(neighbours[j].iter().copied());
                }
            }
        }
        labels
    }
}

/// Flattens labels to integers with [`NOISE`] for unassigned points.
pub fn label_codes(labels: &[Option<usize>]) -> Vec<i64> {
    labels
        .iter()
        .map(|l| l.map_or(NOISE, |c| c as i64))
        .collect()
}
