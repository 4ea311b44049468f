//! Exploratory grouping of existing stations.
//!
//! Two variants share the same feature pipeline (standardized latitude and
//! longitude, optionally power): k-means with the cluster count chosen by
//! silhouette score, and DBSCAN, which leaves isolated stations as noise.

use serde::Serialize;
use tracing::{info, warn};

use super::dbscan::{Dbscan, label_codes};
use super::kmeans::{self, KMeansParams, distinct_count};
use super::scale::StandardScaler;
use super::silhouette::silhouette_score;
use crate::data::StationRecord;
use crate::error::{ConvergenceWarning, InputError};
use crate::geo::GeoPoint;
use crate::geo::point::validate_points;

/// Settings for [`StationClusterer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClustererParams {
    /// Smallest candidate cluster count.
    pub k_min: usize,
    /// Largest candidate cluster count, further capped at `N - 1`.
    pub k_max: usize,
    pub restarts: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub seed: u64,
    /// Adds `power_kw` as a third k-means feature.
    pub include_power: bool,
}

impl Default for ClustererParams {
    fn default() -> Self {
        Self {
            k_min: 2,
            k_max: 11,
            restarts: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            seed: 42,
            include_power: false,
        }
    }
}

/// Per-cluster description handed to reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub cluster_id: usize,
    pub station_count: usize,
    /// Mean member coordinates.
    pub centroid: GeoPoint,
    pub avg_power_kw: f64,
}

/// Inertia and silhouette for one candidate cluster count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElbowPoint {
    pub k: usize,
    pub inertia: f64,
    pub silhouette: f64,
}

/// Result of the k-means variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationClustering {
    /// Selected cluster count.
    pub k: usize,
    /// Cluster label per station, in `0..k`.
    pub labels: Vec<usize>,
    pub silhouette: f64,
    pub summaries: Vec<ClusterSummary>,
    /// Every candidate that was evaluated, ascending by `k`.
    pub elbow: Vec<ElbowPoint>,
    pub warnings: Vec<ConvergenceWarning>,
}

/// Result of the density-based variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityClustering {
    pub eps: f64,
    pub min_samples: usize,
    /// Cluster label per station; `-1` marks noise.
    pub labels: Vec<i64>,
    pub cluster_count: usize,
    pub noise_count: usize,
    /// Silhouette over every station with noise scored as one more group;
    /// 0 with fewer than two clusters.
    pub silhouette: f64,
    pub summaries: Vec<ClusterSummary>,
}

impl StationClustering {
    /// Zero clusters for an empty station set, flagged with a warning.
    pub fn without_stations(requested: usize) -> Self {
        Self {
            k: 0,
            labels: Vec::new(),
            silhouette: 0.0,
            summaries: Vec::new(),
            elbow: Vec::new(),
            warnings: vec![ConvergenceWarning::ReducedClusterCount {
                requested,
                effective: 0,
                distinct_points: 0,
            }],
        }
    }
}

impl DensityClustering {
    pub fn without_stations(dbscan: &Dbscan) -> Self {
        Self {
            eps: dbscan.eps(),
            min_samples: dbscan.min_samples(),
            labels: Vec::new(),
            cluster_count: 0,
            noise_count: 0,
            silhouette: 0.0,
            summaries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StationClusterer {
    params: ClustererParams,
}

impl StationClusterer {
    /// # Errors
    ///
    /// Returns an `InputError` if `k_min` is 0, `k_min > k_max` or
    /// `restarts` is 0.
    pub fn new(params: ClustererParams) -> Result<Self, InputError> {
        if params.k_min == 0 || params.k_min > params.k_max {
            return Err(InputError::InvalidParameter {
                name: "k_min",
                message: format!(
                    "need 1 <= k_min <= k_max, got k_min = {}, k_max = {}",
                    params.k_min, params.k_max
                ),
            });
        }
        if params.restarts == 0 {
            return Err(InputError::InvalidParameter {
                name: "restarts",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &ClustererParams {
        &self.params
    }

    /// Clusters stations with k-means, picking the candidate count with the
    /// highest silhouette score (ties go to the smaller count).
    ///
    /// Candidates run from `k_min` to `min(k_max, N - 1, distinct stations)`.
    /// When that range is empty every station lands in one cluster and a
    /// [`ConvergenceWarning`] is attached.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` for an empty station list or invalid
    /// coordinates.
    pub fn cluster(&self, stations: &[StationRecord]) -> Result<StationClustering, InputError> {
        let features = self.features(stations, self.params.include_power)?;
        let n = features.len();
        let distinct = distinct_count(&features);
        let upper = self.params.k_max.min(n.saturating_sub(1)).min(distinct);

        if upper < self.params.k_min {
            let warning = ConvergenceWarning::ReducedClusterCount {
                requested: self.params.k_min,
                effective: 1,
                distinct_points: distinct,
            };
            warn!(stations = n, distinct, "too few stations to compare cluster counts");
            let labels = vec![0; n];
            return Ok(StationClustering {
                k: 1,
                summaries: summarize(stations, labels.iter().map(|l| Some(*l)), 1),
                labels,
                silhouette: 0.0,
                elbow: Vec::new(),
                warnings: vec![warning],
            });
        }

        let mut elbow = Vec::new();
        let mut best: Option<(kmeans::KMeansFit, f64)> = None;
        for k in self.params.k_min..=upper {
            let fit = kmeans::fit(
                &features,
                &KMeansParams {
                    k,
                    restarts: self.params.restarts,
                    max_iterations: self.params.max_iterations,
                    tolerance: self.params.tolerance,
                    seed: self.params.seed,
                },
            )?;
            let score = silhouette_score(&features, &fit.labels);
            elbow.push(ElbowPoint {
                k,
                inertia: fit.inertia,
                silhouette: score,
            });
            let better = best.as_ref().is_none_or(|(_, s)| score > *s);
            if better {
                best = Some((fit, score));
            }
        }

        let (fit, silhouette) = best.ok_or(InputError::EmptyInput("cluster candidates"))?;
        let k = fit.centroids.len();
        info!(k, silhouette, candidates = elbow.len(), "station k-means clustering");

        Ok(StationClustering {
            k,
            summaries: summarize(stations, fit.labels.iter().map(|l| Some(*l)), k),
            labels: fit.labels,
            silhouette,
            elbow,
            warnings: Vec::new(),
        })
    }

    /// Clusters stations with DBSCAN on standardized coordinates.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` for an empty station list or invalid
    /// coordinates.
    pub fn cluster_density(
        &self,
        stations: &[StationRecord],
        dbscan: &Dbscan,
    ) -> Result<DensityClustering, InputError> {
        let features = self.features(stations, false)?;
        let labels = dbscan.fit(&features);
        let cluster_count = labels.iter().flatten().max().map_or(0, |m| m + 1);
        let noise_count = labels.iter().filter(|l| l.is_none()).count();

        let silhouette = if cluster_count >= 2 {
            let grouped: Vec<usize> = labels.iter().map(|l| l.unwrap_or(cluster_count)).collect();
            silhouette_score(&features, &grouped)
        } else {
            0.0
        };

        info!(
            clusters = cluster_count,
            noise = noise_count,
            silhouette,
            "station density clustering"
        );

        Ok(DensityClustering {
            eps: dbscan.eps(),
            min_samples: dbscan.min_samples(),
            summaries: summarize(stations, labels.iter().copied(), cluster_count),
            labels: label_codes(&labels),
            cluster_count,
            noise_count,
            silhouette,
        })
    }

    fn features(
        &self,
        stations: &[StationRecord],
        include_power: bool,
    ) -> Result<Vec<Vec<f64>>, InputError> {
        if stations.is_empty() {
            return Err(InputError::EmptyInput("stations"));
        }
        let locations: Vec<GeoPoint> = stations.iter().map(|s| s.location).collect();
        validate_points(&locations)?;

        let raw: Vec<Vec<f64>> = stations
            .iter()
            .map(|s| {
                let mut row = vec![s.location.latitude, s.location.longitude];
                if include_power {
                    row.push(s.power_kw);
                }
                row
            })
            .collect();
        Ok(StandardScaler::fit_transform(&raw))
    }
}

/// Builds summaries for clusters `0..count`, skipping empty ones.
fn summarize(
    stations: &[StationRecord],
    labels: impl Iterator<Item = Option<usize>>,
    count: usize,
) -> Vec<ClusterSummary> {
    let mut lat = vec![0.0; count];
    let mut lon = vec![0.0; count];
    let mut power = vec![0.0; count];
    let mut members = vec![0usize; count];

    for (s, label) in stations.iter().zip(labels) {
        if let Some(c) = label.filter(|c| *c < count) {
            lat[c] += s.location.latitude;
            lon[c] += s.location.longitude;
            power[c] += s.power_kw;
            members[c] += 1;
        }
    }

    (0..count)
        .filter(|&c| members[c] > 0)
        .map(|c| {
            let m = members[c] as f64;
            ClusterSummary {
                cluster_id: c,
                station_count: members[c],
                centroid: GeoPoint::new(lat[c] / m, lon[c] / m),
                avg_power_kw: power[c] / m,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: &str, lat: f64, lon: f64, kw: f64) -> StationRecord {
        StationRecord::new(id, GeoPoint::new(lat, lon), kw)
    }

    fn two_cities() -> Vec<StationRecord> {
        vec![
            station("D1", 28.61, 77.20, 22.0),
            station("D2", 28.62, 77.21, 22.0),
            station("D3", 28.60, 77.19, 22.0),
            station("M1", 19.07, 72.87, 22.0),
            station("M2", 19.08, 72.88, 22.0),
            station("M3", 19.06, 72.86, 22.0),
        ]
    }

    fn clusterer(params: ClustererParams) -> StationClusterer {
        StationClusterer::new(params).unwrap()
    }

    #[test]
    fn picks_two_clusters_for_two_cities() {
        let result = clusterer(ClustererParams::default()).cluster(&two_cities()).unwrap();
        assert_eq!(result.k, 2);
        assert_eq!(result.summaries.len(), 2);
        assert!(result.summaries.iter().all(|s| s.station_count == 3));
        assert!(result.silhouette > 0.9);
        // candidates 2..=min(11, 5, 6)
        let ks: Vec<usize> = result.elbow.iter().map(|e| e.k).collect();
        assert_eq!(ks, vec![2, 3, 4, 5]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn default_candidates_stop_at_eleven() {
        let stations: Vec<StationRecord> = (0..20)
            .map(|i| station(&format!("S{i}"), 10.0 + i as f64, 70.0 + (i % 4) as f64, 22.0))
            .collect();
        let result = clusterer(ClustererParams::default()).cluster(&stations).unwrap();
        let ks: Vec<usize> = result.elbow.iter().map(|e| e.k).collect();
        assert_eq!(ks, (2..=11).collect::<Vec<_>>());
    }

    #[test]
    fn power_is_ignored_by_default() {
        // identical locations pairwise, very different power
        let stations = vec![
            station("A", 10.0, 10.0, 7.2),
            station("B", 10.0, 10.0, 350.0),
            station("C", 40.0, 40.0, 7.2),
            station("D", 40.0, 40.0, 350.0),
        ];
        let result = clusterer(ClustererParams::default()).cluster(&stations).unwrap();
        assert_eq!(result.k, 2);
        assert_eq!(result.labels[0], result.labels[1]);
        assert_eq!(result.labels[2], result.labels[3]);
        assert_ne!(result.labels[0], result.labels[2]);
    }

    #[test]
    fn summary_reports_raw_centroid_and_power() {
        let stations = vec![
            station("A", 10.0, 10.0, 50.0),
            station("B", 10.0, 10.2, 150.0),
            station("C", 40.0, 40.0, 7.2),
            station("D", 40.2, 40.0, 7.2),
        ];
        let result = clusterer(ClustererParams::default()).cluster(&stations).unwrap();
        let first = result
            .summaries
            .iter()
            .find(|s| s.station_count == 2 && s.avg_power_kw == 100.0)
            .unwrap();
        assert!((first.centroid.latitude - 10.0).abs() < 1e-9);
        assert!((first.centroid.longitude - 10.1).abs() < 1e-9);
    }

    #[test]
    fn two_stations_degrade_to_single_cluster() {
        let stations = vec![station("A", 1.0, 1.0, 7.2), station("B", 2.0, 2.0, 7.2)];
        let result = clusterer(ClustererParams::default()).cluster(&stations).unwrap();
        assert_eq!(result.k, 1);
        assert_eq!(result.labels, vec![0, 0]);
        assert_eq!(result.silhouette, 0.0);
        assert_eq!(
            result.warnings,
            vec![ConvergenceWarning::ReducedClusterCount {
                requested: 2,
                effective: 1,
                distinct_points: 2,
            }]
        );
    }

    #[test]
    fn empty_stations_is_an_error() {
        let result = clusterer(ClustererParams::default()).cluster(&[]);
        assert_eq!(result, Err(InputError::EmptyInput("stations")));
    }

    #[test]
    fn without_stations_has_no_clusters() {
        let result = StationClustering::without_stations(2);
        assert_eq!(result.k, 0);
        assert!(result.labels.is_empty());
        assert_eq!(result.warnings.len(), 1);
        let dbscan = Dbscan::new(0.5, 3).unwrap();
        let density = DensityClustering::without_stations(&dbscan);
        assert_eq!(density.cluster_count, 0);
        assert_eq!(density.eps, 0.5);
    }

    #[test]
    fn rejects_inverted_range() {
        let params = ClustererParams {
            k_min: 5,
            k_max: 3,
            ..ClustererParams::default()
        };
        assert!(StationClusterer::new(params).is_err());
    }

    #[test]
    fn density_marks_outlier_as_noise() {
        let stations = vec![
            station("A", 28.700, 77.100, 22.0),
            station("B", 28.701, 77.101, 22.0),
            station("C", 28.702, 77.100, 22.0),
            station("Z", 12.970, 77.590, 22.0),
        ];
        let dbscan = Dbscan::new(0.5, 3).unwrap();
        let result = clusterer(ClustererParams::default())
            .cluster_density(&stations, &dbscan)
            .unwrap();
        assert_eq!(result.labels, vec![0, 0, 0, -1]);
        assert_eq!(result.cluster_count, 1);
        assert_eq!(result.noise_count, 1);
        assert_eq!(result.silhouette, 0.0);
        assert_eq!(result.summaries.len(), 1);
        assert_eq!(result.summaries[0].station_count, 3);
    }

    #[test]
    fn density_silhouette_scores_noise_as_a_group() {
        let stations = vec![
            station("A1", 10.00, 10.00, 22.0),
            station("A2", 10.01, 10.00, 22.0),
            station("A3", 10.00, 10.01, 22.0),
            station("B1", 12.00, 12.00, 22.0),
            station("B2", 12.01, 12.00, 22.0),
            station("B3", 12.00, 12.01, 22.0),
            station("Z", 11.00, 11.00, 22.0),
        ];
        let dbscan = Dbscan::new(0.5, 3).unwrap();
        let result = clusterer(ClustererParams::default())
            .cluster_density(&stations, &dbscan)
            .unwrap();
        assert_eq!(result.labels, vec![0, 0, 0, 1, 1, 1, -1]);

        let raw: Vec<Vec<f64>> = stations
            .iter()
            .map(|s| vec![s.location.latitude, s.location.longitude])
            .collect();
        let scaled = StandardScaler::fit_transform(&raw);
        let expected = silhouette_score(&scaled, &[0, 0, 0, 1, 1, 1, 2]);
        assert!((result.silhouette - expected).abs() < 1e-12);
        // the singleton noise point scores 0 and pulls the mean down
        assert!(result.silhouette > 0.8 && result.silhouette < 0.9, "{}", result.silhouette);
    }
}
