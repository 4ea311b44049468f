//! Site recommendations from clustered coverage gaps.

use serde::Serialize;
use tracing::{info, warn};

use crate::cluster::kmeans::{self, KMeansParams, distinct_count};
use crate::data::DemandPoint;
use crate::error::{ConvergenceWarning, InputError};
use crate::geo::GeoPoint;
use crate::geo::point::validate_points;

/// Settings for [`PlacementRecommender`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementParams {
    /// Requested number of sites.
    pub sites: usize,
    /// Seeded k-means restarts; the lowest-inertia one is kept.
    pub restarts: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            sites: 5,
            restarts: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

/// A proposed new station location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecommendedSite {
    pub latitude: f64,
    pub longitude: f64,
    /// Summed `demand_score` of the gap points the site would serve.
    pub priority_score: f64,
}

/// Ranked sites plus any clustering degradation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    /// Descending by `priority_score`.
    pub sites: Vec<RecommendedSite>,
    pub warnings: Vec<ConvergenceWarning>,
}

#[derive(Debug, Clone)]
pub struct PlacementRecommender {
    params: PlacementParams,
}

impl PlacementRecommender {
    /// # Errors
    ///
    /// Returns an `InputError` if `restarts` is 0.
    pub fn new(params: PlacementParams) -> Result<Self, InputError> {
        if params.restarts == 0 {
            return Err(InputError::InvalidParameter {
                name: "restarts",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &PlacementParams {
        &self.params
    }

    /// Clusters `gaps` on raw latitude/longitude and proposes one site per
    /// cluster at the mean member coordinates.
    ///
    /// The effective cluster count is the requested count capped by the
    /// number of distinct gap locations; a cap below the request adds a
    /// [`ConvergenceWarning`]. No gaps (or zero requested sites) yields an
    /// empty list. Sites are sorted by priority, ties keeping the lower
    /// cluster index first.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` if a gap coordinate is out of range.
    pub fn recommend(&self, gaps: &[DemandPoint]) -> Result<Placement, InputError> {
        let locations: Vec<GeoPoint> = gaps.iter().map(|g| g.location).collect();
        validate_points(&locations)?;

        let requested = self.params.sites;
        if gaps.is_empty() || requested == 0 {
            return Ok(Placement {
                sites: Vec::new(),
                warnings: Vec::new(),
            });
        }

        let coords: Vec<Vec<f64>> = locations
            .iter()
            .map(|p| vec![p.latitude, p.longitude])
            .collect();
        let distinct = distinct_count(&coords);
        let k = requested.min(gaps.len()).min(distinct);

        let mut warnings = Vec::new();
        if k < requested {
            warn!(requested, effective = k, distinct, "fewer gap locations than sites requested");
            warnings.push(ConvergenceWarning::ReducedClusterCount {
                requested,
                effective: k,
                distinct_points: distinct,
            });
        }

        let fit = kmeans::fit(
            &coords,
            &KMeansParams {
                k,
                restarts: self.params.restarts,
                max_iterations: self.params.max_iterations,
                tolerance: self.params.tolerance,
                seed: self.params.seed,
            },
        )?;

        let mut lat = vec![0.0; k];
        let mut lon = vec![0.0; k];
        let mut score = vec![0.0; k];
        let mut members = vec![0usize; k];
        for (gap, &label) in gaps.iter().zip(&fit.labels) {
            lat[label] += gap.location.latitude;
            lon[label] += gap.location.longitude;
            score[label] += f64::from(gap.demand_score);
            members[label] += 1;
        }

        let mut sites: Vec<RecommendedSite> = (0..k)
            .filter(|&c| members[c] > 0)
            .map(|c| {
                let m = members[c] as f64;
                RecommendedSite {
                    latitude: lat[c] / m,
                    longitude: lon[c] / m,
                    priority_score: score[c],
                }
            })
            .collect();
        // stable: equal scores stay in cluster order
        sites.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));

        info!(gaps = gaps.len(), sites = sites.len(), "placement recommendation");
        Ok(Placement { sites, warnings })
    }
}
