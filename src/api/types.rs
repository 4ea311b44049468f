//! API response and query types.
//!
//! Site and schedule fields match the CSV export columns.

use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterSummary, ElbowPoint};
use crate::load::{ScheduleMethod, ScheduleResult};
use crate::report::PlanningReport;
use crate::siting::RecommendedSite;

/// One recommended site with its 1-based rank.
#[derive(Debug, Serialize)]
pub struct SiteRecord {
    pub rank: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub priority_score: f64,
}

impl SiteRecord {
    pub fn ranked(index: usize, site: &RecommendedSite) -> Self {
        Self {
            rank: index + 1,
            latitude: site.latitude,
            longitude: site.longitude,
            priority_score: site.priority_score,
        }
    }
}

/// Optional cap on the number of sites returned.
#[derive(Debug, Deserialize)]
pub struct SitesQuery {
    pub limit: Option<usize>,
}

/// k-means selection plus the DBSCAN variant.
#[derive(Debug, Serialize)]
pub struct ClustersResponse {
    pub k: usize,
    pub silhouette: f64,
    pub summaries: Vec<ClusterSummary>,
    pub elbow: Vec<ElbowPoint>,
    pub density: DensityResponse,
}

/// DBSCAN counts and per-cluster summaries.
#[derive(Debug, Serialize)]
pub struct DensityResponse {
    pub eps: f64,
    pub min_samples: usize,
    pub cluster_count: usize,
    pub noise_count: usize,
    pub summaries: Vec<ClusterSummary>,
}

impl From<&PlanningReport> for ClustersResponse {
    fn from(report: &PlanningReport) -> Self {
        let km = &report.clusters;
        let db = &report.density;
        Self {
            k: km.k,
            silhouette: km.silhouette,
            summaries: km.summaries.clone(),
            elbow: km.elbow.clone(),
            density: DensityResponse {
                eps: db.eps,
                min_samples: db.min_samples,
                cluster_count: db.cluster_count,
                noise_count: db.noise_count,
                summaries: db.summaries.clone(),
            },
        }
    }
}

/// Schedule comparison without the solver diagnostics.
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub original_load: Vec<f64>,
    pub optimized_load: Vec<f64>,
    pub original_peak: f64,
    pub optimized_peak: f64,
    pub peak_reduction_pct: f64,
    pub method: ScheduleMethod,
    pub unallocated_load: f64,
}

impl From<&ScheduleResult> for ScheduleResponse {
    fn from(s: &ScheduleResult) -> Self {
        Self {
            original_load: s.original_load.clone(),
            optimized_load: s.optimized_load.clone(),
            original_peak: s.original_peak,
            optimized_peak: s.optimized_peak,
            peak_reduction_pct: s.peak_reduction_pct,
            method: s.method,
            unallocated_load: s.unallocated_load,
        }
    }
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
