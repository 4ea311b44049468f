//! Planning report: every artifact of one pipeline run.

use std::fmt;

use serde::Serialize;

use crate::cluster::{DensityClustering, StationClustering};
use crate::error::{ConvergenceWarning, SolverIssue};
use crate::load::{LoadProfile, ScheduleResult};
use crate::siting::{GapSummary, Placement, RecommendedSite};

/// Results of one planning run, serializable to JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanningReport {
    /// Data source label (`"csv"` or `"synthetic"`).
    pub source: String,
    /// Number of existing stations analysed.
    pub station_count: usize,
    /// Coverage gap statistics.
    pub coverage: GapSummary,
    /// Ranked new-site recommendations.
    pub placement: Placement,
    /// k-means grouping of existing stations.
    pub clusters: StationClustering,
    /// DBSCAN grouping of existing stations.
    pub density: DensityClustering,
    /// Hour-of-day load profile.
    pub load_profile: LoadProfile,
    /// Original versus rescheduled load.
    pub schedule: ScheduleResult,
}

impl PlanningReport {
    pub fn sites(&self) -> &[RecommendedSite] {
        &self.placement.sites
    }

    /// Every non-fatal clustering warning raised during the run.
    pub fn warnings(&self) -> impl Iterator<Item = &ConvergenceWarning> {
        self.placement.warnings.iter().chain(&self.clusters.warnings)
    }

    pub fn solver_issue(&self) -> Option<&SolverIssue> {
        self.schedule.solver_issue.as_ref()
    }
}

impl fmt::Display for PlanningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cov = &self.coverage;
        let sched = &self.schedule;
        let profile = &self.load_profile;

        writeln!(f, "--- Planning Report ({}) ---", self.source)?;
        writeln!(f, "Stations:              {}", self.station_count)?;
        writeln!(
            f,
            "Coverage gaps:         {}/{} demand points within {:.1} km",
            cov.gap_points, cov.demand_points, cov.radius_km
        )?;
        writeln!(
            f,
            "Uncovered demand:      {} of {} ({:.1}%)",
            cov.gap_demand, cov.total_demand, cov.gap_demand_pct
        )?;
        writeln!(f, "Recommended sites:     {}", self.placement.sites.len())?;
        for (rank, site) in self.placement.sites.iter().enumerate() {
            writeln!(
                f,
                "  #{:<2} ({:.4}, {:.4})  priority {:.0}",
                rank + 1,
                site.latitude,
                site.longitude,
                site.priority_score
            )?;
        }
        writeln!(
            f,
            "Station clusters:      k={} (silhouette {:.3})",
            self.clusters.k, self.clusters.silhouette
        )?;
        writeln!(
            f,
            "Density clusters:      {} ({} noise)",
            self.density.cluster_count, self.density.noise_count
        )?;
        writeln!(
            f,
            "Peak hour:             {:02}:00 (peak/avg {:.2})",
            profile.peak_hour, profile.peak_to_avg_ratio
        )?;
        writeln!(f, "Off-peak hour:         {:02}:00", profile.off_peak_hour)?;
        writeln!(
            f,
            "Schedule:              {} peak {:.2} -> {:.2} ({:.1}% reduction)",
            sched.method, sched.original_peak, sched.optimized_peak, sched.peak_reduction_pct
        )?;
        if sched.unallocated_load > 0.0 {
            writeln!(f, "Unallocated load:      {:.2}", sched.unallocated_load)?;
        }
        if let Some(issue) = &sched.solver_issue {
            writeln!(f, "Solver:                {issue}")?;
        }
        write!(f, "Warnings:              {}", self.warnings().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LoadMeasure;
    use crate::geo::GeoPoint;
    use crate::load::ScheduleMethod;

    fn sample() -> PlanningReport {
        let loads = vec![1.0; 24];
        PlanningReport {
            source: "synthetic".to_string(),
            station_count: 3,
            coverage: GapSummary {
                radius_km: 5.0,
                demand_points: 4,
                gap_points: 1,
                total_demand: 20,
                gap_demand: 8,
                gap_demand_pct: 40.0,
            },
            placement: Placement {
                sites: vec![RecommendedSite {
                    latitude: 12.97,
                    longitude: 77.59,
                    priority_score: 8.0,
                }],
                warnings: vec![ConvergenceWarning::ReducedClusterCount {
                    requested: 5,
                    effective: 1,
                    distinct_points: 1,
                }],
            },
            clusters: StationClustering {
                k: 1,
                labels: vec![0, 0, 0],
                silhouette: 0.0,
                summaries: Vec::new(),
                elbow: Vec::new(),
                warnings: Vec::new(),
            },
            density: DensityClustering {
                eps: 0.5,
                min_samples: 3,
                labels: vec![0, 0, -1],
                cluster_count: 1,
                noise_count: 1,
                silhouette: 0.0,
                summaries: Vec::new(),
            },
            load_profile: LoadProfile::from_loads(&loads, LoadMeasure::Energy).unwrap(),
            schedule: ScheduleResult {
                original_load: loads.clone(),
                optimized_load: loads,
                original_peak: 1.0,
                optimized_peak: 1.0,
                peak_reduction_pct: 0.0,
                method: ScheduleMethod::Heuristic,
                shift_fraction: 0.3,
                unallocated_load: 0.0,
                solver_issue: Some(SolverIssue::Unavailable),
            },
        }
    }

    #[test]
    fn display_summarizes_each_stage() {
        let text = sample().to_string();
        assert!(text.starts_with("--- Planning Report (synthetic) ---"));
        assert!(text.contains("1/4 demand points within 5.0 km"));
        assert!(text.contains("#1  (12.9700, 77.5900)  priority 8"));
        assert!(text.contains("Heuristic (Peak Shaving)"));
        assert!(text.contains("no LP backend compiled in"));
        assert!(text.ends_with("Warnings:              1"));
    }

    #[test]
    fn json_exposes_artifact_fields() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["placement"]["sites"][0]["priority_score"], 8.0);
        assert_eq!(value["schedule"]["method"], "Heuristic (Peak Shaving)");
        assert_eq!(value["schedule"]["original_load"].as_array().map(Vec::len), Some(24));
        assert_eq!(value["density"]["labels"][2], -1);
        assert!(value["clusters"]["summaries"].is_array());
    }

    #[test]
    fn centroid_serializes_as_coordinates() {
        let value = serde_json::to_value(GeoPoint::new(1.5, 2.5)).unwrap();
        assert_eq!(value["latitude"], 1.5);
        assert_eq!(value["longitude"], 2.5);
    }
}
