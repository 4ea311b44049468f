//! Coverage gaps: demand points with no station inside the coverage radius.

use serde::Serialize;
use tracing::info;

use crate::data::{DemandPoint, StationRecord};
use crate::error::InputError;
use crate::geo::{GeoIndex, GeoPoint, IndexMode};

/// Default coverage radius (km).
pub const DEFAULT_RADIUS_KM: f64 = 5.0;
/// Default reference-set size above which `Auto` switches to the R-tree.
pub const DEFAULT_BRUTE_FORCE_LIMIT: usize = 2000;

/// Aggregate view of a gap analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapSummary {
    pub radius_km: f64,
    pub demand_points: usize,
    pub gap_points: usize,
    /// Sum of `demand_score` over all demand points.
    pub total_demand: u64,
    /// Sum of `demand_score` over gap points.
    pub gap_demand: u64,
    /// `gap_demand` as a percentage of `total_demand` (0 when there is none).
    pub gap_demand_pct: f64,
}

/// Output of [`GapDetector::detect`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapAnalysis {
    /// Uncovered demand points, in input order.
    pub gaps: Vec<DemandPoint>,
    /// Positions of `gaps` within the demand input.
    pub gap_indices: Vec<usize>,
    /// Stations within the radius of each demand point.
    pub coverage_counts: Vec<usize>,
    pub summary: GapSummary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapDetector {
    radius_km: f64,
    index_mode: IndexMode,
    brute_force_limit: usize,
}

impl GapDetector {
    /// Creates a detector with the given coverage radius.
    ///
    /// A radius of 0 counts a demand point as covered only by a station at
    /// identical coordinates.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidRadius` for a negative or non-finite radius.
    pub fn new(radius_km: f64) -> Result<Self, InputError> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(InputError::InvalidRadius(radius_km));
        }
        Ok(Self {
            radius_km,
            index_mode: IndexMode::Auto,
            brute_force_limit: DEFAULT_BRUTE_FORCE_LIMIT,
        })
    }

    /// Overrides the spatial index backend.
    pub fn with_index(mut self, mode: IndexMode, brute_force_limit: usize) -> Self {
        self.index_mode = mode;
        self.brute_force_limit = brute_force_limit;
        self
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Finds the demand points with zero stations within the radius.
    ///
    /// With no stations every demand point is a gap.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` if any station or demand coordinate is out of
    /// range.
    pub fn detect(
        &self,
        stations: &[StationRecord],
        demand: &[DemandPoint],
    ) -> Result<GapAnalysis, InputError> {
        let station_points: Vec<GeoPoint> = stations.iter().map(|s| s.location).collect();
        let demand_points: Vec<GeoPoint> = demand.iter().map(|d| d.location).collect();

        let index = GeoIndex::build(&station_points, self.index_mode, self.brute_force_limit)?;
        let coverage_counts = index.count_within(&demand_points, self.radius_km)?;

        let gap_indices: Vec<usize> = coverage_counts
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == 0)
            .map(|(i, _)| i)
            .collect();
        let gaps: Vec<DemandPoint> = gap_indices.iter().map(|&i| demand[i]).collect();

        let total_demand: u64 = demand.iter().map(|d| u64::from(d.demand_score)).sum();
        let gap_demand: u64 = gaps.iter().map(|d| u64::from(d.demand_score)).sum();
        let summary = GapSummary {
            radius_km: self.radius_km,
            demand_points: demand.len(),
            gap_points: gaps.len(),
            total_demand,
            gap_demand,
            gap_demand_pct: if total_demand > 0 {
                gap_demand as f64 / total_demand as f64 * 100.0
            } else {
                0.0
            },
        };

        info!(
            radius_km = self.radius_km,
            demand = demand.len(),
            gaps = gaps.len(),
            rtree = index.is_accelerated(),
            "gap detection"
        );

        Ok(GapAnalysis {
            gaps,
            gap_indices,
            coverage_counts,
            summary,
        })
    }
}

impl Default for GapDetector {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            index_mode: IndexMode::Auto,
            brute_force_limit: DEFAULT_BRUTE_FORCE_LIMIT,
        }
    }
}
