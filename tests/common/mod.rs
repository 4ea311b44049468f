//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use ev_planner::config::PlannerConfig;
use ev_planner::data::{
    DataSource, Dataset, DemandPoint, StationRecord, SyntheticCatalog, SyntheticSource,
};
use ev_planner::geo::GeoPoint;
use ev_planner::load::ScheduleStrategy;

/// One station in north Delhi.
pub fn scenario_a_stations() -> Vec<StationRecord> {
    vec![StationRecord::new("DL", GeoPoint::new(28.70, 77.10), 50.0)]
}

/// One covered demand point in Delhi and one uncovered in Bangalore.
pub fn scenario_a_demand() -> Vec<DemandPoint> {
    vec![
        DemandPoint::new(28.70, 77.10, 5),
        DemandPoint::new(12.97, 77.59, 8),
    ]
}

/// Flat 10 with hours 12-15 spiked to 30 (total 320).
pub fn spiked_load() -> Vec<f64> {
    let mut loads = vec![10.0; 24];
    for load in &mut loads[12..16] {
        *load = 30.0;
    }
    loads
}

/// A handful of irregular daily profiles for property checks.
pub fn sample_profiles() -> Vec<Vec<f64>> {
    let evening: Vec<f64> = (0..24)
        .map(|h| if (17..22).contains(&h) { 45.0 } else { 6.0 + h as f64 * 0.25 })
        .collect();
    let sawtooth: Vec<f64> = (0..24).map(|h| ((h * 7) % 11) as f64 * 3.0).collect();
    let mut single_spike = vec![2.0; 24];
    single_spike[8] = 90.0;
    let mut sparse = vec![0.0; 24];
    sparse[3] = 12.0;
    sparse[19] = 40.0;
    vec![spiked_load(), evening, sawtooth, single_spike, sparse, vec![5.0; 24]]
}

/// Baseline config with the heuristic schedule, for tests that should not
/// depend on the LP backend.
pub fn heuristic_config() -> PlannerConfig {
    let mut cfg = PlannerConfig::baseline();
    cfg.schedule.strategy = ScheduleStrategy::Heuristic;
    cfg
}

/// Synthetic dataset over the default city catalog.
pub fn synthetic_dataset(seed: u64) -> Dataset {
    SyntheticSource::new(SyntheticCatalog::default(), seed, 7).load().unwrap()
}
