//! End-to-end planning pipeline: data source, engines, report.

use tracing::{debug, info, warn};

use crate::cluster::{Dbscan, DensityClustering, StationClusterer, StationClustering};
use crate::config::PlannerConfig;
use crate::data::{DataSource, Dataset, SyntheticCatalog};
use crate::error::PlannerError;
use crate::load::{LoadProfileAnalyzer, ScheduleOptimizer};
use crate::report::PlanningReport;
use crate::siting::{GapDetector, PlacementRecommender};

/// Loads the configured data source and runs every engine over it.
///
/// # Errors
///
/// Returns the first configuration violation, or any I/O, CSV or input
/// error raised while loading and analysing the data.
pub fn run_planning(config: &PlannerConfig) -> Result<PlanningReport, PlannerError> {
    if let Some(err) = config.validate().into_iter().next() {
        return Err(err.into());
    }
    let source = config.data.build_source(SyntheticCatalog::default())?;
    run_with_source(config, &source)
}

/// Runs the pipeline over an explicit data source.
///
/// # Errors
///
/// See [`run_planning`].
pub fn run_with_source(
    config: &PlannerConfig,
    source: &impl DataSource,
) -> Result<PlanningReport, PlannerError> {
    let dataset = source.load()?;
    plan(config, source.name(), &dataset)
}

/// Runs every engine over an already loaded dataset.
///
/// # Errors
///
/// Returns an `InputError` (wrapped) for invalid parameters or records.
pub fn plan(
    config: &PlannerConfig,
    source_name: &str,
    dataset: &Dataset,
) -> Result<PlanningReport, PlannerError> {
    let cov = &config.coverage;
    let detector =
        GapDetector::new(cov.radius_km)?.with_index(cov.index, cov.brute_force_limit);
    let gaps = detector.detect(&dataset.stations, &dataset.demand)?;
    debug!(gap_indices = ?gaps.gap_indices, "uncovered demand points");

    let placement =
        PlacementRecommender::new(config.placement.params())?.recommend(&gaps.gaps)?;

    let clusterer = StationClusterer::new(config.clustering.params())?;
    let dbscan = Dbscan::new(config.density.eps, config.density.min_samples)?;
    let (clusters, density) = if dataset.stations.is_empty() {
        warn!("no existing stations; skipping station clustering");
        (
            StationClustering::without_stations(clusterer.params().k_min),
            DensityClustering::without_stations(&dbscan),
        )
    } else {
        (
            clusterer.cluster(&dataset.stations)?,
            clusterer.cluster_density(&dataset.stations, &dbscan)?,
        )
    };

    let load_profile = LoadProfileAnalyzer.analyze(&dataset.usage, dataset.measure)?;
    let schedule = ScheduleOptimizer::new(config.schedule.shift_fraction)?
        .with_strategy(config.schedule.strategy)
        .with_solve_timeout(config.schedule.solve_timeout())
        .optimize_profile(&load_profile)?;

    info!(
        source = source_name,
        gaps = gaps.summary.gap_points,
        sites = placement.sites.len(),
        clusters = clusters.k,
        method = %schedule.method,
        "planning run complete"
    );

    Ok(PlanningReport {
        source: source_name.to_string(),
        station_count: dataset.stations.len(),
        coverage: gaps.summary,
        placement,
        clusters,
        density,
        load_profile,
        schedule,
    })
}
