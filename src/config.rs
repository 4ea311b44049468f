//! TOML-based planning configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cluster::ClustererParams;
use crate::data::{CsvSource, Source, SyntheticCatalog, SyntheticSource};
use crate::geo::IndexMode;
use crate::load::ScheduleStrategy;
use crate::siting::PlacementParams;

/// Top-level planning configuration parsed from TOML.
///
/// All fields have defaults matching the baseline preset. Load from TOML
/// with [`PlannerConfig::from_toml_file`] or use [`PlannerConfig::baseline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerConfig {
    /// Coverage radius and spatial index.
    #[serde(default)]
    pub coverage: CoverageConfig,
    /// New-site recommendation.
    #[serde(default)]
    pub placement: PlacementConfig,
    /// k-means grouping of existing stations.
    #[serde(default)]
    pub clustering: ClusteringConfig,
    /// DBSCAN grouping of existing stations.
    #[serde(default)]
    pub density: DensityConfig,
    /// Load rescheduling.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Where input records come from.
    #[serde(default)]
    pub data: DataConfig,
}

/// Coverage radius and spatial index parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverageConfig {
    /// Distance within which a station serves a demand point (km, >= 0).
    pub radius_km: f64,
    /// `"auto"`, `"brute_force"` or `"rtree"`.
    pub index: IndexMode,
    /// Station count above which `auto` builds an R-tree.
    pub brute_force_limit: usize,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            radius_km: 5.0,
            index: IndexMode::Auto,
            brute_force_limit: 2000,
        }
    }
}

/// Site recommendation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlacementConfig {
    /// Number of sites to recommend (must be > 0).
    pub sites: usize,
    /// Seeded k-means restarts (must be > 0).
    pub restarts: usize,
    pub max_iterations: usize,
    /// Convergence threshold on squared centroid movement.
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for PlacementConfig {
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

impl PlacementConfig {
    pub fn params(&self) -> PlacementParams {
        PlacementParams {
            sites: self.sites,
            restarts: self.restarts,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            seed: self.seed,
        }
    }
}

/// Station k-means parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusteringConfig {
    /// Smallest candidate cluster count.
    pub k_min: usize,
    /// Largest candidate cluster count.
    pub k_max: usize,
    pub restarts: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub seed: u64,
    /// Cluster on charger power as well as location.
    pub include_power: bool,
}

impl Default for ClusteringConfig {
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

impl ClusteringConfig {
    pub fn params(&self) -> ClustererParams {
        ClustererParams {
            k_min: self.k_min,
            k_max: self.k_max,
            restarts: self.restarts,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            seed: self.seed,
            include_power: self.include_power,
        }
    }
}

/// Station DBSCAN parameters (in standardized coordinate units).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DensityConfig {
    /// Neighbourhood radius (must be > 0).
    pub eps: f64,
    /// Neighbours, self included, that make a core point (must be > 0).
    pub min_samples: usize,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            eps: 0.5,
            min_samples: 3,
        }
    }
}

/// Load rescheduling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Share of any hour's load that may move, in (0, 1].
    pub shift_fraction: f64,
    /// `"linear_program"` or `"heuristic"`.
    pub strategy: ScheduleStrategy,
    /// LP solve-time ceiling (ms, must be > 0).
    pub solve_timeout_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            shift_fraction: 0.3,
            strategy: ScheduleStrategy::LinearProgram,
            solve_timeout_ms: 5000,
        }
    }
}

impl ScheduleConfig {
    pub fn solve_timeout(&self) -> Duration {
        Duration::from_millis(self.solve_timeout_ms)
    }
}

/// Kind of data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Synthetic,
    Csv,
}

/// Input data parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// `"synthetic"` or `"csv"`.
    pub source: SourceKind,
    /// Station table (csv source only).
    pub stations_csv: Option<PathBuf>,
    /// Demand hotspot table (csv source only).
    pub demand_csv: Option<PathBuf>,
    /// Charging session table (csv source only).
    pub usage_csv: Option<PathBuf>,
    /// Synthetic generator seed.
    pub seed: u64,
    /// Days of synthetic sessions (must be > 0).
    pub days: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Synthetic,
            stations_csv: None,
            demand_csv: None,
            usage_csv: None,
            seed: 42,
            days: 30,
        }
    }
}

impl DataConfig {
    /// Builds the configured data source.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the csv source is missing a path.
    pub fn build_source(&self, catalog: SyntheticCatalog) -> Result<Source, ConfigError> {
        match self.source {
            SourceKind::Synthetic => Ok(Source::Synthetic(SyntheticSource::new(
                catalog, self.seed, self.days,
            ))),
            SourceKind::Csv => {
                let path = |p: &Option<PathBuf>, field: &str| {
                    p.clone().ok_or_else(|| ConfigError {
                        field: format!("data.{field}"),
                        message: "required when data.source = \"csv\"".into(),
                    })
                };
                Ok(Source::Real(CsvSource {
                    stations_csv: path(&self.stations_csv, "stations_csv")?,
                    demand_csv: path(&self.demand_csv, "demand_csv")?,
                    usage_csv: path(&self.usage_csv, "usage_csv")?,
                }))
            }
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field} — {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"coverage.radius_km"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

impl PlannerConfig {
    /// Returns the baseline preset: 5 km coverage, 5 sites, 30% shift.
    pub fn baseline() -> Self {
        Self {
            coverage: CoverageConfig::default(),
            placement: PlacementConfig::default(),
            clustering: ClusteringConfig::default(),
            density: DensityConfig::default(),
            schedule: ScheduleConfig::default(),
            data: DataConfig::default(),
        }
    }

    /// Returns the dense-urban preset: 2 km walkable coverage, more sites.
    pub fn dense_urban() -> Self {
        Self {
            coverage: CoverageConfig {
                radius_km: 2.0,
                ..CoverageConfig::default()
            },
            placement: PlacementConfig {
                sites: 10,
                ..PlacementConfig::default()
            },
            density: DensityConfig {
                eps: 0.3,
                ..DensityConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the aggressive-shift preset: half of any hour may move.
    pub fn aggressive_shift() -> Self {
        Self {
            schedule: ScheduleConfig {
                shift_fraction: 0.5,
                ..ScheduleConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "dense_urban", "aggressive_shift"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "dense_urban" => Ok(Self::dense_urban()),
            "aggressive_shift" => Ok(Self::aggressive_shift()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let cov = &self.coverage;
        if !cov.radius_km.is_finite() || cov.radius_km < 0.0 {
            errors.push(ConfigError::new(
                "coverage.radius_km",
                "must be a finite value >= 0",
            ));
        }

        let pl = &self.placement;
        if pl.sites == 0 {
            errors.push(ConfigError::new("placement.sites", "must be > 0"));
        }
        if pl.restarts == 0 {
            errors.push(ConfigError::new("placement.restarts", "must be > 0"));
        }
        if pl.max_iterations == 0 {
            errors.push(ConfigError::new("placement.max_iterations", "must be > 0"));
        }
        if !pl.tolerance.is_finite() || pl.tolerance < 0.0 {
            errors.push(ConfigError::new("placement.tolerance", "must be a finite value >= 0"));
        }

        let cl = &self.clustering;
        if cl.k_min == 0 {
            errors.push(ConfigError::new("clustering.k_min", "must be > 0"));
        }
        if cl.k_min > cl.k_max {
            errors.push(ConfigError::new("clustering.k_min", "must be <= clustering.k_max"));
        }
        if cl.restarts == 0 {
            errors.push(ConfigError::new("clustering.restarts", "must be > 0"));
        }
        if cl.max_iterations == 0 {
            errors.push(ConfigError::new("clustering.max_iterations", "must be > 0"));
        }
        if !cl.tolerance.is_finite() || cl.tolerance < 0.0 {
            errors.push(ConfigError::new("clustering.tolerance", "must be a finite value >= 0"));
        }

        let de = &self.density;
        if !de.eps.is_finite() || de.eps <= 0.0 {
            errors.push(ConfigError::new("density.eps", "must be a finite value > 0"));
        }
        if de.min_samples == 0 {
            errors.push(ConfigError::new("density.min_samples", "must be > 0"));
        }

        let sc = &self.schedule;
        if sc.shift_fraction.is_nan() || sc.shift_fraction <= 0.0 || sc.shift_fraction > 1.0 {
            errors.push(ConfigError::new(
                "schedule.shift_fraction",
                format!("must be in (0, 1], got {}", sc.shift_fraction),
            ));
        }
        if sc.solve_timeout_ms == 0 {
            errors.push(ConfigError::new("schedule.solve_timeout_ms", "must be > 0"));
        }

        let da = &self.data;
        if da.days == 0 {
            errors.push(ConfigError::new("data.days", "must be > 0"));
        }
        if da.source == SourceKind::Csv {
            for (field, path) in [
                ("data.stations_csv", &da.stations_csv),
                ("data.demand_csv", &da.demand_csv),
                ("data.usage_csv", &da.usage_csv),
            ] {
                if path.is_none() {
                    errors.push(ConfigError::new(field, "required when data.source = \"csv\""));
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for name in PlannerConfig::PRESETS {
            let errors = PlannerConfig::from_preset(name).unwrap().validate();
            assert!(errors.is_empty(), "preset {name} should be valid: {errors:?}");
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = PlannerConfig::from_preset("nonexistent").unwrap_err();
        assert!(err.message.contains("unknown preset"));
    }

    #[test]
    fn presets_differ_where_documented() {
        assert_eq!(PlannerConfig::dense_urban().coverage.radius_km, 2.0);
        assert_eq!(PlannerConfig::dense_urban().placement.sites, 10);
        assert_eq!(PlannerConfig::aggressive_shift().schedule.shift_fraction, 0.5);
    }

    #[test]
    fn station_clustering_defaults_to_location_only() {
        let cl = PlannerConfig::baseline().clustering;
        assert!(!cl.include_power);
        assert_eq!((cl.k_min, cl.k_max), (2, 11));
    }

    #[test]
    fn baseline_scenario_file_matches_preset() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/baseline.toml");
        let cfg = PlannerConfig::from_toml_file(&path).unwrap();
        assert_eq!(cfg, PlannerConfig::baseline());
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[coverage]
radius_km = 3.5
index = "rtree"
brute_force_limit = 100

[placement]
sites = 8
seed = 7

[clustering]
k_min = 3
k_max = 6
include_power = true

[density]
eps = 0.4
min_samples = 4

[schedule]
shift_fraction = 0.4
strategy = "heuristic"
solve_timeout_ms = 250

[data]
source = "csv"
stations_csv = "data/stations.csv"
demand_csv = "data/demand.csv"
usage_csv = "data/usage.csv"
"#;
        let cfg = PlannerConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.coverage.index, IndexMode::RTree);
        assert_eq!(cfg.placement.sites, 8);
        assert_eq!(cfg.placement.restarts, 10);
        assert!(cfg.clustering.include_power);
        assert_eq!(cfg.schedule.strategy, ScheduleStrategy::Heuristic);
        assert_eq!(cfg.data.source, SourceKind::Csv);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = PlannerConfig::from_toml_str("[schedule]\nshift_fraction = 0.2\n").unwrap();
        assert_eq!(cfg.schedule.shift_fraction, 0.2);
        assert_eq!(cfg.coverage.radius_km, 5.0);
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[coverage]
radius_km = 5.0
bogus_field = true
"#;
        assert!(PlannerConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_reports_every_error() {
        let mut cfg = PlannerConfig::baseline();
        cfg.coverage.radius_km = -1.0;
        cfg.schedule.shift_fraction = 0.0;
        cfg.clustering.k_min = 9;
        cfg.clustering.k_max = 4;
        cfg.density.eps = 0.0;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "coverage.radius_km",
                "clustering.k_min",
                "density.eps",
                "schedule.shift_fraction",
            ]
        );
    }

    #[test]
    fn zero_radius_is_valid() {
        let mut cfg = PlannerConfig::baseline();
        cfg.coverage.radius_km = 0.0;
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn csv_source_requires_paths() {
        let mut cfg = PlannerConfig::baseline();
        cfg.data.source = SourceKind::Csv;
        cfg.data.demand_csv = Some(PathBuf::from("demand.csv"));
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "data.stations_csv"));
        assert!(errors.iter().any(|e| e.field == "data.usage_csv"));
        assert!(!errors.iter().any(|e| e.field == "data.demand_csv"));
        assert!(cfg.data.build_source(SyntheticCatalog::default()).is_err());
    }

    #[test]
    fn config_error_display() {
        let e = ConfigError::new("placement.sites", "must be > 0");
        assert_eq!(e.to_string(), "config error: placement.sites — must be > 0");
    }
}
