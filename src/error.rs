//! Error and degradation taxonomy.
//!
//! Validation failures are returned as [`InputError`] and abort the call.
//! Algorithmic degradation never aborts: it is recorded as a
//! [`ConvergenceWarning`] or [`SolverIssue`] in the metadata of the result.

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

/// Malformed or insufficient input supplied to one of the engines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// One or more required columns are absent from a table.
    #[error("{table}: missing required fields: {}", .fields.join(", "))]
    MissingFields {
        /// Table name (e.g. `"stations"`).
        table: String,
        /// Every missing column, in the order they were required.
        fields: Vec<String>,
    },
    /// Latitude outside `[-90, 90]`.
    #[error("point {index}: latitude {value} outside [-90, 90]")]
    LatitudeOutOfRange { index: usize, value: f64 },
    /// Longitude outside `[-180, 180]`.
    #[error("point {index}: longitude {value} outside [-180, 180]")]
    LongitudeOutOfRange { index: usize, value: f64 },
    /// Coordinate is NaN or infinite.
    #[error("point {index}: coordinate is not finite")]
    NonFiniteCoordinate { index: usize },
    /// Coverage radius is negative or not finite.
    #[error("coverage radius must be a finite value >= 0 km, got {0}")]
    InvalidRadius(f64),
    /// Shift fraction outside `(0, 1]`.
    #[error("shift fraction must be in (0, 1], got {0}")]
    ShiftFractionOutOfRange(f64),
    /// Load profile does not have one entry per hour of day.
    #[error("load profile must have {expected} entries, got {actual}")]
    ProfileLength { expected: usize, actual: usize },
    /// Load value is negative or not finite.
    #[error("hour {hour}: load {value} must be finite and >= 0")]
    InvalidLoad { hour: usize, value: f64 },
    /// Hour-of-day outside `0..=23`.
    #[error("record {index}: hour_of_day {hour} outside 0..=23")]
    HourOutOfRange { index: usize, hour: i64 },
    /// A cell could not be parsed into the column's type.
    #[error("{table} row {row}: column `{column}` has invalid value \"{value}\"")]
    InvalidValue {
        table: String,
        row: usize,
        column: String,
        value: String,
    },
    /// An algorithm parameter is outside its domain.
    #[error("invalid parameter `{name}`: {message}")]
    InvalidParameter { name: &'static str, message: String },
    /// A collection that must be non-empty was empty.
    #[error("{0}: no records")]
    EmptyInput(&'static str),
}

/// Top-level error for pipeline runs that also touch files and config.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Clustering could not use the requested number of clusters.
///
/// Non-fatal: the engine reduced the cluster count and carried on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConvergenceWarning {
    /// Fewer distinct points than requested clusters.
    ReducedClusterCount {
        requested: usize,
        effective: usize,
        distinct_points: usize,
    },
}

/// Why the linear-program path was not used.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SolverIssue {
    /// Built without an LP backend.
    Unavailable,
    /// Backend returned a non-optimal status or an inconsistent solution.
    Failure(String),
    /// Backend exceeded the solve-time ceiling.
    TimedOut { limit_ms: u64 },
}

impl std::fmt::Display for SolverIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverIssue::Unavailable => write!(f, "no LP backend compiled in"),
            SolverIssue::Failure(msg) => write!(f, "solver failure: {msg}"),
            SolverIssue::TimedOut { limit_ms } => write!(f, "solver exceeded {limit_ms} ms"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_lists_every_column() {
        let err = InputError::MissingFields {
            table: "demand".to_string(),
            fields: vec!["latitude".to_string(), "demand_score".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "demand: missing required fields: latitude, demand_score"
        );
    }

    #[test]
    fn solver_issue_serializes_with_kind_tag() {
        let json = serde_json::to_string(&SolverIssue::TimedOut { limit_ms: 50 }).unwrap();
        assert_eq!(json, r#"{"kind":"timed_out","detail":{"limit_ms":50}}"#);
    }
}
