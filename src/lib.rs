//! EV charging infrastructure planner.
//!
//! Finds demand hotspots without a nearby charger, recommends where to
//! build, groups existing stations, and reshapes the daily charging load to
//! lower its peak.

/// REST API over a finished planning report.
#[cfg(feature = "api")]
pub mod api;
pub mod cluster;
pub mod config;
/// Input records, CSV tables, and data sources.
pub mod data;
pub mod error;
/// Geographic points, distances, and radius queries.
pub mod geo;
/// CSV and JSON export.
pub mod io;
pub mod load;
pub mod report;
pub mod runner;
/// Coverage gaps and site recommendation.
pub mod siting;
