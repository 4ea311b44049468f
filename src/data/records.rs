//! Typed input records consumed by the planning engines.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// An existing charging station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    /// Unique station identifier.
    pub station_id: String,
    /// Station coordinates.
    pub location: GeoPoint,
    /// Rated charger power (kW, >= 0).
    pub power_kw: f64,
    /// Network operator name.
    pub operator: String,
    /// Any further columns carried through untouched.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl StationRecord {
    pub fn new(station_id: impl Into<String>, location: GeoPoint, power_kw: f64) -> Self {
        Self {
            station_id: station_id.into(),
            location,
            power_kw,
            operator: String::from("Unknown"),
            attributes: BTreeMap::new(),
        }
    }
}

/// Kind of place a demand point represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DemandCategory {
    #[default]
    Residential,
    Commercial,
    Highway,
    Other,
}

impl DemandCategory {
    /// Parses a category label case-insensitively; unknown labels map to `Other`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "residential" => Self::Residential,
            "commercial" => Self::Commercial,
            "highway" | "highways" => Self::Highway,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for DemandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Residential => "Residential",
            Self::Commercial => "Commercial",
            Self::Highway => "Highway",
            Self::Other => "Other",
        };
        f.write_str(label)
    }
}

/// A location where charging demand is believed to exist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandPoint {
    pub location: GeoPoint,
    /// Relative demand intensity (> 0).
    pub demand_score: u32,
    pub category: DemandCategory,
}

impl DemandPoint {
    pub fn new(latitude: f64, longitude: f64, demand_score: u32) -> Self {
        Self {
            location: GeoPoint::new(latitude, longitude),
            demand_score,
            category: DemandCategory::default(),
        }
    }
}

/// What a usage record's `load` value measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMeasure {
    /// Energy delivered (kWh); each record contributes its energy.
    Energy,
    /// No energy column: each record counts as one session.
    SessionCount,
}

/// One charging session reduced to what the load profile needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Hour of day the session started, expected in `0..=23`.
    pub hour_of_day: i64,
    /// Energy (kWh) or `1.0` for session counting.
    pub load: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!(DemandCategory::parse("COMMERCIAL"), DemandCategory::Commercial);
        assert_eq!(DemandCategory::parse(" residential "), DemandCategory::Residential);
        assert_eq!(DemandCategory::parse("Highways"), DemandCategory::Highway);
        assert_eq!(DemandCategory::parse("airport"), DemandCategory::Other);
    }

    #[test]
    fn new_station_has_unknown_operator() {
        let s = StationRecord::new("S1", GeoPoint::new(1.0, 2.0), 22.0);
        assert_eq!(s.operator, "Unknown");
        assert!(s.attributes.is_empty());
    }
}
