use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use super::records::{DemandPoint, LoadMeasure, StationRecord, UsageRecord};
use super::synthetic::SyntheticSource;
use super::table::Table;
use crate::error::PlannerError;

/// Everything the planning pipeline consumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub stations: Vec<StationRecord>,
    pub demand: Vec<DemandPoint>,
    pub usage: Vec<UsageRecord>,
    pub measure: LoadMeasure,
}

/// A provider of station, demand and usage records.
pub trait DataSource {
    /// Short label used in logs and reports.
    fn name(&self) -> &'static str;

    fn load_stations(&self) -> Result<Vec<StationRecord>, PlannerError>;

    fn load_demand(&self) -> Result<Vec<DemandPoint>, PlannerError>;

    /// Loads session usage. Sources that synthesize usage derive it from
    /// `stations`.
    fn load_usage(
        &self,
        stations: &[StationRecord],
    ) -> Result<(Vec<UsageRecord>, LoadMeasure), PlannerError>;

    /// Loads all three tables.
    fn load(&self) -> Result<Dataset, PlannerError> {
        let stations = self.load_stations()?;
        let demand = self.load_demand()?;
        let (usage, measure) = self.load_usage(&stations)?;
        info!(
            source = self.name(),
            stations = stations.len(),
            demand = demand.len(),
            sessions = usage.len(),
            "loaded dataset"
        );
        Ok(Dataset {
            stations,
            demand,
            usage,
            measure,
        })
    }
}

/// Real datasets read from CSV files.
#[derive(Debug, Clone)]
pub struct CsvSource {
    pub stations_csv: PathBuf,
    pub demand_csv: PathBuf,
    pub usage_csv: PathBuf,
}

impl DataSource for CsvSource {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn load_stations(&self) -> Result<Vec<StationRecord>, PlannerError> {
        Ok(Table::from_path("stations", &self.stations_csv)?.stations()?)
    }

    fn load_demand(&self) -> Result<Vec<DemandPoint>, PlannerError> {
        Ok(Table::from_path("demand", &self.demand_csv)?.demand_points()?)
    }

    fn load_usage(
        &self,
        _stations: &[StationRecord],
    ) -> Result<(Vec<UsageRecord>, LoadMeasure), PlannerError> {
        Ok(Table::from_path("usage", &self.usage_csv)?.usage_records()?)
    }
}

impl DataSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn load_stations(&self) -> Result<Vec<StationRecord>, PlannerError> {
        Ok(self.stations())
    }

    fn load_demand(&self) -> Result<Vec<DemandPoint>, PlannerError> {
        Ok(self.demand_points())
    }

    fn load_usage(
        &self,
        stations: &[StationRecord],
    ) -> Result<(Vec<UsageRecord>, LoadMeasure), PlannerError> {
        Ok((self.usage_records(stations), LoadMeasure::Energy))
    }
}

/// Either a real or a synthetic source, chosen by configuration.
#[derive(Debug, Clone)]
pub enum Source {
    Real(CsvSource),
    Synthetic(SyntheticSource),
}

impl DataSource for Source {
    fn name(&self) -> &'static str {
        match self {
            Source::Real(s) => s.name(),
            Source::Synthetic(s) => s.name(),
        }
    }

    fn load_stations(&self) -> Result<Vec<StationRecord>, PlannerError> {
        match self {
            Source::Real(s) => s.load_stations(),
            Source::Synthetic(s) => s.load_stations(),
        }
    }

    fn load_demand(&self) -> Result<Vec<DemandPoint>, PlannerError> {
        match self {
            Source::Real(s) => s.load_demand(),
            Source::Synthetic(s) => s.load_demand(),
        }
    }

    fn load_usage(
        &self,
        stations: &[StationRecord],
    ) -> Result<(Vec<UsageRecord>, LoadMeasure), PlannerError> {
        match self {
            Source::Real(s) => s.load_usage(stations),
            Source::Synthetic(s) => s.load_usage(stations),
        }
    }
}
