//! CSV-backed tables and conversion into typed records.
//!
//! Column presence is checked before any row is read; a missing column is
//! reported together with every other missing column of the same table.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use super::records::{DemandCategory, DemandPoint, LoadMeasure, StationRecord, UsageRecord};
use crate::error::{InputError, PlannerError};
use crate::geo::GeoPoint;

/// Columns probed, in order, for an energy measure in usage tables.
pub const ENERGY_COLUMNS: &[&str] = &["energy_kwh", "energy_delivered_kwh", "energy", "kwh", "power"];

const STATION_COLUMNS: &[&str] = &["latitude", "longitude"];
const DEMAND_COLUMNS: &[&str] = &["latitude", "longitude", "demand_score"];
const USAGE_COLUMNS: &[&str] = &["hour_of_day"];

/// Station columns consumed directly; everything else becomes an attribute.
const STATION_KNOWN: &[&str] = &["station_id", "latitude", "longitude", "power_kw", "operator"];

/// An in-memory table of string cells with normalized headers.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl Table {
    /// Reads a table with a header row from any reader.
    ///
    /// Headers are trimmed, lower-cased and have spaces replaced by
    /// underscores, so `" Power KW"` becomes `power_kw`.
    ///
    /// # Errors
    ///
    /// Returns a `PlannerError::Csv` if the input is not valid CSV.
    pub fn from_reader(name: &str, reader: impl Read) -> Result<Self, PlannerError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.iter().map(normalize_header).collect();
        let rows = rdr.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    /// Reads a table from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns a `PlannerError` if the file cannot be opened or parsed.
    pub fn from_path(name: &str, path: &Path) -> Result<Self, PlannerError> {
        let file = File::open(path)?;
        Self::from_reader(name, file)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, if present.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Checks that every column in `required` is present.
    ///
    /// # Errors
    ///
    /// Returns `InputError::MissingFields` listing all absent columns.
    pub fn require(&self, required: &[&str]) -> Result<(), InputError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|c| self.column(c).is_none())
            .map(|c| (*c).to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(InputError::MissingFields {
                table: self.name.clone(),
                fields: missing,
            })
        }
    }

    fn cell<'a>(&self, row: &'a StringRecord, col: usize) -> &'a str {
        row.get(col).unwrap_or("")
    }

    fn parse_f64(&self, row_idx: usize, row: &StringRecord, col: usize) -> Result<f64, InputError> {
        let raw = self.cell(row, col);
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.invalid(row_idx, col, raw))
    }

    fn invalid(&self, row_idx: usize, col: usize, raw: &str) -> InputError {
        InputError::InvalidValue {
            table: self.name.clone(),
            row: row_idx,
            column: self.headers[col].clone(),
            value: raw.to_string(),
        }
    }

    /// Converts rows into station records.
    ///
    /// Requires `latitude` and `longitude`. A missing `station_id` defaults to
    /// `ROW_<n>`, a missing or empty `power_kw` to 0 and a missing `operator`
    /// to `"Unknown"`.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` for missing columns, unparsable cells or
    /// out-of-range coordinates.
    pub fn stations(&self) -> Result<Vec<StationRecord>, InputError> {
        self.require(STATION_COLUMNS)?;
        let lat = self.column("latitude").unwrap_or_default();
        let lon = self.column("longitude").unwrap_or_default();
        let id = self.column("station_id");
        let power = self.column("power_kw");
        let operator = self.column("operator");
        let extras: Vec<(usize, &String)> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !STATION_KNOWN.contains(&h.as_str()))
            .collect();

        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let location = GeoPoint::new(
                    self.parse_f64(i, row, lat)?,
                    self.parse_f64(i, row, lon)?,
                );
                location.validate(i)?;

                let power_kw = match power {
                    Some(c) if !self.cell(row, c).is_empty() => {
                        let v = self.parse_f64(i, row, c)?;
                        if v < 0.0 {
                            return Err(self.invalid(i, c, self.cell(row, c)));
                        }
                        v
                    }
                    _ => 0.0,
                };

                let attributes: BTreeMap<String, String> = extras
                    .iter()
                    .map(|(c, h)| ((*h).clone(), self.cell(row, *c).to_string()))
                    .collect();

                Ok(StationRecord {
                    station_id: id
                        .map(|c| self.cell(row, c).to_string())
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| format!("ROW_{i}")),
                    location,
                    power_kw,
                    operator: operator
                        .map(|c| self.cell(row, c).to_string())
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| String::from("Unknown")),
                    attributes,
                })
            })
            .collect()
    }

    /// Converts rows into demand points.
    ///
    /// Requires `latitude`, `longitude` and `demand_score` (a positive
    /// integer). The category is read from `category` or `type` when present.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` for missing columns or invalid cells.
    pub fn demand_points(&self) -> Result<Vec<DemandPoint>, InputError> {
        self.require(DEMAND_COLUMNS)?;
        let lat = self.column("latitude").unwrap_or_default();
        let lon = self.column("longitude").unwrap_or_default();
        let score = self.column("demand_score").unwrap_or_default();
        let category = self.column("category").or_else(|| self.column("type"));

        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let location = GeoPoint::new(
                    self.parse_f64(i, row, lat)?,
                    self.parse_f64(i, row, lon)?,
                );
                location.validate(i)?;

                let raw = self.cell(row, score);
                let demand_score = raw
                    .parse::<u32>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(|| self.invalid(i, score, raw))?;

                Ok(DemandPoint {
                    location,
                    demand_score,
                    category: category
                        .map(|c| DemandCategory::parse(self.cell(row, c)))
                        .unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Converts rows into usage records and reports which measure was used.
    ///
    /// Requires `hour_of_day`. The first column of [`ENERGY_COLUMNS`] present
    /// supplies the energy; without one every row counts as one session.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` if `hour_of_day` is absent or a cell is invalid.
    pub fn usage_records(&self) -> Result<(Vec<UsageRecord>, LoadMeasure), InputError> {
        self.require(USAGE_COLUMNS)?;
        let hour = self.column("hour_of_day").unwrap_or_default();
        let energy = ENERGY_COLUMNS.iter().find_map(|c| self.column(c));
        let measure = if energy.is_some() {
            LoadMeasure::Energy
        } else {
            LoadMeasure::SessionCount
        };

        let records = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let raw = self.cell(row, hour);
                let hour_of_day = raw
                    .parse::<i64>()
                    .map_err(|_| self.invalid(i, hour, raw))?;
                let load = match energy {
                    Some(c) => self.parse_f64(i, row, c)?,
                    None => 1.0,
                };
                Ok(UsageRecord { hour_of_day, load })
            })
            .collect::<Result<Vec<_>, InputError>>()?;

        Ok((records, measure))
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, csv: &str) -> Table {
        Table::from_reader(name, csv.as_bytes()).unwrap()
    }

    #[test]
    fn headers_are_normalized() {
        let t = table("stations", " Latitude ,LONGITUDE,Power KW\n1,2,3\n");
        assert_eq!(t.headers(), ["latitude", "longitude", "power_kw"]);
    }

    #[test]
    fn missing_fields_are_enumerated() {
        let t = table("demand", "lat,demand_score\n1,2\n");
        assert_eq!(
            t.demand_points(),
            Err(InputError::MissingFields {
                table: "demand".to_string(),
                fields: vec!["latitude".to_string(), "longitude".to_string()],
            })
        );
    }

    #[test]
    fn parses_stations_with_defaults_and_attributes() {
        let t = table(
            "stations",
            "station_id,latitude,longitude,power_kw,city\nS1,28.6,77.2,50,Delhi\n,19.0,72.8,,Mumbai\n",
        );
        let stations = t.stations().unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].station_id, "S1");
        assert_eq!(stations[0].power_kw, 50.0);
        assert_eq!(stations[0].attributes.get("city").map(String::as_str), Some("Delhi"));
        assert_eq!(stations[1].station_id, "ROW_1");
        assert_eq!(stations[1].power_kw, 0.0);
        assert_eq!(stations[1].operator, "Unknown");
    }

    #[test]
    fn rejects_out_of_range_station() {
        let t = table("stations", "latitude,longitude\n95,10\n");
        assert!(matches!(
            t.stations(),
            Err(InputError::LatitudeOutOfRange { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_non_positive_demand_score() {
        let t = table("demand", "latitude,longitude,demand_score\n1,1,0\n");
        assert!(matches!(
            t.demand_points(),
            Err(InputError::InvalidValue { row: 0, .. })
        ));
    }

    #[test]
    fn demand_category_read_from_type_column() {
        let t = table("demand", "latitude,longitude,demand_score,type\n1,1,4,Commercial\n");
        let points = t.demand_points().unwrap();
        assert_eq!(points[0].category, DemandCategory::Commercial);
        assert_eq!(points[0].demand_score, 4);
    }

    #[test]
    fn usage_prefers_energy_column() {
        let t = table("usage", "hour_of_day,energy_delivered_kwh\n8,12.5\n9,3\n");
        let (records, measure) = t.usage_records().unwrap();
        assert_eq!(measure, LoadMeasure::Energy);
        assert_eq!(records[0], UsageRecord { hour_of_day: 8, load: 12.5 });
    }

    #[test]
    fn usage_without_energy_counts_sessions() {
        let t = table("usage", "hour_of_day,station_id\n8,S1\n8,S2\n");
        let (records, measure) = t.usage_records().unwrap();
        assert_eq!(measure, LoadMeasure::SessionCount);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.load == 1.0));
    }

    #[test]
    fn usage_without_hour_column_fails() {
        let t = table("usage", "energy_kwh\n1.0\n");
        assert!(matches!(
            t.usage_records(),
            Err(InputError::MissingFields { ref fields, .. }) if fields == &["hour_of_day".to_string()]
        ));
    }
}
