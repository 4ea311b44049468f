//! Hour-of-day load histograms and their peak statistics.

use serde::Serialize;

use crate::data::{LoadMeasure, Table, UsageRecord};
use crate::error::InputError;

/// Number of bins in a daily profile.
pub const HOURS: usize = 24;

/// Aggregated load for one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlyLoadBin {
    /// Hour of day, `0..=23`.
    pub hour: usize,
    pub load: f64,
    /// Share of the daily total (%), 0 when the total is 0.
    pub load_pct: f64,
}

/// A complete 24-hour profile with derived statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadProfile {
    /// One bin per hour, ascending.
    pub bins: Vec<HourlyLoadBin>,
    pub measure: LoadMeasure,
    pub total: f64,
    pub mean: f64,
    /// Hour of maximum load; the earliest hour wins ties.
    pub peak_hour: usize,
    /// Hour of minimum load; the earliest hour wins ties.
    pub off_peak_hour: usize,
    /// `max / mean`, or 0 for an all-zero profile.
    pub peak_to_avg_ratio: f64,
}

impl LoadProfile {
    /// Builds a profile from 24 pre-aggregated hourly loads.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` unless `loads` has exactly 24 finite,
    /// non-negative entries.
    pub fn from_loads(loads: &[f64], measure: LoadMeasure) -> Result<Self, InputError> {
        validate_loads(loads)?;

        let total: f64 = loads.iter().sum();
        let mean = total / HOURS as f64;
        let (mut peak_hour, mut off_peak_hour) = (0, 0);
        for (h, &l) in loads.iter().enumerate() {
            if l > loads[peak_hour] {
                peak_hour = h;
            }
            if l < loads[off_peak_hour] {
                off_peak_hour = h;
            }
        }

        let bins = loads
            .iter()
            .enumerate()
            .map(|(hour, &load)| HourlyLoadBin {
                hour,
                load,
                load_pct: if total > 0.0 { load / total * 100.0 } else { 0.0 },
            })
            .collect();

        Ok(Self {
            bins,
            measure,
            total,
            mean,
            peak_hour,
            off_peak_hour,
            peak_to_avg_ratio: if mean > 0.0 { loads[peak_hour] / mean } else { 0.0 },
        })
    }

    /// Hourly loads in hour order.
    pub fn loads(&self) -> Vec<f64> {
        self.bins.iter().map(|b| b.load).collect()
    }

    pub fn peak_load(&self) -> f64 {
        self.bins[self.peak_hour].load
    }
}

/// Aggregates usage records into a [`LoadProfile`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadProfileAnalyzer;

impl LoadProfileAnalyzer {
    /// Sums record loads per hour of day; hours without records get 0.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` if a record's hour is outside `0..=23` or its
    /// load is negative or not finite.
    pub fn analyze(
        &self,
        records: &[UsageRecord],
        measure: LoadMeasure,
    ) -> Result<LoadProfile, InputError> {
        let mut loads = [0.0; HOURS];
        for (index, r) in records.iter().enumerate() {
            let hour = usize::try_from(r.hour_of_day)
                .ok()
                .filter(|h| *h < HOURS)
                .ok_or(InputError::HourOutOfRange {
                    index,
                    hour: r.hour_of_day,
                })?;
            if !r.load.is_finite() || r.load < 0.0 {
                return Err(InputError::InvalidLoad {
                    hour,
                    value: r.load,
                });
            }
            loads[hour] += r.load;
        }
        LoadProfile::from_loads(&loads, measure)
    }

    /// Reads usage records from a table and aggregates them.
    ///
    /// # Errors
    ///
    /// Returns `InputError::MissingFields` if the table has no `hour_of_day`
    /// column, or any error from [`Self::analyze`].
    pub fn analyze_table(&self, table: &Table) -> Result<LoadProfile, InputError> {
        let (records, measure) = table.usage_records()?;
        self.analyze(&records, measure)
    }
}

pub(crate) fn validate_loads(loads: &[f64]) -> Result<(), InputError> {
    if loads.len() != HOURS {
        return Err(InputError::ProfileLength {
            expected: HOURS,
            actual: loads.len(),
        });
    }
    match loads
        .iter()
        .enumerate()
        .find(|(_, l)| !l.is_finite() || **l < 0.0)
    {
        Some((hour, &value)) => Err(InputError::InvalidLoad { hour, value }),
        None => Ok(()),
    }
}
