//! CSV and JSON export of planning artifacts.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::load::ScheduleResult;
use crate::report::PlanningReport;
use crate::siting::RecommendedSite;

const SITES_HEADER: &str = "rank,latitude,longitude,priority_score";
const SCHEDULE_HEADER: &str = "hour,original_load,optimized_load,delta";

/// Writes ranked site recommendations to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_sites_csv(sites: &[RecommendedSite], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_sites_csv(sites, io::BufWriter::new(file))
}

/// Writes ranked site recommendations as CSV to any writer.
///
/// Rank starts at 1 and follows the order of `sites`.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_sites_csv(sites: &[RecommendedSite], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SITES_HEADER.split(','))?;
    for (rank, site) in sites.iter().enumerate() {
        wtr.write_record(&[
            (rank + 1).to_string(),
            format!("{:.6}", site.latitude),
            format!("{:.6}", site.longitude),
            format!("{:.2}", site.priority_score),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the hour-by-hour schedule comparison to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_schedule_csv(schedule: &ScheduleResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_schedule_csv(schedule, io::BufWriter::new(file))
}

/// Writes one row per hour: original load, optimized load and their
/// difference.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_schedule_csv(schedule: &ScheduleResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SCHEDULE_HEADER.split(','))?;
    for (hour, (orig, opt)) in schedule
        .original_load
        .iter()
        .zip(&schedule.optimized_load)
        .enumerate()
    {
        wtr.write_record(&[
            hour.to_string(),
            format!("{orig:.4}"),
            format!("{opt:.4}"),
            format!("{:.4}", opt - orig),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the full report as pretty-printed JSON to a file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation, serialization or writing fails.
pub fn export_report_json(report: &PlanningReport, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_report_json(report, io::BufWriter::new(file))
}

/// Writes the full report as pretty-printed JSON to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if serialization or writing fails.
pub fn write_report_json(report: &PlanningReport, mut writer: impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::ScheduleMethod;

    fn sites() -> Vec<RecommendedSite> {
        vec![
            RecommendedSite {
                latitude: 12.97,
                longitude: 77.59,
                priority_score: 8.0,
            },
            RecommendedSite {
                latitude: 28.7,
                longitude: 77.1,
                priority_score: 3.0,
            },
        ]
    }

    fn schedule() -> ScheduleResult {
        let mut original = vec![10.0; 24];
        original[12] = 30.0;
        let mut optimized = original.clone();
        optimized[12] = 15.0;
        optimized[0] = 25.0;
        ScheduleResult {
            original_load: original,
            optimized_load: optimized,
            original_peak: 30.0,
            optimized_peak: 25.0,
            peak_reduction_pct: 100.0 / 6.0,
            method: ScheduleMethod::Heuristic,
            shift_fraction: 0.5,
            unallocated_load: 0.0,
            solver_issue: None,
        }
    }

    fn lines(buf: Vec<u8>) -> Vec<String> {
        String::from_utf8(buf).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn sites_csv_ranks_in_order() {
        let mut buf = Vec::new();
        write_sites_csv(&sites(), &mut buf).unwrap();
        let lines = lines(buf);
        assert_eq!(lines[0], "rank,latitude,longitude,priority_score");
        assert_eq!(lines[1], "1,12.970000,77.590000,8.00");
        assert_eq!(lines[2], "2,28.700000,77.100000,3.00");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_sites_writes_header_only() {
        let mut buf = Vec::new();
        write_sites_csv(&[], &mut buf).unwrap();
        assert_eq!(lines(buf), vec!["rank,latitude,longitude,priority_score"]);
    }

    #[test]
    fn schedule_csv_has_one_row_per_hour() {
        let mut buf = Vec::new();
        write_schedule_csv(&schedule(), &mut buf).unwrap();
        let lines = lines(buf);
        assert_eq!(lines.len(), 25);
        assert_eq!(lines[1], "0,10.0000,25.0000,15.0000");
        assert_eq!(lines[13], "12,30.0000,15.0000,-15.0000");
    }

    #[test]
    fn schedule_csv_deltas_sum_to_zero() {
        let mut buf = Vec::new();
        write_schedule_csv(&schedule(), &mut buf).unwrap();
        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let total: f64 = rdr.records().map(|r| r.unwrap()[3].parse::<f64>().unwrap()).sum();
        assert!(total.abs() < 1e-9);
    }

    #[test]
    fn files_are_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let sites_path = dir.path().join("sites.csv");
        let schedule_path = dir.path().join("schedule.csv");
        export_sites_csv(&sites(), &sites_path).unwrap();
        export_schedule_csv(&schedule(), &schedule_path).unwrap();
        let written = std::fs::read_to_string(&sites_path).unwrap();
        assert!(written.starts_with("rank,"));
        assert!(std::fs::metadata(&schedule_path).is_ok_and(|m| m.len() > 0));
    }
}
