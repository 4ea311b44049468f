//! When to charge: hourly load profiles and peak-reducing schedules.

/// Linear-program backend for the schedule optimizer.
pub mod lp;
pub mod profile;
pub mod schedule;

pub use profile::{HOURS, HourlyLoadBin, LoadProfile, LoadProfileAnalyzer};
pub use schedule::{
    ScheduleMethod, ScheduleOptimizer, ScheduleResult, ScheduleStrategy,
};
