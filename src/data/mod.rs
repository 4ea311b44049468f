//! Input records and the sources that produce them.

pub mod records;
/// Real (CSV) and synthetic data providers.
pub mod source;
/// Seeded synthetic data generator.
pub mod synthetic;
/// CSV tables with schema checks.
pub mod table;

pub use records::{DemandCategory, DemandPoint, LoadMeasure, StationRecord, UsageRecord};
pub use source::{CsvSource, DataSource, Dataset, Source};
pub use synthetic::{City, SyntheticCatalog, SyntheticSource};
pub use table::Table;
