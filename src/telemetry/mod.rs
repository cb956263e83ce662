//! Reception telemetry: the CSV reading log and running statistics.

pub mod csv_log;
pub mod stats;

pub use csv_log::{CsvLog, CSV_HEADER};
pub use stats::{ReceptionStats, StatusTicker};
