//! # CSV Reading Log
//!
//! Appends one row per decoded sensor reading:
//!
//! ```text
//! fecha_hora,temp_C,humAmb_pct,humSuelo_pct,lux,rssi_dBm,snr_dB
//! 2024-05-01 12:30:05,23.5,61.2,40,812,-64,7
//! ```
//!
//! The header is written only when the file is created. Each row is flushed
//! immediately so a power cut loses at most the row being written.

use crate::error::ReceiverError;
use crate::payload::SensorReading;
use chrono::{Local, NaiveDateTime};
use log::{info, warn};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str = "fecha_hora,temp_C,humAmb_pct,humSuelo_pct,lux,rssi_dBm,snr_dB";

/// Timestamp format of the first column (local time)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format one CSV row (without line terminator)
pub fn format_row(timestamp: &NaiveDateTime, reading: &SensorReading, rssi_dbm: i16, snr_db: i8) -> String {
    format!(
        "{},{:.1},{:.1},{},{},{},{}",
        timestamp.format(TIMESTAMP_FORMAT),
        reading.temperature_c,
        reading.ambient_humidity_pct,
        reading.soil_humidity_pct,
        reading.illuminance_lx,
        rssi_dbm,
        snr_db
    )
}

/// An open CSV log file
pub struct CsvLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl CsvLog {
    /// Open `path` for appending, creating it with a header if needed
    pub fn open(path: &Path) -> Result<Self, ReceiverError> {
        let existed = path.exists();
        let log_err = |source: std::io::Error| ReceiverError::Log {
            path: path.display().to_string(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(log_err)?;
        let mut writer = BufWriter::new(file);

        if !existed {
            writeln!(writer, "{CSV_HEADER}").map_err(log_err)?;
            writer.flush().map_err(log_err)?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    /// Open the first usable path, in order.
    ///
    /// Returns `None` when no candidate can be opened; the receiver then keeps
    /// running with console output only.
    pub fn open_first<P: AsRef<Path>>(candidates: &[P]) -> Option<Self> {
        for candidate in candidates {
            match Self::open(candidate.as_ref()) {
                Ok(log) => {
                    info!("Logging readings to {}", log.path.display());
                    return Some(log);
                }
                Err(e) => warn!("{}", e),
            }
        }
        warn!("No CSV log path could be opened, continuing with console output only");
        None
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one reading stamped with the current local time
    pub fn append(&mut self, reading: &SensorReading, rssi_dbm: i16, snr_db: i8) -> Result<(), ReceiverError> {
        let now = Local::now().naive_local();
        self.append_at(&now, reading, rssi_dbm, snr_db)
    }

    /// Append one reading with an explicit timestamp
    pub fn append_at(
        &mut self,
        timestamp: &NaiveDateTime,
        reading: &SensorReading,
        rssi_dbm: i16,
        snr_db: i8,
    ) -> Result<(), ReceiverError> {
        let row = format_row(timestamp, reading, rssi_dbm, snr_db);
        writeln!(self.writer, "{row}")
            .and_then(|_| self.writer.flush())
            .map_err(|source| ReceiverError::Log {
                path: self.path.display().to_string(),
                source,
            })
    }
}
