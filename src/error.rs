//! # Receiver Error Handling
//!
//! This module defines the ReceiverError enum, which represents the errors the
//! receiver application can run into outside the radio driver itself.

use crate::radio::DriverError;
use thiserror::Error;

/// Represents the different error types that can occur in the receiver.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// Indicates an invalid or inconsistent configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Indicates a file system error, e.g. reading the configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Indicates a malformed JSON configuration file.
    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Indicates a failure in the radio driver.
    #[error("Radio error: {0}")]
    Radio(#[from] DriverError),

    /// Indicates the CSV log could not be opened or written.
    #[error("Cannot write log {path}: {source}")]
    Log {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
