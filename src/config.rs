//! # Receiver Configuration
//!
//! All settings have working defaults for a Ra-02 module on `/dev/spidev0.0`;
//! a JSON file only needs the fields it changes:
//!
//! ```json
//! {
//!   "device": "/dev/spidev1.0",
//!   "radio": { "frequency_hz": 434000000, "spreading_factor": 9 },
//!   "log_paths": ["/var/log/lora.csv"]
//! }
//! ```

use crate::error::ReceiverError;
use crate::radio::autodetect::DEFAULT_PROBE_SPEEDS_HZ;
use crate::radio::{BusTiming, ProbePlan, RadioParams, ReceiveConfig, SpiMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DEVICE: &str = "/dev/spidev0.0";

/// Complete receiver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// spidev device node
    pub device: String,
    /// Clock speeds tried during auto-configuration, in order
    pub probe_speeds_hz: Vec<u32>,
    /// SPI modes tried during auto-configuration, in order
    pub probe_modes: Vec<SpiMode>,
    pub radio: RadioParams,
    pub timing: BusTiming,
    pub receive: ReceiveConfig,
    /// CSV log candidates; the first one that opens is used
    pub log_paths: Vec<PathBuf>,
    /// Receive cycles between status lines (0 = never)
    pub status_every: u32,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            probe_speeds_hz: DEFAULT_PROBE_SPEEDS_HZ.to_vec(),
            probe_modes: SpiMode::ALL.to_vec(),
            radio: RadioParams::default(),
            timing: BusTiming::default(),
            receive: ReceiveConfig::default(),
            log_paths: vec![
                PathBuf::from("lora_datos.csv"),
                PathBuf::from("/tmp/lora_datos.csv"),
            ],
            status_every: 10,
        }
    }
}

impl ReceiverConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ReceiverError> {
        let json = fs::read_to_string(path)?;
        let config: ReceiverConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-configuration candidates
    pub fn probe_plan(&self) -> ProbePlan {
        ProbePlan {
            modes: self.probe_modes.clone(),
            speeds_hz: self.probe_speeds_hz.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ReceiverError> {
        if self.device.is_empty() {
            return Err(ReceiverError::Config("device path is empty".to_string()));
        }
        if self.probe_modes.is_empty() || self.probe_speeds_hz.is_empty() {
            return Err(ReceiverError::Config(
                "at least one probe mode and one probe speed are required".to_string(),
            ));
        }
        if self.probe_speeds_hz.contains(&0) {
            return Err(ReceiverError::Config("probe speed of 0 Hz".to_string()));
        }
        if self.receive.max_polls == 0 {
            return Err(ReceiverError::Config("receive.max_polls must be at least 1".to_string()));
        }
        if self.receive.capacity == 0 {
            return Err(ReceiverError::Config("receive.capacity must be at least 1".to_string()));
        }
        self.radio.validate().map_err(ReceiverError::Config)
    }
}
