//! # Bus Auto-Configuration
//!
//! Finds the SPI clock mode and speed the attached SX1278 answers on, without
//! any out-of-band configuration.
//!
//! Every (mode, speed) combination is tried in a fixed order, mode varying
//! slower than speed. A combination is accepted when:
//!
//! 1. RegVersion returns a known silicon revision (0x11, 0x12 or 0x24), and
//! 2. a scratch value written to RegSyncWord reads back unchanged.
//!
//! The read-back is what rejects wrong timings: a misclocked bus can still
//! produce a plausible version byte. A version match with a failed read-back
//! moves on to the next combination.

use crate::radio::access::{pause, BusTiming, RegisterAccess};
use crate::radio::hal::{BusConfig, BusOpener, BusTransport, HalError, SpiMode};
use crate::radio::registers::{
    DEFAULT_SYNC_WORD, KNOWN_VERSIONS, PROBE_SYNC_WORD, REG_SYNC_WORD, REG_VERSION,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Candidate clock speeds, slowest first
pub const DEFAULT_PROBE_SPEEDS_HZ: [u32; 4] = [50_000, 100_000, 200_000, 500_000];

/// Auto-configuration failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectionError {
    #[error("no valid bus configuration found ({attempts} combinations tried)")]
    NoConfiguration { attempts: usize },

    #[error("empty probe plan")]
    EmptyPlan,
}

/// Candidate modes and speeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbePlan {
    pub modes: Vec<SpiMode>,
    pub speeds_hz: Vec<u32>,
}

impl Default for ProbePlan {
    fn default() -> Self {
        Self {
            modes: SpiMode::ALL.to_vec(),
            speeds_hz: DEFAULT_PROBE_SPEEDS_HZ.to_vec(),
        }
    }
}

impl ProbePlan {
    /// Combinations in probing order: mode outer, speed inner
    pub fn combinations(&self) -> impl Iterator<Item = BusConfig> + '_ {
        self.modes.iter().flat_map(move |&mode| {
            self.speeds_hz
                .iter()
                .map(move |&speed_hz| BusConfig { mode, speed_hz })
        })
    }

    pub fn len(&self) -> usize {
        self.modes.len() * self.speeds_hz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a successful auto-configuration
pub struct Detection<T: BusTransport> {
    /// Working configuration
    pub config: BusConfig,
    /// Value read from RegVersion
    pub chip_version: u8,
    /// The session the chip was found on, ready for further use
    pub registers: RegisterAccess<T>,
}

/// Outcome of probing one combination
enum Probe {
    Accepted(u8),
    WrongVersion(u8),
    ReadBackMismatch { version: u8, read_back: u8 },
}

fn probe<T: BusTransport>(
    regs: &mut RegisterAccess<T>,
) -> Result<Probe, HalError> {
    let version = regs.read(REG_VERSION)?;
    if !KNOWN_VERSIONS.contains(&version) {
        return Ok(Probe::WrongVersion(version));
    }

    regs.write(REG_SYNC_WORD, PROBE_SYNC_WORD)?;
    pause(regs.timing().probe_settle());
    let read_back = regs.read(REG_SYNC_WORD)?;
    if read_back != PROBE_SYNC_WORD {
        return Ok(Probe::ReadBackMismatch { version, read_back });
    }

    regs.write(REG_SYNC_WORD, DEFAULT_SYNC_WORD)?;
    Ok(Probe::Accepted(version))
}

/// Search `plan` for a working bus configuration.
///
/// Each attempt opens a fresh session; rejected sessions are dropped before the
/// next attempt. Open and transfer failures only disqualify the combination.
/// On success the sync word is back at its default (0x12).
pub fn detect<O: BusOpener>(
    opener: &mut O,
    plan: &ProbePlan,
    timing: BusTiming,
) -> Result<Detection<O::Transport>, DetectionError> {
    if plan.is_empty() {
        return Err(DetectionError::EmptyPlan);
    }

    info!("Searching SPI configuration on {}", opener.device());
    let mut attempts = 0;

    for config in plan.combinations() {
        attempts += 1;

        let bus = match opener.open(config.mode, config.speed_hz) {
            Ok(bus) => bus,
            Err(e) => {
                debug!("Probe {}: {}", config, e);
                continue;
            }
        };
        let mut regs = RegisterAccess::new(bus, config.speed_hz, timing);

        match probe(&mut regs) {
            Ok(Probe::Accepted(version)) => {
                info!(
                    "SPI configuration found: {} (chip version 0x{:02X})",
                    config, version
                );
                return Ok(Detection {
                    config,
                    chip_version: version,
                    registers: regs,
                });
            }
            Ok(Probe::WrongVersion(version)) => {
                debug!("Probe {}: version 0x{:02X} not recognised", config, version);
            }
            Ok(Probe::ReadBackMismatch { version, read_back }) => {
                debug!(
                    "Probe {}: version 0x{:02X} but sync word read back 0x{:02X}",
                    config, version, read_back
                );
            }
            Err(e) => {
                debug!("Probe {}: {}", config, e);
            }
        }
    }

    warn!("No valid SPI configuration after {} attempts", attempts);
    Err(DetectionError::NoConfiguration { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_order_mode_outer() {
        let plan = ProbePlan::default();
        let combos: Vec<BusConfig> = plan.combinations().collect();

        assert_eq!(combos.len(), 16);
        assert_eq!(
            combos[0],
            BusConfig {
                mode: SpiMode::Mode0,
                speed_hz: 50_000
            }
        );
        assert_eq!(
            combos[1],
            BusConfig {
                mode: SpiMode::Mode0,
                speed_hz: 100_000
            }
        );
        assert_eq!(
            combos[4],
            BusConfig {
                mode: SpiMode::Mode1,
                speed_hz: 50_000
            }
        );
        assert_eq!(
            combos[15],
            BusConfig {
                mode: SpiMode::Mode3,
                speed_hz: 500_000
            }
        );
    }

    #[test]
    fn test_empty_plan() {
        let chip = crate::radio::hal::MockChip::new();
        let plan = ProbePlan {
            modes: vec![],
            speeds_hz: vec![50_000],
        };
        let result = detect(&mut chip.opener(), &plan, BusTiming::none());
        assert!(matches!(result, Err(DetectionError::EmptyPlan)));
    }
}
