//! # Hardware Abstraction Layer for the SPI Bus
//!
//! This module defines the bus traits the SX1278 driver is written against and
//! provides the platform implementations:
//!
//! - [`spidev`]: Linux spidev access through `rppal` (feature `hardware-spi`)
//! - [`mock`]: a simulated SX1278 used by the test suite
//!
//! A bus session is bound to one clock mode and one clock speed for its whole
//! lifetime. Auto-configuration therefore goes through a [`BusOpener`], which
//! opens a fresh [`BusTransport`] for every candidate combination.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod mock;

#[cfg(feature = "hardware-spi")]
pub mod spidev;

pub use mock::{BusOp, MockChip, MockOpener, MockTransport};

#[cfg(feature = "hardware-spi")]
pub use spidev::{SpidevOpener, SpidevTransport};

/// Errors that can occur during bus operations
#[derive(Debug, Error)]
pub enum HalError {
    /// The device node could not be opened
    #[error("cannot open bus device {device}: {reason}")]
    Open { device: String, reason: String },

    /// One of the bus parameters (mode, word size, bit order, speed) was refused
    #[error("cannot apply bus parameter {param}: {reason}")]
    Config { param: &'static str, reason: String },

    /// The transfer failed or moved fewer bytes than requested
    #[error("SPI transfer of {expected} bytes failed: {reason}")]
    Transfer { expected: usize, reason: String },

    /// Device path is not of the form /dev/spidevB.S
    #[error("invalid bus device path: {0}")]
    InvalidDevice(String),
}

/// SPI clock polarity/phase mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    Mode0 = 0,
    /// CPOL=0, CPHA=1
    Mode1 = 1,
    /// CPOL=1, CPHA=0
    Mode2 = 2,
    /// CPOL=1, CPHA=1
    Mode3 = 3,
}

impl SpiMode {
    /// All four modes in probing order
    pub const ALL: [SpiMode; 4] = [SpiMode::Mode0, SpiMode::Mode1, SpiMode::Mode2, SpiMode::Mode3];
}

impl TryFrom<u8> for SpiMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SpiMode::Mode0),
            1 => Ok(SpiMode::Mode1),
            2 => Ok(SpiMode::Mode2),
            3 => Ok(SpiMode::Mode3),
            other => Err(format!("SPI mode must be 0-3, got {other}")),
        }
    }
}

impl From<SpiMode> for u8 {
    fn from(mode: SpiMode) -> Self {
        mode as u8
    }
}

impl fmt::Display for SpiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Working bus configuration discovered by auto-configuration
///
/// Immutable once found; every register operation runs at `speed_hz` on a
/// session opened with `mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    pub mode: SpiMode,
    pub speed_hz: u32,
}

impl fmt::Display for BusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mode {} @ {} Hz", self.mode, self.speed_hz)
    }
}

/// Full-duplex transfer on an open bus session
///
/// Sessions always use 8-bit words and MSB-first bit order.
pub trait BusTransport {
    /// Clock out `tx` while clocking `rx.len()` bytes in.
    ///
    /// `tx` and `rx` have the same length. `speed_hz` and `delay_us` apply to
    /// this transfer only; `delay_us` is the settle time the controller holds
    /// after the transfer before releasing chip select.
    fn transfer(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        speed_hz: u32,
        delay_us: u16,
    ) -> Result<(), HalError>;
}

/// Opens bus sessions for a given clock mode and speed
pub trait BusOpener {
    type Transport: BusTransport;

    /// Open a fresh session. The previous session, if any, is dropped by the caller.
    fn open(&mut self, mode: SpiMode, speed_hz: u32) -> Result<Self::Transport, HalError>;

    /// Device identification for log messages
    fn device(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spi_mode_conversion() {
        assert_eq!(SpiMode::try_from(2u8), Ok(SpiMode::Mode2));
        assert!(SpiMode::try_from(4u8).is_err());
        assert_eq!(u8::from(SpiMode::Mode3), 3);
    }

    #[test]
    fn test_hal_error_display() {
        let err = HalError::Transfer {
            expected: 2,
            reason: "short transfer".to_string(),
        };
        assert_eq!(err.to_string(), "SPI transfer of 2 bytes failed: short transfer");
    }

    #[test]
    fn test_bus_config_display() {
        let cfg = BusConfig {
            mode: SpiMode::Mode1,
            speed_hz: 100_000,
        };
        assert_eq!(cfg.to_string(), "mode 1 @ 100000 Hz");
    }
}
