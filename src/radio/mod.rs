//! # SX1278 LoRa Radio
//!
//! Layered driver for a Semtech SX1278 attached over Linux spidev:
//!
//! - [`hal`]: bus transport traits, the spidev backend and a simulated chip
//! - [`access`]: register reads/writes with the chip's framing and settle delays
//! - [`autodetect`]: search for the SPI mode and clock speed the chip answers on
//! - [`driver`]: the radio configurator
//! - [`receiver`]: bounded receive cycles and packet extraction

pub mod access;
pub mod autodetect;
pub mod cancel;
pub mod driver;
pub mod hal;
pub mod params;
pub mod receiver;
pub mod registers;

pub use access::{BusTiming, RegisterAccess};
pub use autodetect::{detect, Detection, DetectionError, ProbePlan};
pub use cancel::CancelToken;
pub use driver::{DriverError, Sx1278Driver};
pub use hal::{BusConfig, BusOpener, BusTransport, HalError, SpiMode};
pub use params::{Bandwidth, RadioParams};
pub use receiver::{ReceiveConfig, ReceiveOutcome, ReceivedPacket};
pub use registers::{IrqFlags, RadioMode};
