//! # sx1278-rx - A Polling LoRa Receiver for SX1278 Radios on Embedded Linux
//!
//! The sx1278-rx crate drives a Semtech SX1278 (Ra-02 and similar modules)
//! through the Linux spidev interface and receives LoRa packets by polling the
//! chip's interrupt flags. It is built for small Linux boards where the radio's
//! DIO lines are not wired to GPIO interrupts.
//!
//! ## Features
//!
//! - Auto-configuration of the SPI clock mode and speed, verified by a
//!   register write/read-back
//! - Radio configuration: frequency, spreading factor, bandwidth, coding rate,
//!   CRC, sync word, LNA boost
//! - Bounded receive cycles reporting a packet, a CRC error or a timeout, with
//!   packet RSSI and SNR
//! - Decoding of the `temp,humidity,soil,lux` sensor payload and a CSV log
//! - A simulated chip behind the same bus traits for hardware-free testing
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sx1278_rx::radio::{detect, BusTiming, ProbePlan, RadioParams, ReceiveOutcome, Sx1278Driver};
//! use sx1278_rx::radio::hal::SpidevOpener;
//!
//! let mut opener = SpidevOpener::new("/dev/spidev0.0")?;
//! let detection = detect(&mut opener, &ProbePlan::default(), BusTiming::default())?;
//! let mut driver = Sx1278Driver::from_detection(detection);
//! driver.initialize(&RadioParams::default())?;
//!
//! if let ReceiveOutcome::Packet(packet) = driver.receive()? {
//!     println!("{} bytes, RSSI {} dBm", packet.payload.len(), packet.rssi_dbm);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod listener;
pub mod logging;
pub mod payload;
pub mod radio;
pub mod telemetry;

pub use crate::config::ReceiverConfig;
pub use crate::error::ReceiverError;
pub use crate::listener::Listener;
pub use crate::logging::init_logger;

// Radio driver
pub use radio::{
    CancelToken, DriverError, RadioParams, ReceiveConfig, ReceiveOutcome, ReceivedPacket,
    Sx1278Driver,
};

// Payload and telemetry
pub use payload::{SensorParseError, SensorReading};
pub use telemetry::{CsvLog, ReceptionStats};
