//! # SX1278 Radio Driver
//!
//! Brings an SX1278 found by [`autodetect`](crate::radio::autodetect) into a
//! known LoRa receive configuration.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────┐
//! │  Packet Receiver (receiver.rs)  │
//! ├─────────────────────────────────┤
//! │  Sx1278Driver (this file)       │
//! ├─────────────────────────────────┤
//! │  Auto-configuration             │
//! ├─────────────────────────────────┤
//! │  Register access (access.rs)    │
//! ├─────────────────────────────────┤
//! │  BusTransport (spidev / mock)   │
//! └─────────────────────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use sx1278_rx::radio::{BusTiming, ProbePlan, RadioParams, Sx1278Driver};
//! use sx1278_rx::radio::hal::SpidevOpener;
//!
//! let mut opener = SpidevOpener::new("/dev/spidev0.0")?;
//! let mut driver = Sx1278Driver::open(&mut opener, &ProbePlan::default(), BusTiming::default())?;
//! driver.initialize(&RadioParams::default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::radio::access::{pause, BusTiming, RegisterAccess};
use crate::radio::autodetect::{detect, Detection, DetectionError, ProbePlan};
use crate::radio::cancel::CancelToken;
use crate::radio::hal::{BusConfig, BusOpener, BusTransport, HalError};
use crate::radio::params::{
    clamp_coding_rate, clamp_spreading_factor, coding_rate_code, frequency_to_frf, frf_bytes,
    frf_to_frequency, Bandwidth, RadioParams,
};
use crate::radio::receiver::ReceiveConfig;
use crate::radio::registers::*;
use log::{debug, info, warn};
use thiserror::Error;

/// Errors that can occur during radio driver operations
#[derive(Error, Debug)]
pub enum DriverError {
    /// Bus transport error (open, parameter, transfer)
    #[error("HAL error: {0}")]
    Hal(#[from] HalError),

    /// No working bus configuration among the candidates
    #[error("Bus auto-configuration failed: {0}")]
    Detection(#[from] DetectionError),

    /// Transport failure while extracting a received packet.
    /// IRQ flags were cleared before this was returned.
    #[error("FIFO read failed: {0}")]
    FifoRead(HalError),

    /// Parameters cannot be represented in the chip registers
    #[error("Invalid params: {0}")]
    InvalidParams(String),
}

/// Driver context for one SX1278
///
/// Owns the bus session bound to the working configuration. Every operation
/// goes through this object; there is no global state.
pub struct Sx1278Driver<T: BusTransport> {
    pub(crate) regs: RegisterAccess<T>,
    config: BusConfig,
    chip_version: u8,
    params: Option<RadioParams>,
    mode: Option<RadioMode>,
    pub(crate) receive: ReceiveConfig,
    pub(crate) cancel: CancelToken,
}

impl<T: BusTransport> Sx1278Driver<T> {
    /// Take over the session auto-configuration found the chip on
    pub fn from_detection(detection: Detection<T>) -> Self {
        Self {
            regs: detection.registers,
            config: detection.config,
            chip_version: detection.chip_version,
            params: None,
            mode: None,
            receive: ReceiveConfig::default(),
            cancel: CancelToken::new(),
        }
    }

    /// Search `plan` for a bus configuration the chip answers on and take
    /// over that session
    pub fn open<O>(opener: &mut O, plan: &ProbePlan, timing: BusTiming) -> Result<Self, DriverError>
    where
        O: BusOpener<Transport = T>,
    {
        let detection = detect(opener, plan, timing)?;
        Ok(Self::from_detection(detection))
    }

    /// Polling budget and buffer capacity used by `receive`
    pub fn with_receive_config(mut self, receive: ReceiveConfig) -> Self {
        self.receive = receive;
        self
    }

    /// Stop flag observed by the receive poll loop
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn bus_config(&self) -> BusConfig {
        self.config
    }

    pub fn chip_version(&self) -> u8 {
        self.chip_version
    }

    /// Parameters applied by the last successful `initialize`
    pub fn params(&self) -> Option<&RadioParams> {
        self.params.as_ref()
    }

    /// Last mode written to RegOpMode
    pub fn mode(&self) -> Option<RadioMode> {
        self.mode
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn receive_config(&self) -> &ReceiveConfig {
        &self.receive
    }

    /// Give back the bus session
    pub fn into_transport(self) -> T {
        self.regs.into_inner()
    }

    /// Switch operating mode (LoRa bit always set), then wait for the transition
    pub fn set_mode(&mut self, mode: RadioMode) -> Result<(), DriverError> {
        self.regs.write(REG_OP_MODE, mode.op_mode_value())?;
        pause(self.regs.timing().mode_settle());
        self.mode = Some(mode);
        debug!("Radio mode set to {:?}", mode);
        Ok(())
    }

    /// Program the carrier frequency; returns the RegFrf value written
    pub fn set_frequency(&mut self, frequency_hz: u64) -> Result<u32, DriverError> {
        let frf = frequency_to_frf(frequency_hz);
        let [msb, mid, lsb] = frf_bytes(frf);

        self.regs.write(REG_FRF_MSB, msb)?;
        self.regs.write(REG_FRF_MID, mid)?;
        self.regs.write(REG_FRF_LSB, lsb)?;

        info!("Frequency: {} Hz (FRF 0x{:06X})", frequency_hz, frf);
        Ok(frf)
    }

    /// Read the programmed carrier frequency back from RegFrf
    pub fn read_frequency(&mut self) -> Result<u64, DriverError> {
        let msb = self.regs.read(REG_FRF_MSB)? as u32;
        let mid = self.regs.read(REG_FRF_MID)? as u32;
        let lsb = self.regs.read(REG_FRF_LSB)? as u32;
        Ok(frf_to_frequency((msb << 16) | (mid << 8) | lsb))
    }

    /// Spreading factor into RegModemConfig2 bits 7-4; returns the SF applied
    pub fn set_spreading_factor(&mut self, sf: u8) -> Result<u8, DriverError> {
        let applied = clamp_spreading_factor(sf);
        if applied != sf {
            warn!("Spreading factor {} out of range, using SF{}", sf, applied);
        }
        self.regs.modify(REG_MODEM_CONFIG_2, 0xF0, applied << 4)?;
        info!("SF: {}", applied);
        Ok(applied)
    }

    /// Bandwidth into RegModemConfig1 bits 7-4; returns the step applied
    pub fn set_bandwidth(&mut self, bandwidth_hz: u32) -> Result<Bandwidth, DriverError> {
        let bw = Bandwidth::from_hz(bandwidth_hz);
        self.regs.modify(REG_MODEM_CONFIG_1, 0xF0, bw.code() << 4)?;
        info!("BW: {} Hz (step {} Hz)", bandwidth_hz, bw.hz());
        Ok(bw)
    }

    /// Coding rate into RegModemConfig1 bits 3-1; returns the denominator applied
    pub fn set_coding_rate(&mut self, denominator: u8) -> Result<u8, DriverError> {
        let applied = clamp_coding_rate(denominator);
        self.regs
            .modify(REG_MODEM_CONFIG_1, 0x0E, coding_rate_code(applied) << 1)?;
        info!("CR: 4/{}", applied);
        Ok(applied)
    }

    /// Write RegModemConfig3 with the AGC and low-data-rate-optimize bits
    pub fn set_modem_config_3(&mut self, agc_auto: bool, ldro: bool) -> Result<(), DriverError> {
        let mut value = 0;
        if agc_auto {
            value |= MODEM_CONFIG_3_AGC_AUTO_ON;
        }
        if ldro {
            value |= MODEM_CONFIG_3_LOW_DATA_RATE_OPTIMIZE;
        }
        self.regs.write(REG_MODEM_CONFIG_3, value)?;
        debug!("MODEM_CONFIG_3: AGC {} / LDRO {}", agc_auto, ldro);
        Ok(())
    }

    /// Payload CRC check on or off (RegModemConfig2 bit 2)
    pub fn set_crc(&mut self, enabled: bool) -> Result<(), DriverError> {
        let bits = if enabled {
            MODEM_CONFIG_2_RX_PAYLOAD_CRC_ON
        } else {
            0
        };
        self.regs
            .modify(REG_MODEM_CONFIG_2, MODEM_CONFIG_2_RX_PAYLOAD_CRC_ON, bits)?;
        info!("CRC: {}", if enabled { "ON" } else { "OFF" });
        Ok(())
    }

    pub fn set_sync_word(&mut self, sync_word: u8) -> Result<(), DriverError> {
        self.regs.write(REG_SYNC_WORD, sync_word)?;
        Ok(())
    }

    /// LNA boost (RegLna bits 1-0)
    pub fn set_lna_boost(&mut self, enabled: bool) -> Result<(), DriverError> {
        let bits = if enabled { LNA_BOOST_HF } else { 0 };
        self.regs.modify(REG_LNA, LNA_BOOST_HF, bits)?;
        Ok(())
    }

    pub fn set_fifo_base_addresses(&mut self, tx_base: u8, rx_base: u8) -> Result<(), DriverError> {
        self.regs.write(REG_FIFO_TX_BASE_ADDR, tx_base)?;
        self.regs.write(REG_FIFO_RX_BASE_ADDR, rx_base)?;
        Ok(())
    }

    /// Program the radio and leave it in standby.
    ///
    /// The chip only accepts most configuration writes in sleep mode, so the
    /// order of the steps below is fixed.
    pub fn initialize(&mut self, params: &RadioParams) -> Result<(), DriverError> {
        params.validate().map_err(DriverError::InvalidParams)?;
        info!("Initializing LoRa radio on {}", self.config);

        self.set_mode(RadioMode::Sleep)?;
        self.set_frequency(params.frequency_hz)?;
        self.set_spreading_factor(params.spreading_factor)?;
        self.set_bandwidth(params.bandwidth_hz)?;
        self.set_coding_rate(params.coding_rate)?;

        if params.requires_low_data_rate_optimize() && !params.low_data_rate_optimize {
            warn!(
                "SF{} at {} Hz needs low data rate optimization, but it is disabled",
                params.spreading_factor, params.bandwidth_hz
            );
        }
        self.set_modem_config_3(params.agc_auto, params.low_data_rate_optimize)?;

        self.set_crc(params.crc_enabled)?;
        self.set_sync_word(params.sync_word)?;
        self.set_lna_boost(params.lna_boost)?;
        self.set_fifo_base_addresses(0x00, 0x00)?;
        self.set_mode(RadioMode::Standby)?;

        self.params = Some(params.clone());
        info!("LoRa radio initialized");
        Ok(())
    }

    /// Put the chip to sleep (used on shutdown)
    pub fn sleep(&mut self) -> Result<(), DriverError> {
        self.set_mode(RadioMode::Sleep)
    }
}
