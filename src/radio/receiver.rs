//! # Packet Receiver
//!
//! One bounded receive cycle: arm continuous RX, poll RegIrqFlags until a
//! packet, a CRC error, the poll budget or a stop request, then extract the
//! payload and link metrics from the FIFO.

use crate::radio::access::pause;
use crate::radio::driver::{DriverError, Sx1278Driver};
use crate::radio::hal::{BusTransport, HalError};
use crate::radio::registers::*;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Poll budget and receive buffer size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiveConfig {
    /// Maximum reads of RegIrqFlags per cycle
    pub max_polls: u32,
    /// Pause between polls (ms)
    pub poll_interval_ms: u64,
    /// Largest payload copied out of the FIFO
    pub capacity: usize,
}

impl Default for ReceiveConfig {
    fn default() -> Self {
        Self {
            max_polls: 50,
            poll_interval_ms: 100,
            capacity: 255,
        }
    }
}

impl ReceiveConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// A packet extracted from the FIFO
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedPacket {
    pub payload: Vec<u8>,
    /// Length announced by RegRxNbBytes
    pub reported_len: usize,
    pub rssi_dbm: i16,
    pub snr_db: i8,
}

impl ReceivedPacket {
    /// The chip announced more bytes than the buffer could take
    pub fn truncated(&self) -> bool {
        self.reported_len > self.payload.len()
    }
}

/// Result of one receive cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    Packet(ReceivedPacket),
    CrcError,
    /// Poll budget exhausted or stop requested
    Timeout,
}

/// Packet RSSI in dBm from RegPktRssiValue (LF port)
pub fn rssi_dbm(raw: u8) -> i16 {
    raw as i16 - RSSI_OFFSET_DBM
}

/// Packet SNR in dB from RegPktSnrValue, truncated toward zero
pub fn snr_db(raw: u8) -> i8 {
    (raw as i8) / 4
}

impl<T: BusTransport> Sx1278Driver<T> {
    /// Run one receive cycle with the configured capacity
    pub fn receive(&mut self) -> Result<ReceiveOutcome, DriverError> {
        let capacity = self.receive.capacity;
        self.receive_with_capacity(capacity)
    }

    /// Run one receive cycle, copying at most `capacity` payload bytes.
    ///
    /// On return the chip is still in continuous RX. Every terminal outcome
    /// except a timeout leaves the IRQ flags cleared.
    pub fn receive_with_capacity(
        &mut self,
        capacity: usize,
    ) -> Result<ReceiveOutcome, DriverError> {
        self.regs.write(REG_IRQ_FLAGS, IrqFlags::CLEAR_ALL)?;
        self.set_mode(RadioMode::RxContinuous)?;

        let max_polls = self.receive.max_polls;
        let interval = self.receive.poll_interval();

        for poll in 1..=max_polls {
            if self.cancel.is_cancelled() {
                debug!("Receive cancelled before poll {}", poll);
                return Ok(ReceiveOutcome::Timeout);
            }

            let flags = IrqFlags::from_bits_retain(self.regs.read(REG_IRQ_FLAGS)?);

            if flags.rx_done() {
                if flags.crc_error() {
                    warn!("CRC error (IRQ flags 0x{:02X})", flags.bits());
                    self.regs.write(REG_IRQ_FLAGS, IrqFlags::CLEAR_ALL)?;
                    return Ok(ReceiveOutcome::CrcError);
                }

                let extracted = self.extract_packet(capacity);
                let cleared = self.regs.write(REG_IRQ_FLAGS, IrqFlags::CLEAR_ALL);

                return match extracted {
                    Ok(packet) => {
                        cleared?;
                        if packet.truncated() {
                            warn!(
                                "Packet of {} bytes truncated to {}",
                                packet.reported_len,
                                packet.payload.len()
                            );
                        }
                        Ok(ReceiveOutcome::Packet(packet))
                    }
                    Err(e) => {
                        error!("Error reading FIFO: {}", e);
                        if let Err(clear_err) = cleared {
                            error!("Failed to clear IRQ flags: {}", clear_err);
                        }
                        Err(DriverError::FifoRead(e))
                    }
                };
            }

            if poll < max_polls {
                pause(interval);
            }
        }

        debug!("No packet after {} polls", max_polls);
        Ok(ReceiveOutcome::Timeout)
    }

    fn extract_packet(&mut self, capacity: usize) -> Result<ReceivedPacket, HalError> {
        let reported_len = self.regs.read(REG_RX_NB_BYTES)? as usize;
        let current_addr = self.regs.read(REG_FIFO_RX_CURRENT_ADDR)?;
        let len = reported_len.min(capacity);

        self.regs.write(REG_FIFO_ADDR_PTR, current_addr)?;
        pause(self.regs.timing().fifo_settle());
        let payload = self.regs.read_fifo(len)?;

        let rssi_raw = self.regs.read(REG_PKT_RSSI_VALUE)?;
        let snr_raw = self.regs.read(REG_PKT_SNR_VALUE)?;

        debug!(
            "Packet: {} bytes at FIFO 0x{:02X}, RSSI raw {}, SNR raw 0x{:02X}",
            reported_len, current_addr, rssi_raw, snr_raw
        );

        Ok(ReceivedPacket {
            payload,
            reported_len,
            rssi_dbm: rssi_dbm(rssi_raw),
            snr_db: snr_db(snr_raw),
        })
    }
}
