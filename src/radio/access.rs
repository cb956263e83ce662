//! # Register Access Layer
//!
//! Single-register reads and writes over an open bus session, using the SX1278
//! address framing (bit 7 set = write) and the settle delays the chip needs
//! around every access. The bus has no flow control; skipping the settle
//! delays produces intermittent wrong reads on this chip family.
//!
//! Read-modify-write helpers are not atomic with respect to other bus users.
//! They rely on the driver being the single owner of the session.

use crate::radio::hal::{BusTransport, HalError};
use crate::radio::registers::{READ_MASK, REG_FIFO, WRITE_FLAG};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

/// Fixed delays of the register protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusTiming {
    /// Pause before and after every register transfer (µs)
    pub register_settle_us: u64,
    /// Delay the controller holds after each transfer (µs)
    pub inter_byte_delay_us: u16,
    /// Pause after every RegOpMode write (ms)
    pub mode_settle_ms: u64,
    /// Pause between the probe write and its read-back (µs)
    pub probe_settle_us: u64,
    /// Pause after moving the FIFO pointer, before the burst read (µs)
    pub fifo_settle_us: u64,
}

impl Default for BusTiming {
    fn default() -> Self {
        Self {
            register_settle_us: 200,
            inter_byte_delay_us: 100,
            mode_settle_ms: 10,
            probe_settle_us: 1_000,
            fifo_settle_us: 1_000,
        }
    }
}

impl BusTiming {
    /// No delays at all, for simulated buses
    pub fn none() -> Self {
        Self {
            register_settle_us: 0,
            inter_byte_delay_us: 0,
            mode_settle_ms: 0,
            probe_settle_us: 0,
            fifo_settle_us: 0,
        }
    }

    pub fn register_settle(&self) -> Duration {
        Duration::from_micros(self.register_settle_us)
    }

    pub fn mode_settle(&self) -> Duration {
        Duration::from_millis(self.mode_settle_ms)
    }

    pub fn probe_settle(&self) -> Duration {
        Duration::from_micros(self.probe_settle_us)
    }

    pub fn fifo_settle(&self) -> Duration {
        Duration::from_micros(self.fifo_settle_us)
    }
}

/// Block the caller for `duration`; zero is a no-op
pub fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

/// Register-level access to an SX1278 on one bus session
pub struct RegisterAccess<T: BusTransport> {
    bus: T,
    speed_hz: u32,
    timing: BusTiming,
}

impl<T: BusTransport> RegisterAccess<T> {
    /// Wrap an open session; every transfer runs at `speed_hz`
    pub fn new(bus: T, speed_hz: u32, timing: BusTiming) -> Self {
        Self {
            bus,
            speed_hz,
            timing,
        }
    }

    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    pub fn timing(&self) -> &BusTiming {
        &self.timing
    }

    /// Give back the underlying session
    pub fn into_inner(self) -> T {
        self.bus
    }

    /// Read one register.
    ///
    /// Sends `[addr & 0x7F, 0x00]` and returns the second byte clocked in.
    pub fn read(&mut self, addr: u8) -> Result<u8, HalError> {
        pause(self.timing.register_settle());

        let tx = [addr & READ_MASK, 0x00];
        let mut rx = [0u8; 2];
        self.bus
            .transfer(&tx, &mut rx, self.speed_hz, self.timing.inter_byte_delay_us)?;

        pause(self.timing.register_settle());
        log::trace!("Register read 0x{:02X} -> 0x{:02X}", addr, rx[1]);
        Ok(rx[1])
    }

    /// Write one register. Sends `[addr | 0x80, value]`.
    pub fn write(&mut self, addr: u8, value: u8) -> Result<(), HalError> {
        pause(self.timing.register_settle());

        let tx = [addr | WRITE_FLAG, value];
        let mut rx = [0u8; 2];
        self.bus
            .transfer(&tx, &mut rx, self.speed_hz, self.timing.inter_byte_delay_us)?;

        pause(self.timing.register_settle());
        log::trace!("Register write 0x{:02X} <- 0x{:02X}", addr, value);
        Ok(())
    }

    /// Read-modify-write: replace the bits selected by `mask` with `bits`.
    ///
    /// Returns the value written.
    pub fn modify(&mut self, addr: u8, mask: u8, bits: u8) -> Result<u8, HalError> {
        let current = self.read(addr)?;
        let value = (current & !mask) | (bits & mask);
        self.write(addr, value)?;
        Ok(value)
    }

    /// Burst-read `len` bytes from RegFifo starting at the current FIFO pointer.
    ///
    /// The transfer is `len + 1` bytes long: the first byte clocked in answers
    /// the address byte and is discarded.
    pub fn read_fifo(&mut self, len: usize) -> Result<Vec<u8>, HalError> {
        let mut tx = vec![0u8; len + 1];
        tx[0] = REG_FIFO & READ_MASK;
        let mut rx = vec![0u8; len + 1];

        self.bus
            .transfer(&tx, &mut rx, self.speed_hz, self.timing.inter_byte_delay_us)?;

        log::trace!("FIFO burst read, {} bytes", len);
        rx.remove(0);
        Ok(rx)
    }
}
