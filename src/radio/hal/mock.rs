//! Simulated SX1278 for testing
//!
//! This module provides a register-level model of the chip behind the
//! [`BusTransport`]/[`BusOpener`] traits so the driver can be exercised without
//! hardware. The model understands the address framing, write-1-to-clear IRQ
//! flags and auto-incrementing FIFO reads, and records every bus operation.
//!
//! Bus timing is simulated per (mode, speed) combination: by default every
//! combination works, but a test can restrict the chip to answer correctly on
//! selected combinations only, make others return a matching version byte
//! while dropping writes, or refuse to open them.

use crate::radio::hal::{BusConfig, BusOpener, BusTransport, HalError, SpiMode};
use crate::radio::registers::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One decoded bus operation, as seen by the simulated chip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusOp {
    Open { mode: SpiMode, speed_hz: u32 },
    Read { addr: u8, value: u8 },
    Write { addr: u8, value: u8 },
    FifoRead { len: usize },
}

/// How the chip perceives a session's bus timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkQuality {
    Good,
    VersionOnly,
    Garbled,
}

struct ChipState {
    registers: [u8; 128],
    fifo: [u8; FIFO_SIZE],
    accepted: Option<Vec<BusConfig>>,
    version_only: Vec<BusConfig>,
    unopenable: Vec<BusConfig>,
    garbage: u8,
    irq_script: VecDeque<u8>,
    fail_transfers: bool,
    fail_fifo_reads: bool,
    ops: Vec<BusOp>,
    frames: Vec<Vec<u8>>,
}

impl ChipState {
    fn new() -> Self {
        let mut registers = [0u8; 128];
        registers[REG_OP_MODE as usize] = 0x09;
        registers[REG_LNA as usize] = 0x20;
        registers[REG_MODEM_CONFIG_1 as usize] = 0x72;
        registers[REG_MODEM_CONFIG_2 as usize] = 0x70;
        registers[REG_MODEM_CONFIG_3 as usize] = 0x04;
        registers[REG_SYNC_WORD as usize] = DEFAULT_SYNC_WORD;
        registers[REG_VERSION as usize] = 0x12;

        Self {
            registers,
            fifo: [0u8; FIFO_SIZE],
            accepted: None,
            version_only: Vec::new(),
            unopenable: Vec::new(),
            garbage: 0x00,
            irq_script: VecDeque::new(),
            fail_transfers: false,
            fail_fifo_reads: false,
            ops: Vec::new(),
            frames: Vec::new(),
        }
    }

    fn link_quality(&self, config: BusConfig) -> LinkQuality {
        match &self.accepted {
            None => LinkQuality::Good,
            Some(list) if list.contains(&config) => LinkQuality::Good,
            Some(_) if self.version_only.contains(&config) => LinkQuality::VersionOnly,
            Some(_) => LinkQuality::Garbled,
        }
    }

    fn fifo_ptr_advance(&mut self) -> usize {
        let ptr = self.registers[REG_FIFO_ADDR_PTR as usize];
        self.registers[REG_FIFO_ADDR_PTR as usize] = ptr.wrapping_add(1);
        ptr as usize
    }

    fn read_register(&mut self, addr: u8) -> u8 {
        let value = match addr {
            REG_FIFO => {
                let ptr = self.fifo_ptr_advance();
                self.fifo[ptr]
            }
            REG_IRQ_FLAGS => {
                if let Some(next) = self.irq_script.pop_front() {
                    self.registers[REG_IRQ_FLAGS as usize] = next;
                }
                self.registers[REG_IRQ_FLAGS as usize]
            }
            _ => self.registers[addr as usize],
        };
        self.ops.push(BusOp::Read { addr, value });
        value
    }

    fn write_register(&mut self, addr: u8, value: u8) {
        self.ops.push(BusOp::Write { addr, value });
        match addr {
            REG_FIFO => {
                let ptr = self.fifo_ptr_advance();
                self.fifo[ptr] = value;
            }
            REG_IRQ_FLAGS => self.registers[REG_IRQ_FLAGS as usize] &= !value,
            REG_VERSION => {}
            _ => self.registers[addr as usize] = value,
        }
    }

    fn transfer(&mut self, config: BusConfig, tx: &[u8], rx: &mut [u8]) -> Result<(), HalError> {
        if self.fail_transfers || tx.len() != rx.len() || tx.is_empty() {
            return Err(HalError::Transfer {
                expected: tx.len(),
                reason: "simulated transfer failure".to_string(),
            });
        }
        self.frames.push(tx.to_vec());

        let addr = tx[0] & READ_MASK;
        let is_write = tx[0] & WRITE_FLAG != 0;

        match self.link_quality(config) {
            LinkQuality::Garbled => {
                rx.fill(self.garbage);
                return Ok(());
            }
            LinkQuality::VersionOnly => {
                rx.fill(self.garbage);
                if !is_write && addr == REG_VERSION && rx.len() == 2 {
                    rx[1] = self.registers[REG_VERSION as usize];
                }
                return Ok(());
            }
            LinkQuality::Good => {}
        }

        rx[0] = 0x00;
        if tx.len() == 2 {
            if is_write {
                self.write_register(addr, tx[1]);
            } else {
                rx[1] = self.read_register(addr);
            }
            return Ok(());
        }

        if addr != REG_FIFO || is_write {
            return Err(HalError::Transfer {
                expected: tx.len(),
                reason: format!("burst access to register 0x{addr:02X} not simulated"),
            });
        }
        if self.fail_fifo_reads {
            return Err(HalError::Transfer {
                expected: tx.len(),
                reason: "simulated FIFO read failure".to_string(),
            });
        }

        for byte in rx.iter_mut().skip(1) {
            let ptr = self.fifo_ptr_advance();
            *byte = self.fifo[ptr];
        }
        self.ops.push(BusOp::FifoRead { len: tx.len() - 1 });
        Ok(())
    }
}

/// Handle to a simulated chip; clones share the same chip
#[derive(Clone)]
pub struct MockChip {
    state: Arc<Mutex<ChipState>>,
}

impl Default for MockChip {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChip {
    /// A chip with reset defaults, version 0x12, answering on every bus combination
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ChipState::new())),
        }
    }

    fn state(&self) -> MutexGuard<'_, ChipState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a session directly, bypassing the opener
    pub fn transport(&self, mode: SpiMode, speed_hz: u32) -> MockTransport {
        MockTransport {
            chip: self.clone(),
            config: BusConfig { mode, speed_hz },
        }
    }

    /// Opener for auto-configuration tests
    pub fn opener(&self) -> MockOpener {
        MockOpener {
            chip: self.clone(),
            device: "/dev/spidev-mock".to_string(),
        }
    }

    /// Only the given combinations see correct bus timing
    pub fn accept_only(&self, configs: &[BusConfig]) {
        self.state().accepted = Some(configs.to_vec());
    }

    /// Combinations that read the version register correctly but lose writes
    pub fn version_only(&self, configs: &[BusConfig]) {
        self.state().version_only = configs.to_vec();
    }

    /// Combinations whose open fails
    pub fn unopenable(&self, configs: &[BusConfig]) {
        self.state().unopenable = configs.to_vec();
    }

    /// Byte clocked in on garbled sessions
    pub fn set_garbage(&self, value: u8) {
        self.state().garbage = value;
    }

    /// Fail every transfer
    pub fn fail_transfers(&self, fail: bool) {
        self.state().fail_transfers = fail;
    }

    /// Fail FIFO burst reads only
    pub fn fail_fifo_reads(&self, fail: bool) {
        self.state().fail_fifo_reads = fail;
    }

    pub fn set_register(&self, addr: u8, value: u8) {
        self.state().registers[(addr & READ_MASK) as usize] = value;
    }

    pub fn register(&self, addr: u8) -> u8 {
        self.state().registers[(addr & READ_MASK) as usize]
    }

    /// Copy `data` into the FIFO starting at `addr`
    pub fn load_fifo(&self, addr: u8, data: &[u8]) {
        let mut state = self.state();
        for (i, byte) in data.iter().enumerate() {
            state.fifo[(addr as usize + i) % FIFO_SIZE] = *byte;
        }
    }

    /// Values returned by successive reads of RegIrqFlags.
    ///
    /// Once the script runs out the register keeps its last value.
    pub fn script_irq_flags(&self, flags: &[u8]) {
        self.state().irq_script.extend(flags.iter().copied());
    }

    /// Stage a received packet that becomes visible on poll number `on_poll` (1-based).
    ///
    /// `reported_len` is what RegRxNbBytes announces; it may exceed `payload.len()`.
    pub fn stage_packet(&self, payload: &[u8], reported_len: u8, rssi_raw: u8, snr_raw: u8, on_poll: usize) {
        self.load_fifo(0x00, payload);
        {
            let mut state = self.state();
            state.registers[REG_RX_NB_BYTES as usize] = reported_len;
            state.registers[REG_FIFO_RX_CURRENT_ADDR as usize] = 0x00;
            state.registers[REG_PKT_RSSI_VALUE as usize] = rssi_raw;
            state.registers[REG_PKT_SNR_VALUE as usize] = snr_raw;
        }
        let mut script = vec![0x00; on_poll.saturating_sub(1)];
        script.push((IrqFlags::RX_DONE | IrqFlags::VALID_HEADER).bits());
        self.script_irq_flags(&script);
    }

    /// Every decoded operation so far
    pub fn ops(&self) -> Vec<BusOp> {
        self.state().ops.clone()
    }

    /// Raw TX frames of every transfer so far
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.state().frames.clone()
    }

    /// Forget recorded operations and frames
    pub fn clear_log(&self) {
        let mut state = self.state();
        state.ops.clear();
        state.frames.clear();
    }
}

/// Session on a simulated chip
pub struct MockTransport {
    chip: MockChip,
    config: BusConfig,
}

impl BusTransport for MockTransport {
    fn transfer(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        _speed_hz: u32,
        _delay_us: u16,
    ) -> Result<(), HalError> {
        self.chip.state().transfer(self.config, tx, rx)
    }
}

/// Opens sessions on a simulated chip
pub struct MockOpener {
    chip: MockChip,
    device: String,
}

impl BusOpener for MockOpener {
    type Transport = MockTransport;

    fn open(&mut self, mode: SpiMode, speed_hz: u32) -> Result<MockTransport, HalError> {
        let config = BusConfig { mode, speed_hz };
        {
            let mut state = self.chip.state();
            if state.unopenable.contains(&config) {
                return Err(HalError::Open {
                    device: self.device.clone(),
                    reason: "simulated open failure".to_string(),
                });
            }
            state.ops.push(BusOp::Open { mode, speed_hz });
        }
        Ok(self.chip.transport(mode, speed_hz))
    }

    fn device(&self) -> &str {
        &self.device
    }
}
