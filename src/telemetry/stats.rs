//! # Reception Statistics
//!
//! Running counters over receive cycles, with a periodic status line so an
//! operator watching the console can tell the receiver is alive.

use crate::radio::ReceiveOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Counters since start-up
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceptionStats {
    /// Completed receive cycles, whatever their outcome
    pub cycles: u64,
    pub packets: u64,
    pub crc_errors: u64,
    pub timeouts: u64,
    /// Packets longer than the receive buffer
    pub truncated: u64,
    /// Packets whose payload was not a sensor reading
    pub parse_failures: u64,
    /// Cycles aborted by a bus or FIFO failure
    pub bus_errors: u64,
}

impl ReceptionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished receive cycle
    pub fn record_outcome(&mut self, outcome: &ReceiveOutcome) {
        self.cycles += 1;
        match outcome {
            ReceiveOutcome::Packet(packet) => {
                self.packets += 1;
                if packet.truncated() {
                    self.truncated += 1;
                }
            }
            ReceiveOutcome::CrcError => self.crc_errors += 1,
            ReceiveOutcome::Timeout => self.timeouts += 1,
        }
    }

    /// Count a cycle that ended with an error
    pub fn record_bus_error(&mut self) {
        self.cycles += 1;
        self.bus_errors += 1;
    }

    pub fn record_parse_failure(&mut self) {
        self.parse_failures += 1;
    }

    /// Share of decoded packets among everything that reached RX_DONE (%)
    pub fn packet_success_rate(&self) -> f64 {
        let attempts = self.packets + self.crc_errors;
        if attempts == 0 {
            return 0.0;
        }
        self.packets as f64 / attempts as f64 * 100.0
    }
}

impl fmt::Display for ReceptionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} received, {} CRC errors, {} timeouts, {} truncated, {} unparsed",
            self.packets, self.crc_errors, self.timeouts, self.truncated, self.parse_failures
        )
    }
}

/// Emits a status line every `every` receive cycles
#[derive(Debug)]
pub struct StatusTicker {
    every: u32,
    count: u32,
    started: Instant,
}

impl StatusTicker {
    /// `every == 0` disables the status line
    pub fn new(every: u32) -> Self {
        Self {
            every,
            count: 0,
            started: Instant::now(),
        }
    }

    /// Advance by one cycle; true when a status line is due
    pub fn tick(&mut self) -> bool {
        if self.every == 0 {
            return false;
        }
        self.count += 1;
        if self.count >= self.every {
            self.count = 0;
            return true;
        }
        false
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}
