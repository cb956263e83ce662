//! # Listener
//!
//! The receive loop of the application: runs receive cycles on an initialized
//! driver until its cancel token fires, decodes sensor payloads, appends them
//! to the CSV log and keeps the reception statistics.
//!
//! The loop is blocking (register access sleeps between transfers); the binary
//! runs it on a blocking worker thread.

use crate::config::ReceiverConfig;
use crate::error::ReceiverError;
use crate::payload::{self, SensorReading};
use crate::radio::access::pause;
use crate::radio::{
    BusOpener, BusTransport, CancelToken, DriverError, ReceiveOutcome, ReceivedPacket,
    Sx1278Driver,
};
use crate::telemetry::{CsvLog, ReceptionStats, StatusTicker};
use chrono::Local;
use log::{error, info, warn};

/// Receive loop state
pub struct Listener<T: BusTransport> {
    driver: Sx1278Driver<T>,
    log: Option<CsvLog>,
    stats: ReceptionStats,
    ticker: StatusTicker,
}

impl<T: BusTransport> Listener<T> {
    /// `driver` must already be initialized
    pub fn new(driver: Sx1278Driver<T>, log: Option<CsvLog>, status_every: u32) -> Self {
        Self {
            driver,
            log,
            stats: ReceptionStats::new(),
            ticker: StatusTicker::new(status_every),
        }
    }

    /// Find the chip, program `config.radio` into it and wrap it in a listener
    /// without a CSV log. `cancel` stops both the poll loop and `run`.
    pub fn start<O>(
        opener: &mut O,
        config: &ReceiverConfig,
        cancel: CancelToken,
    ) -> Result<Self, ReceiverError>
    where
        O: BusOpener<Transport = T>,
    {
        let mut driver = Sx1278Driver::open(opener, &config.probe_plan(), config.timing)?
            .with_receive_config(config.receive.clone())
            .with_cancel_token(cancel);
        driver.initialize(&config.radio)?;
        Ok(Self::new(driver, None, config.status_every))
    }

    /// Append decoded readings to `log`
    pub fn with_log(mut self, log: Option<CsvLog>) -> Self {
        self.log = log;
        self
    }

    pub fn stats(&self) -> &ReceptionStats {
        &self.stats
    }

    pub fn driver(&self) -> &Sx1278Driver<T> {
        &self.driver
    }

    pub fn into_driver(self) -> Sx1278Driver<T> {
        self.driver
    }

    /// Run cycles until cancelled, then put the radio to sleep
    pub fn run(&mut self) -> ReceptionStats {
        info!("Waiting for packets... (Ctrl+C to exit)");

        while !self.driver.cancel_token().is_cancelled() {
            // Errors are already counted and logged by run_cycle.
            let _ = self.run_cycle();
        }

        info!("Closing...");
        if let Err(e) = self.driver.sleep() {
            warn!("Could not put the radio to sleep: {}", e);
        }
        info!("Closed: {}", self.stats);
        self.stats.clone()
    }

    /// One receive cycle with reporting, logging and statistics
    pub fn run_cycle(&mut self) -> Result<ReceiveOutcome, DriverError> {
        let result = self.driver.receive();

        match &result {
            Ok(outcome) => {
                self.stats.record_outcome(outcome);
                if let ReceiveOutcome::Packet(packet) = outcome {
                    self.handle_packet(packet);
                }
            }
            Err(e) => {
                self.stats.record_bus_error();
                error!("Receive cycle failed: {}", e);
                // Keep a dead bus from spinning the loop.
                pause(self.driver.receive_config().poll_interval());
            }
        }

        if self.ticker.tick() {
            info!(
                "[STATUS] Listening... ({}, up {}s)",
                self.stats,
                self.ticker.uptime().as_secs()
            );
        }

        result
    }

    fn handle_packet(&mut self, packet: &ReceivedPacket) {
        info!(
            "[RX] {} bytes | RSSI: {} dBm | SNR: {} dB",
            packet.payload.len(),
            packet.rssi_dbm,
            packet.snr_db
        );
        info!("[DATA] {}", payload::payload_text(&packet.payload));

        match payload::decode(&packet.payload) {
            Ok(reading) => {
                report_reading(&reading);
                if let Some(log) = self.log.as_mut() {
                    if let Err(e) = log.append(&reading, packet.rssi_dbm, packet.snr_db) {
                        warn!("{}", e);
                    }
                }
            }
            Err(e) => {
                self.stats.record_parse_failure();
                warn!("Could not parse the 4 fields: {}", e);
            }
        }

        info!("Total: {} packets", self.stats.packets);
    }
}

fn report_reading(reading: &SensorReading) {
    let now = Local::now().format("%H:%M:%S%.3f");
    info!("{} -> Temperature: {:.1} °C", now, reading.temperature_c);
    info!("{} -> Ambient humidity: {:.1} %", now, reading.ambient_humidity_pct);
    info!("{} -> Soil humidity: {} %", now, reading.soil_humidity_pct);
    info!("{} -> Illuminance: {} lx", now, reading.illuminance_lx);
}
