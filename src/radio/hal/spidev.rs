//! # Linux spidev Transport
//!
//! Bus transport for SX1278 modules wired to a Linux SPI controller, built on
//! the `rppal` crate. Works on any board exposing `/dev/spidevB.S` nodes
//! (Raspberry Pi, Milk-V Duo, ...).
//!
//! ## Wiring (SPI0, CS0)
//!
//! ```text
//! Host     │ SX1278 (Ra-02) │ Function
//! ─────────┼────────────────┼─────────────
//! MOSI     │ MOSI           │ SPI data out
//! MISO     │ MISO           │ SPI data in
//! SCLK     │ SCK            │ SPI clock
//! CS0      │ NSS            │ Chip select
//! ```
//!
//! No DIO or RESET line is required: reception is driven by polling the IRQ
//! flags register.

use crate::radio::hal::{BusOpener, BusTransport, HalError, SpiMode};
use rppal::spi::{BitOrder, Bus, Mode, Segment, SlaveSelect, Spi};

/// Parse `/dev/spidevB.S` into rppal bus and slave select identifiers
pub fn parse_device_path(device: &str) -> Result<(Bus, SlaveSelect), HalError> {
    let invalid = || HalError::InvalidDevice(device.to_string());

    let suffix = device.strip_prefix("/dev/spidev").ok_or_else(invalid)?;
    let (bus, ss) = suffix.split_once('.').ok_or_else(invalid)?;
    let bus: u8 = bus.parse().map_err(|_| invalid())?;
    let ss: u8 = ss.parse().map_err(|_| invalid())?;

    let bus = match bus {
        0 => Bus::Spi0,
        1 => Bus::Spi1,
        2 => Bus::Spi2,
        3 => Bus::Spi3,
        4 => Bus::Spi4,
        5 => Bus::Spi5,
        6 => Bus::Spi6,
        _ => return Err(invalid()),
    };
    let ss = match ss {
        0 => SlaveSelect::Ss0,
        1 => SlaveSelect::Ss1,
        2 => SlaveSelect::Ss2,
        3 => SlaveSelect::Ss3,
        4 => SlaveSelect::Ss4,
        5 => SlaveSelect::Ss5,
        6 => SlaveSelect::Ss6,
        7 => SlaveSelect::Ss7,
        8 => SlaveSelect::Ss8,
        9 => SlaveSelect::Ss9,
        10 => SlaveSelect::Ss10,
        11 => SlaveSelect::Ss11,
        12 => SlaveSelect::Ss12,
        13 => SlaveSelect::Ss13,
        14 => SlaveSelect::Ss14,
        15 => SlaveSelect::Ss15,
        _ => return Err(invalid()),
    };

    Ok((bus, ss))
}

fn rppal_mode(mode: SpiMode) -> Mode {
    match mode {
        SpiMode::Mode0 => Mode::Mode0,
        SpiMode::Mode1 => Mode::Mode1,
        SpiMode::Mode2 => Mode::Mode2,
        SpiMode::Mode3 => Mode::Mode3,
    }
}

/// Opens spidev sessions on one fixed device node
#[derive(Debug, Clone)]
pub struct SpidevOpener {
    device: String,
    bus: Bus,
    slave_select: SlaveSelect,
}

impl SpidevOpener {
    /// Create an opener for `device` (e.g. "/dev/spidev0.0")
    pub fn new(device: &str) -> Result<Self, HalError> {
        let (bus, slave_select) = parse_device_path(device)?;
        Ok(Self {
            device: device.to_string(),
            bus,
            slave_select,
        })
    }
}

impl BusOpener for SpidevOpener {
    type Transport = SpidevTransport;

    fn open(&mut self, mode: SpiMode, speed_hz: u32) -> Result<SpidevTransport, HalError> {
        let spi = Spi::new(self.bus, self.slave_select, speed_hz, rppal_mode(mode)).map_err(
            |e| HalError::Open {
                device: self.device.clone(),
                reason: e.to_string(),
            },
        )?;

        spi.set_mode(rppal_mode(mode)).map_err(|e| HalError::Config {
            param: "mode",
            reason: e.to_string(),
        })?;
        spi.set_bits_per_word(8).map_err(|e| HalError::Config {
            param: "bits per word",
            reason: e.to_string(),
        })?;
        spi.set_bit_order(BitOrder::MsbFirst)
            .map_err(|e| HalError::Config {
                param: "bit order",
                reason: e.to_string(),
            })?;

        log::trace!("Opened {} in mode {} at {} Hz", self.device, mode, speed_hz);

        Ok(SpidevTransport { spi })
    }

    fn device(&self) -> &str {
        &self.device
    }
}

/// One open spidev session
pub struct SpidevTransport {
    spi: Spi,
}

impl BusTransport for SpidevTransport {
    fn transfer(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        speed_hz: u32,
        delay_us: u16,
    ) -> Result<(), HalError> {
        let expected = tx.len();
        let segment = Segment::with_settings(Some(rx), Some(tx), speed_hz, delay_us, 8, false);

        self.spi
            .transfer_segments(&[segment])
            .map_err(|e| HalError::Transfer {
                expected,
                reason: e.to_string(),
            })
    }
}
