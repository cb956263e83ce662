//! # SX1278 Register Definitions and Constants
//!
//! Register addresses, operating modes and bit fields of the SX1276/77/78
//! family in LoRa mode. Only the registers this receiver touches are listed.
//!
//! ## Address Framing
//!
//! Every SPI access starts with an address byte. Bit 7 selects the direction:
//! - `0` (`addr & 0x7F`): read
//! - `1` (`addr | 0x80`): write

use bitflags::bitflags;

// =============================================================================
// Register Addresses (LoRa mode)
// =============================================================================

/// FIFO read/write access
pub const REG_FIFO: u8 = 0x00;

/// Operating mode and LoRa/FSK selection
pub const REG_OP_MODE: u8 = 0x01;

/// RF carrier frequency (MSB)
pub const REG_FRF_MSB: u8 = 0x06;

/// RF carrier frequency (MID)
pub const REG_FRF_MID: u8 = 0x07;

/// RF carrier frequency (LSB)
pub const REG_FRF_LSB: u8 = 0x08;

/// LNA gain and boost
pub const REG_LNA: u8 = 0x0C;

/// SPI pointer into the FIFO data buffer
pub const REG_FIFO_ADDR_PTR: u8 = 0x0D;

/// Start of the TX region in the FIFO
pub const REG_FIFO_TX_BASE_ADDR: u8 = 0x0E;

/// Start of the RX region in the FIFO
pub const REG_FIFO_RX_BASE_ADDR: u8 = 0x0F;

/// Start address of the last packet received
pub const REG_FIFO_RX_CURRENT_ADDR: u8 = 0x10;

/// Interrupt flags (write 1 to clear)
pub const REG_IRQ_FLAGS: u8 = 0x12;

/// Number of payload bytes of the last packet received
pub const REG_RX_NB_BYTES: u8 = 0x13;

/// SNR estimate of the last packet (two's complement, quarter dB)
pub const REG_PKT_SNR_VALUE: u8 = 0x19;

/// RSSI of the last packet
pub const REG_PKT_RSSI_VALUE: u8 = 0x1A;

/// Bandwidth, coding rate, header mode
pub const REG_MODEM_CONFIG_1: u8 = 0x1D;

/// Spreading factor, TX continuous mode, payload CRC
pub const REG_MODEM_CONFIG_2: u8 = 0x1E;

/// Low data rate optimize, AGC auto
pub const REG_MODEM_CONFIG_3: u8 = 0x26;

/// LoRa sync word
pub const REG_SYNC_WORD: u8 = 0x39;

/// Silicon revision (read-only)
pub const REG_VERSION: u8 = 0x42;

// =============================================================================
// Address framing
// =============================================================================

/// Bit 7 of the address byte selects a write access
pub const WRITE_FLAG: u8 = 0x80;

/// Mask that turns an address into a read access
pub const READ_MASK: u8 = 0x7F;

// =============================================================================
// Operating Modes (RegOpMode)
// =============================================================================

/// LongRangeMode bit: LoRa modem instead of FSK/OOK
pub const MODE_LONG_RANGE_MODE: u8 = 0x80;

/// Radio operating modes used by this receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioMode {
    Sleep = 0x00,
    Standby = 0x01,
    RxContinuous = 0x05,
}

impl RadioMode {
    /// Value written to RegOpMode, LongRangeMode bit included
    pub fn op_mode_value(self) -> u8 {
        MODE_LONG_RANGE_MODE | self as u8
    }
}

// =============================================================================
// Bit fields
// =============================================================================

/// RegModemConfig2: RxPayloadCrcOn
pub const MODEM_CONFIG_2_RX_PAYLOAD_CRC_ON: u8 = 0x04;

/// RegModemConfig3: LowDataRateOptimize
pub const MODEM_CONFIG_3_LOW_DATA_RATE_OPTIMIZE: u8 = 0x08;

/// RegModemConfig3: AgcAutoOn
pub const MODEM_CONFIG_3_AGC_AUTO_ON: u8 = 0x04;

/// RegLna: LnaBoostHf (bits 1-0 = 0b11, 150% LNA current)
pub const LNA_BOOST_HF: u8 = 0x03;

// =============================================================================
// Chip identity and defaults
// =============================================================================

/// Known silicon revisions answered by RegVersion
pub const KNOWN_VERSIONS: [u8; 3] = [0x11, 0x12, 0x24];

/// Conventional sync word (private networks)
pub const DEFAULT_SYNC_WORD: u8 = 0x12;

/// Scratch value written to RegSyncWord during bus probing
pub const PROBE_SYNC_WORD: u8 = 0x55;

/// Crystal reference of the frequency synthesizer
pub const FXOSC_HZ: u64 = 32_000_000;

/// Fractional bits of the RegFrf value
pub const FRF_SHIFT: u32 = 19;

/// Offset subtracted from RegPktRssiValue for the LF port (dBm)
pub const RSSI_OFFSET_DBM: i16 = 164;

/// FIFO size in bytes
pub const FIFO_SIZE: usize = 256;

bitflags! {
    /// RegIrqFlags bits
    ///
    /// Flags are cleared by writing `1` to the corresponding bit position,
    /// so writing `0xFF` clears every pending flag.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct IrqFlags: u8 {
        const RX_TIMEOUT         = 0b1000_0000;
        const RX_DONE            = 0b0100_0000;
        const PAYLOAD_CRC_ERROR  = 0b0010_0000;
        const VALID_HEADER       = 0b0001_0000;
        const TX_DONE            = 0b0000_1000;
        const CAD_DONE           = 0b0000_0100;
        const FHSS_CHANGE_CHANNEL = 0b0000_0010;
        const CAD_DETECTED       = 0b0000_0001;
    }
}

impl IrqFlags {
    /// Value that clears every flag when written to RegIrqFlags
    pub const CLEAR_ALL: u8 = 0xFF;

    /// A packet has been received (with or without CRC error)
    pub fn rx_done(self) -> bool {
        self.contains(IrqFlags::RX_DONE)
    }

    /// Payload CRC check failed
    pub fn crc_error(self) -> bool {
        self.contains(IrqFlags::PAYLOAD_CRC_ERROR)
    }
}
