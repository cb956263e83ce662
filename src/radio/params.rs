//! LoRa radio parameters and the register encodings the SX1278 synthesizer and
//! modem expect.

use crate::radio::registers::{DEFAULT_SYNC_WORD, FRF_SHIFT, FXOSC_HZ};
use serde::{Deserialize, Serialize};

/// Largest value the 24-bit RegFrf triple can hold
pub const FRF_MAX: u32 = 0x00FF_FFFF;

/// Symbol duration above which LowDataRateOptimize is mandatory (ms)
pub const LDRO_SYMBOL_THRESHOLD_MS: f64 = 16.0;

/// Bandwidth steps supported by the SX1278 modem (RegModemConfig1 bits 7-4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Bandwidth {
    BW7_8 = 0,  // 7.8 kHz
    BW10_4 = 1, // 10.4 kHz
    BW15_6 = 2, // 15.6 kHz
    BW20_8 = 3, // 20.8 kHz
    BW31_25 = 4, // 31.25 kHz
    BW41_7 = 5, // 41.7 kHz
    BW62_5 = 6, // 62.5 kHz
    BW125 = 7,  // 125 kHz
    BW250 = 8,  // 250 kHz
    BW500 = 9,  // 500 kHz
}

impl Bandwidth {
    /// Map a requested bandwidth to the smallest step that covers it.
    ///
    /// Total and monotonic: anything above 250 kHz selects 500 kHz.
    pub fn from_hz(hz: u32) -> Self {
        match hz {
            0..=7_800 => Bandwidth::BW7_8,
            7_801..=10_400 => Bandwidth::BW10_4,
            10_401..=15_600 => Bandwidth::BW15_6,
            15_601..=20_800 => Bandwidth::BW20_8,
            20_801..=31_250 => Bandwidth::BW31_25,
            31_251..=41_700 => Bandwidth::BW41_7,
            41_701..=62_500 => Bandwidth::BW62_5,
            62_501..=125_000 => Bandwidth::BW125,
            125_001..=250_000 => Bandwidth::BW250,
            _ => Bandwidth::BW500,
        }
    }

    /// Register code (0-9)
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Nominal bandwidth in Hz
    pub fn hz(self) -> u32 {
        match self {
            Bandwidth::BW7_8 => 7_800,
            Bandwidth::BW10_4 => 10_400,
            Bandwidth::BW15_6 => 15_600,
            Bandwidth::BW20_8 => 20_800,
            Bandwidth::BW31_25 => 31_250,
            Bandwidth::BW41_7 => 41_700,
            Bandwidth::BW62_5 => 62_500,
            Bandwidth::BW125 => 125_000,
            Bandwidth::BW250 => 250_000,
            Bandwidth::BW500 => 500_000,
        }
    }
}

/// Compute the 24-bit RegFrf value: `floor(f * 2^19 / 32 MHz)`
pub fn frequency_to_frf(frequency_hz: u64) -> u32 {
    let frf = ((frequency_hz as u128) << FRF_SHIFT) / FXOSC_HZ as u128;
    u32::try_from(frf).unwrap_or(u32::MAX)
}

/// Inverse of [`frequency_to_frf`], exact to one synthesizer step
pub fn frf_to_frequency(frf: u32) -> u64 {
    (frf as u64 * FXOSC_HZ) >> FRF_SHIFT
}

/// Synthesizer resolution in Hz (~61 Hz)
pub fn frequency_step_hz() -> f64 {
    FXOSC_HZ as f64 / (1u64 << FRF_SHIFT) as f64
}

/// Split a RegFrf value into (MSB, MID, LSB)
pub fn frf_bytes(frf: u32) -> [u8; 3] {
    [(frf >> 16) as u8, (frf >> 8) as u8, frf as u8]
}

/// Spreading factors outside 6..=12 fall back to SF7
pub fn clamp_spreading_factor(sf: u8) -> u8 {
    if (6..=12).contains(&sf) {
        sf
    } else {
        7
    }
}

/// Coding-rate denominator clamped to 5..=8
pub fn clamp_coding_rate(denominator: u8) -> u8 {
    denominator.clamp(5, 8)
}

/// RegModemConfig1 coding-rate field value (`cr - 4`)
pub fn coding_rate_code(denominator: u8) -> u8 {
    clamp_coding_rate(denominator) - 4
}

/// LoRa symbol duration in milliseconds: `2^SF / BW`
pub fn symbol_duration_ms(sf: u8, bandwidth: Bandwidth) -> f64 {
    let sf = clamp_spreading_factor(sf);
    (1u32 << sf) as f64 * 1000.0 / bandwidth.hz() as f64
}

/// Radio configuration applied once per session by `Sx1278Driver::initialize`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioParams {
    /// Carrier frequency in Hz
    pub frequency_hz: u64,
    /// Spreading factor (6-12, anything else becomes 7)
    pub spreading_factor: u8,
    /// Requested bandwidth in Hz, rounded up to a chip step
    pub bandwidth_hz: u32,
    /// Coding-rate denominator, 4/5 to 4/8
    pub coding_rate: u8,
    /// Enable the payload CRC check
    pub crc_enabled: bool,
    /// LoRa sync word
    pub sync_word: u8,
    /// LNA boost (150% LNA current)
    pub lna_boost: bool,
    /// Automatic gain control
    pub agc_auto: bool,
    /// Low data rate optimization
    pub low_data_rate_optimize: bool,
}

impl Default for RadioParams {
    /// Long-range profile: 433 MHz, SF12, 62.5 kHz, CR 4/8, CRC off
    fn default() -> Self {
        Self {
            frequency_hz: 433_000_000,
            spreading_factor: 12,
            bandwidth_hz: 62_500,
            coding_rate: 8,
            crc_enabled: false,
            sync_word: DEFAULT_SYNC_WORD,
            lna_boost: true,
            agc_auto: true,
            low_data_rate_optimize: true,
        }
    }
}

impl RadioParams {
    /// Bandwidth step selected for `bandwidth_hz`
    pub fn bandwidth(&self) -> Bandwidth {
        Bandwidth::from_hz(self.bandwidth_hz)
    }

    /// Check the parameters can be represented in the chip registers
    pub fn validate(&self) -> Result<(), String> {
        let frf = frequency_to_frf(self.frequency_hz);
        if frf > FRF_MAX || frf == 0 {
            return Err(format!(
                "frequency {} Hz outside synthesizer range",
                self.frequency_hz
            ));
        }
        Ok(())
    }

    /// Whether the configured SF/BW pair requires LowDataRateOptimize
    pub fn requires_low_data_rate_optimize(&self) -> bool {
        symbol_duration_ms(self.spreading_factor, self.bandwidth()) > LDRO_SYMBOL_THRESHOLD_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_encoding_433mhz() {
        let frf = frequency_to_frf(433_000_000);
        assert_eq!(frf, 0x6C4000);
        assert_eq!(frf_bytes(frf), [0x6C, 0x40, 0x00]);
        assert_eq!(frf_to_frequency(frf), 433_000_000);
    }

    #[test]
    fn test_frequency_step() {
        assert!((frequency_step_hz() - 61.035).abs() < 0.001);
    }

    #[test]
    fn test_bandwidth_steps() {
        let inputs = [
            7_800, 10_400, 15_600, 20_800, 31_250, 41_700, 62_500, 125_000, 250_000, 500_000,
        ];
        for (code, hz) in inputs.iter().enumerate() {
            assert_eq!(Bandwidth::from_hz(*hz).code(), code as u8);
        }
        assert_eq!(Bandwidth::from_hz(250_001).code(), 9);
        assert_eq!(Bandwidth::from_hz(u32::MAX).code(), 9);
        assert_eq!(Bandwidth::from_hz(0).code(), 0);
        assert_eq!(Bandwidth::from_hz(62_501), Bandwidth::BW125);
    }

    #[test]
    fn test_bandwidth_monotonic() {
        let mut last = Bandwidth::from_hz(0);
        for hz in (0..600_000).step_by(500) {
            let bw = Bandwidth::from_hz(hz);
            assert!(bw >= last);
            last = bw;
        }
    }

    #[test]
    fn test_spreading_factor_clamp() {
        assert_eq!(clamp_spreading_factor(5), 7);
        assert_eq!(clamp_spreading_factor(13), 7);
        assert_eq!(clamp_spreading_factor(0), 7);
        assert_eq!(clamp_spreading_factor(6), 6);
        assert_eq!(clamp_spreading_factor(12), 12);
    }

    #[test]
    fn test_coding_rate_clamp() {
        assert_eq!(clamp_coding_rate(1), 5);
        assert_eq!(clamp_coding_rate(9), 8);
        assert_eq!(coding_rate_code(5), 1);
        assert_eq!(coding_rate_code(8), 4);
        assert_eq!(coding_rate_code(200), 4);
    }

    #[test]
    fn test_default_params_need_ldro() {
        let params = RadioParams::default();
        // SF12 @ 62.5 kHz: 65.5 ms per symbol
        assert!((symbol_duration_ms(12, params.bandwidth()) - 65.536).abs() < 0.001);
        assert!(params.requires_low_data_rate_optimize());
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate_out_of_range() {
        let params = RadioParams {
            frequency_hz: 2_400_000_000,
            ..RadioParams::default()
        };
        assert!(params.validate().is_err());
    }
}
