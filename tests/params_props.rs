//! Property tests for the radio parameter encoders.


use mock_support::detected_driver;
use proptest::prelude::*;
use sx1278_rx::radio::hal::MockChip;
use sx1278_rx::radio::params::{
    frequency_step_hz, frequency_to_frf, frf_bytes, frf_to_frequency, Bandwidth,
};
use sx1278_rx::radio::receiver::snr_db;
use sx1278_rx::radio::registers::{REG_FRF_LSB, REG_FRF_MID, REG_FRF_MSB};

proptest! {
    #[test]
    fn prop_frequency_round_trip_within_one_step(freq in 137_000_000u64..=525_000_000) {
        let back = frf_to_frequency(frequency_to_frf(freq));
        prop_assert!(back <= freq);
        prop_assert!(((freq - back) as f64) < frequency_step_hz());
    }

    #[test]
    fn prop_frequency_encoding_monotonic(a in 137_000_000u64..=525_000_000, b in 137_000_000u64..=525_000_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(frequency_to_frf(lo) <= frequency_to_frf(hi));
    }

    #[test]
    fn prop_bandwidth_monotonic(a in any::<u32>(), b in any::<u32>()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(Bandwidth::from_hz(lo) <= Bandwidth::from_hz(hi));
        prop_assert!(Bandwidth::from_hz(lo).code() <= 9);
    }

    #[test]
    fn prop_snr_magnitude(raw in any::<u8>()) {
        let snr = snr_db(raw) as i16;
        let exact = (raw as i8) as i16;
        prop_assert!(snr.abs() * 4 <= exact.abs());
        prop_assert!(exact.abs() - snr.abs() * 4 < 4);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_set_frequency_writes_encoded_bytes(freq in 137_000_000u64..=525_000_000) {
        let chip = MockChip::new();
        let mut driver = detected_driver(&chip);

        let frf = driver.set_frequency(freq).unwrap();
        prop_assert_eq!(frf, frequency_to_frf(freq));
        prop_assert_eq!(
            [chip.register(REG_FRF_MSB), chip.register(REG_FRF_MID), chip.register(REG_FRF_LSB)],
            frf_bytes(frf)
        );
    }
}
