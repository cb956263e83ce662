//! Radio configuration sequence against the simulated chip.


use mock_support::{detected_driver, writes};
use sx1278_rx::radio::hal::MockChip;
use sx1278_rx::radio::registers::*;
use sx1278_rx::radio::{DriverError, RadioMode, RadioParams};

#[test]
fn test_default_initialize_register_values() {
    let chip = MockChip::new();
    let mut driver = detected_driver(&chip);

    driver.initialize(&RadioParams::default()).unwrap();

    assert_eq!(chip.register(REG_FRF_MSB), 0x6C);
    assert_eq!(chip.register(REG_FRF_MID), 0x40);
    assert_eq!(chip.register(REG_FRF_LSB), 0x00);
    // SF12, CRC off
    assert_eq!(chip.register(REG_MODEM_CONFIG_2), 0xC0);
    // BW 62.5 kHz (6), CR 4/8 (4)
    assert_eq!(chip.register(REG_MODEM_CONFIG_1), 0x68);
    assert_eq!(chip.register(REG_MODEM_CONFIG_3), 0x0C);
    assert_eq!(chip.register(REG_SYNC_WORD), 0x12);
    assert_eq!(chip.register(REG_LNA), 0x23);
    assert_eq!(chip.register(REG_FIFO_TX_BASE_ADDR), 0x00);
    assert_eq!(chip.register(REG_FIFO_RX_BASE_ADDR), 0x00);
    // LoRa standby
    assert_eq!(chip.register(REG_OP_MODE), 0x81);
    assert_eq!(driver.mode(), Some(RadioMode::Standby));
    assert_eq!(driver.params(), Some(&RadioParams::default()));
}

#[test]
fn test_initialize_write_order() {
    let chip = MockChip::new();
    let mut driver = detected_driver(&chip);
    chip.clear_log();

    driver.initialize(&RadioParams::default()).unwrap();

    assert_eq!(
        writes(&chip.ops()),
        vec![
            (REG_OP_MODE, 0x80),
            (REG_FRF_MSB, 0x6C),
            (REG_FRF_MID, 0x40),
            (REG_FRF_LSB, 0x00),
            (REG_MODEM_CONFIG_2, 0xC0),
            (REG_MODEM_CONFIG_1, 0x62),
            (REG_MODEM_CONFIG_1, 0x68),
            (REG_MODEM_CONFIG_3, 0x0C),
            (REG_MODEM_CONFIG_2, 0xC0),
            (REG_SYNC_WORD, 0x12),
            (REG_LNA, 0x23),
            (REG_FIFO_TX_BASE_ADDR, 0x00),
            (REG_FIFO_RX_BASE_ADDR, 0x00),
            (REG_OP_MODE, 0x81),
        ]
    );
}

#[test]
fn test_out_of_range_values_are_clamped() {
    let chip = MockChip::new();
    let mut driver = detected_driver(&chip);
    let params = RadioParams {
        frequency_hz: 868_000_000,
        spreading_factor: 13,
        bandwidth_hz: 125_000,
        coding_rate: 9,
        crc_enabled: true,
        ..RadioParams::default()
    };

    driver.initialize(&params).unwrap();

    // SF7 with CRC on
    assert_eq!(chip.register(REG_MODEM_CONFIG_2), 0x74);
    // BW 125 kHz (7), CR 4/8
    assert_eq!(chip.register(REG_MODEM_CONFIG_1), 0x78);
    // 868 MHz -> 0xD90000
    assert_eq!(chip.register(REG_FRF_MSB), 0xD9);
    assert_eq!(chip.register(REG_FRF_MID), 0x00);
    assert_eq!(chip.register(REG_FRF_LSB), 0x00);
}

#[test]
fn test_lna_boost_keeps_gain_bits() {
    let chip = MockChip::new();
    chip.set_register(REG_LNA, 0xE0);
    let mut driver = detected_driver(&chip);

    driver.initialize(&RadioParams::default()).unwrap();
    assert_eq!(chip.register(REG_LNA), 0xE3);
}

#[test]
fn test_agc_and_ldro_follow_params() {
    let chip = MockChip::new();
    let mut driver = detected_driver(&chip);
    let params = RadioParams {
        agc_auto: false,
        low_data_rate_optimize: false,
        spreading_factor: 7,
        bandwidth_hz: 125_000,
        ..RadioParams::default()
    };

    driver.initialize(&params).unwrap();
    assert_eq!(chip.register(REG_MODEM_CONFIG_3), 0x00);
}

#[test]
fn test_transfer_failure_aborts_initialize() {
    let chip = MockChip::new();
    let mut driver = detected_driver(&chip);
    chip.fail_transfers(true);

    let result = driver.initialize(&RadioParams::default());
    assert!(matches!(result, Err(DriverError::Hal(_))));
    assert!(driver.params().is_none());
}

#[test]
fn test_sleep_mode() {
    let chip = MockChip::new();
    let mut driver = detected_driver(&chip);

    driver.sleep().unwrap();
    assert_eq!(chip.register(REG_OP_MODE), 0x80);
}
