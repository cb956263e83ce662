//! Receive loop: reporting, CSV logging and statistics.


use mock_support::{fast_receive, ready_driver};
use sx1278_rx::radio::hal::MockChip;
use sx1278_rx::radio::registers::{REG_FRF_MSB, REG_OP_MODE, REG_VERSION};
use sx1278_rx::radio::{
    BusTiming, CancelToken, DetectionError, DriverError, RadioMode, ReceiveOutcome,
};
use sx1278_rx::telemetry::{CsvLog, CSV_HEADER};
use sx1278_rx::{Listener, ReceiverConfig, ReceiverError};

fn fast_config() -> ReceiverConfig {
    ReceiverConfig {
        timing: BusTiming::none(),
        receive: fast_receive(),
        ..ReceiverConfig::default()
    }
}

#[test]
fn test_start_detects_and_initializes_radio() {
    let chip = MockChip::new();
    let cancel = CancelToken::new();

    let listener = Listener::start(&mut chip.opener(), &fast_config(), cancel.clone()).unwrap();

    assert_eq!(listener.driver().mode(), Some(RadioMode::Standby));
    assert!(listener.driver().params().is_some());
    assert_eq!(chip.register(REG_FRF_MSB), 0x6C);
    cancel.cancel();
    assert!(listener.driver().cancel_token().is_cancelled());
}

#[test]
fn test_start_without_chip_is_a_radio_error() {
    let chip = MockChip::new();
    chip.set_register(REG_VERSION, 0x22);

    let result = Listener::start(&mut chip.opener(), &fast_config(), CancelToken::new());

    assert!(matches!(
        result,
        Err(ReceiverError::Radio(DriverError::Detection(
            DetectionError::NoConfiguration { attempts: 16 }
        )))
    ));
}

#[test]
fn test_start_rejects_unrepresentable_frequency() {
    let chip = MockChip::new();
    let mut config = fast_config();
    config.radio.frequency_hz = 0;

    let result = Listener::start(&mut chip.opener(), &config, CancelToken::new());

    assert!(matches!(
        result,
        Err(ReceiverError::Radio(DriverError::InvalidParams(_)))
    ));
}

#[test]
fn test_reading_is_logged_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lora_datos.csv");
    let chip = MockChip::new();
    let log = CsvLog::open(&path).unwrap();
    let mut listener = Listener::new(ready_driver(&chip), Some(log), 10);
    chip.stage_packet(b"23.5,61.2,40,812\0", 17, 100, 0xF8, 1);

    let outcome = listener.run_cycle().unwrap();

    assert!(matches!(outcome, ReceiveOutcome::Packet(_)));
    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], CSV_HEADER);
    assert!(lines[1].ends_with(",23.5,61.2,40,812,-64,-2"), "{}", lines[1]);
    // "YYYY-MM-DD HH:MM:SS" prefix
    assert_eq!(lines[1].find(','), Some(19));
    assert_eq!(listener.stats().packets, 1);
    assert_eq!(listener.stats().parse_failures, 0);
}

#[test]
fn test_bytes_after_terminator_do_not_block_logging() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lora_datos.csv");
    let chip = MockChip::new();
    let log = CsvLog::open(&path).unwrap();
    let mut listener = Listener::new(ready_driver(&chip), Some(log), 10);
    chip.stage_packet(b"18.0,70.5,22,95\0\x41\x42\xFF", 19, 100, 0, 1);

    listener.run_cycle().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with(",18.0,70.5,22,95,-64,0"), "{}", lines[1]);
    assert_eq!(listener.stats().parse_failures, 0);
}

#[test]
fn test_unparsed_payload_is_counted_not_logged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lora_datos.csv");
    let chip = MockChip::new();
    let log = CsvLog::open(&path).unwrap();
    let mut listener = Listener::new(ready_driver(&chip), Some(log), 10);
    chip.stage_packet(b"hello", 5, 100, 0, 1);

    listener.run_cycle().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert_eq!(listener.stats().packets, 1);
    assert_eq!(listener.stats().parse_failures, 1);
}

#[test]
fn test_outcomes_update_statistics() {
    let chip = MockChip::new();
    let mut listener = Listener::new(ready_driver(&chip), None, 10);

    chip.script_irq_flags(&[0x60]);
    assert_eq!(listener.run_cycle().unwrap(), ReceiveOutcome::CrcError);
    assert_eq!(listener.run_cycle().unwrap(), ReceiveOutcome::Timeout);

    chip.fail_transfers(true);
    assert!(listener.run_cycle().is_err());

    let stats = listener.stats();
    assert_eq!(stats.cycles, 3);
    assert_eq!(stats.crc_errors, 1);
    assert_eq!(stats.timeouts, 1);
    assert_eq!(stats.bus_errors, 1);
}

#[test]
fn test_run_stops_on_cancel_and_sleeps_radio() {
    let chip = MockChip::new();
    let cancel = CancelToken::new();
    let driver = ready_driver(&chip).with_cancel_token(cancel.clone());
    let mut listener = Listener::new(driver, None, 10);
    cancel.cancel();

    let stats = listener.run();

    assert_eq!(stats.cycles, 0);
    assert_eq!(chip.register(REG_OP_MODE), 0x80);
}
