//! Unit tests for the error enums and their `Display` implementations.

use sx1278_rx::error::ReceiverError;
use sx1278_rx::radio::{DetectionError, DriverError, HalError};

/// Tests that the `Transfer` variant is correctly formatted.
#[test]
fn test_transfer_error() {
    let err = HalError::Transfer {
        expected: 3,
        reason: "Broken pipe".to_string(),
    };
    assert_eq!(err.to_string(), "SPI transfer of 3 bytes failed: Broken pipe");
}

/// Tests that HAL errors convert into driver errors.
#[test]
fn test_hal_into_driver_error() {
    let err: DriverError = HalError::InvalidDevice("/dev/tty0".to_string()).into();
    assert!(matches!(err, DriverError::Hal(HalError::InvalidDevice(_))));
    assert_eq!(
        err.to_string(),
        "HAL error: invalid bus device path: /dev/tty0"
    );
}

/// Tests that the detection failure reports the number of attempts.
#[test]
fn test_detection_error() {
    let err: DriverError = DetectionError::NoConfiguration { attempts: 16 }.into();
    assert_eq!(
        err.to_string(),
        "Bus auto-configuration failed: no valid bus configuration found (16 combinations tried)"
    );
}

/// Tests that the `FifoRead` variant is correctly formatted.
#[test]
fn test_fifo_read_error() {
    let err = DriverError::FifoRead(HalError::Transfer {
        expected: 17,
        reason: "timeout".to_string(),
    });
    assert_eq!(
        err.to_string(),
        "FIFO read failed: SPI transfer of 17 bytes failed: timeout"
    );
}

/// Tests that the `Config` variant is correctly formatted.
#[test]
fn test_config_error() {
    let err = ReceiverError::Config("probe speed of 0 Hz".to_string());
    assert_eq!(err.to_string(), "Configuration error: probe speed of 0 Hz");
}

/// Tests that the `Log` variant names the path.
#[test]
fn test_log_error() {
    let err = ReceiverError::Log {
        path: "/tmp/x.csv".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };
    assert_eq!(err.to_string(), "Cannot write log /tmp/x.csv: denied");
}

/// Tests that driver errors convert into receiver errors.
#[test]
fn test_radio_error() {
    let err: ReceiverError = DriverError::InvalidParams("bad".to_string()).into();
    assert_eq!(err.to_string(), "Radio error: Invalid params: bad");
}
