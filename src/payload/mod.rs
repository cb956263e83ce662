//! Decoding of the application payloads carried in received LoRa packets.

pub mod sensor;

pub use sensor::{decode, payload_text, SensorParseError, SensorReading};
