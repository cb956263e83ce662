//! Sensor payload decoder using nom parser combinators
//!
//! The field nodes transmit one ASCII line per packet:
//!
//! ```text
//! <temperature °C>,<ambient humidity %>,<soil humidity %>,<illuminance lx>
//! 23.5,61.2,40,812
//! ```
//!
//! Temperature and ambient humidity are decimals, the last two fields are
//! integers. The line ends at the first NUL byte; whatever follows it in the
//! packet is ignored, as is surrounding whitespace.

use nom::{
    character::complete::{char, i32 as parse_i32, space0},
    combinator::all_consuming,
    number::complete::float,
    sequence::delimited,
    IResult,
};
use thiserror::Error;

/// Reasons a payload is not a sensor reading
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SensorParseError {
    #[error("payload is not valid UTF-8")]
    NotUtf8,

    #[error("empty payload")]
    Empty,

    #[error("expected 4 comma-separated fields: '{0}'")]
    Malformed(String),
}

/// One reading from a field node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub temperature_c: f32,
    pub ambient_humidity_pct: f32,
    pub soil_humidity_pct: i32,
    pub illuminance_lx: i32,
}

fn separator(input: &str) -> IResult<&str, char> {
    delimited(space0, char(','), space0)(input)
}

/// Parse `temp,humidity,soil,lux`
pub fn parse_reading(input: &str) -> IResult<&str, SensorReading> {
    let (input, temperature_c) = float(input)?;
    let (input, _) = separator(input)?;
    let (input, ambient_humidity_pct) = float(input)?;
    let (input, _) = separator(input)?;
    let (input, soil_humidity_pct) = parse_i32(input)?;
    let (input, _) = separator(input)?;
    let (input, illuminance_lx) = parse_i32(input)?;

    Ok((
        input,
        SensorReading {
            temperature_c,
            ambient_humidity_pct,
            soil_humidity_pct,
            illuminance_lx,
        },
    ))
}

/// Payload text up to the NUL terminator, without surrounding whitespace.
///
/// Invalid UTF-8 is replaced, so this is always printable.
pub fn payload_text(payload: &[u8]) -> String {
    String::from_utf8_lossy(trim_padding(payload)).into_owned()
}

fn trim_padding(payload: &[u8]) -> &[u8] {
    let line = payload.split(|b| *b == 0).next().unwrap_or_default();
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    let start = line[..end]
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(end);
    &line[start..end]
}

/// Decode a received payload into a sensor reading
pub fn decode(payload: &[u8]) -> Result<SensorReading, SensorParseError> {
    let text = std::str::from_utf8(trim_padding(payload)).map_err(|_| SensorParseError::NotUtf8)?;
    if text.is_empty() {
        return Err(SensorParseError::Empty);
    }

    all_consuming(parse_reading)(text)
        .map(|(_, reading)| reading)
        .map_err(|_| SensorParseError::Malformed(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reading() {
        let reading = decode(b"23.5,61.2,40,812").unwrap();
        assert_eq!(reading.temperature_c, 23.5);
        assert_eq!(reading.ambient_humidity_pct, 61.2);
        assert_eq!(reading.soil_humidity_pct, 40);
        assert_eq!(reading.illuminance_lx, 812);
    }

    #[test]
    fn test_decode_tolerates_padding() {
        let reading = decode(b"-3.25, 80.0, 7, 0\r\n\0\0\0").unwrap();
        assert_eq!(reading.temperature_c, -3.25);
        assert_eq!(reading.soil_humidity_pct, 7);
        assert_eq!(reading.illuminance_lx, 0);
    }

    #[test]
    fn test_decode_stops_at_nul_terminator() {
        let reading = decode(b"23.5,61.2,40,812\0AB").unwrap();
        assert_eq!(reading.illuminance_lx, 812);

        let reading = decode(b" 19.0,55.5,12,300\r\n\0\x7F\xFF9,9").unwrap();
        assert_eq!(reading.temperature_c, 19.0);
        assert_eq!(reading.soil_humidity_pct, 12);
    }

    #[test]
    fn test_decode_integer_temperature() {
        let reading = decode(b"21,50,30,100").unwrap();
        assert_eq!(reading.temperature_c, 21.0);
    }

    #[test]
    fn test_decode_rejects_short_payload() {
        assert_eq!(
            decode(b"23.5,61.2,40"),
            Err(SensorParseError::Malformed("23.5,61.2,40".to_string()))
        );
    }

    #[test]
    fn test_decode_rejects_trailing_field() {
        assert!(matches!(
            decode(b"23.5,61.2,40,812,9"),
            Err(SensorParseError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_fractional_lux() {
        assert!(decode(b"23.5,61.2,40,812.5").is_err());
    }

    #[test]
    fn test_decode_empty_and_binary() {
        assert_eq!(decode(b"\0\0"), Err(SensorParseError::Empty));
        assert_eq!(decode(b"\01.0,2.0,3,4"), Err(SensorParseError::Empty));
        assert_eq!(decode(&[0xFF, 0xFE, 0x31]), Err(SensorParseError::NotUtf8));
    }

    #[test]
    fn test_payload_text_lossy() {
        assert_eq!(payload_text(b"hola\0\0"), "hola");
        assert_eq!(payload_text(b"hola\0mundo"), "hola");
        assert_eq!(payload_text(&[0x41, 0xFF]), "A\u{FFFD}");
    }
}
