//! Raw w1 sensor record parsing
//!
//! A healthy record is two lines of kernel output, e.g.:
//!
//! ```text
//! 50 05 4b 46 7f ff 0c 10 1c : crc=1c YES
//! 50 05 4b 46 7f ff 0c 10 1c t=23500
//! ```
//!
//! The first line ends with "YES" once the CRC check passed; the second
//! carries the temperature as an integer number of milli-degrees Celsius.

use thiserror::Error;

/// Marker terminating the first line of a record with a valid CRC
const CRC_OK_MARKER: &str = "YES";

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("record has {0} lines, expected at least 2")]
    Truncated(usize),
}

/// Parse a raw two-line sensor record into a temperature reading in Celsius.
///
/// Returns `Ok(None)` when the record is well-formed but carries no usable
/// measurement: the CRC marker is absent (conversion not finished yet) or
/// the temperature field does not parse. Both are expected transient bus
/// states, retried naturally on the next cycle.
pub fn parse_record(lines: &[String]) -> Result<Option<f64>, RecordError> {
    if lines.len() < 2 {
        return Err(RecordError::Truncated(lines.len()));
    }
    if !lines[0].trim().ends_with(CRC_OK_MARKER) {
        return Ok(None);
    }
    Ok(parse_millidegrees(lines[1].trim()).map(|milli| milli as f64 / 1000.0))
}

/// Extract the trailing `t=<integer>` field of a data line. The value may
/// be negative.
fn parse_millidegrees(line: &str) -> Option<i64> {
    let (_, field) = line.rsplit_once("t=")?;
    field.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(first: &str, second: &str) -> Vec<String> {
        vec![first.to_string(), second.to_string()]
    }

    #[test]
    fn test_valid_record() {
        let lines = record(
            "50 05 4b 46 7f ff 0c 10 1c : crc=1c YES",
            "50 05 4b 46 7f ff 0c 10 1c t=23500",
        );
        assert_eq!(parse_record(&lines).unwrap(), Some(23.5));
    }

    #[test]
    fn test_millidegree_division_is_exact() {
        for (milli, expected) in [(0, 0.0), (125, 0.125), (85000, 85.0), (23500, 23.5)] {
            let lines = record("aa YES", &format!("aa t={}", milli));
            assert_eq!(parse_record(&lines).unwrap(), Some(expected));
        }
    }

    #[test]
    fn test_negative_temperature() {
        let lines = record("ff YES", "ff t=-1062");
        assert_eq!(parse_record(&lines).unwrap(), Some(-1.062));
    }

    #[test]
    fn test_conversion_not_ready() {
        // Second line is valid, but the CRC marker is absent
        let lines = record("50 05 4b 46 7f ff 0c 10 1c : crc=1c NO", "aa t=23500");
        assert_eq!(parse_record(&lines).unwrap(), None);
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        let lines = record("crc=1c yes", "aa t=23500");
        assert_eq!(parse_record(&lines).unwrap(), None);
    }

    #[test]
    fn test_unparsable_temperature_field() {
        let lines = record("crc=1c YES", "no temperature here");
        assert_eq!(parse_record(&lines).unwrap(), None);

        let lines = record("crc=1c YES", "aa t=");
        assert_eq!(parse_record(&lines).unwrap(), None);

        let lines = record("crc=1c YES", "aa t=12x34");
        assert_eq!(parse_record(&lines).unwrap(), None);
    }

    #[test]
    fn test_truncated_record() {
        assert!(matches!(
            parse_record(&["crc=1c YES".to_string()]),
            Err(RecordError::Truncated(1))
        ));
        assert!(matches!(parse_record(&[]), Err(RecordError::Truncated(0))));
    }

    #[test]
    fn test_trailing_whitespace() {
        let lines = record("crc=1c YES\n", "aa t=23500\n");
        assert_eq!(parse_record(&lines).unwrap(), Some(23.5));
    }
}
