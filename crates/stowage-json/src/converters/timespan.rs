use serde_json::{json, Map, Value};

use super::{kind_of, JsonConverter};
use crate::ConverterError;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
const NANOS_PER_MILLI: u64 = 1_000_000;

/// Stores `std::time::Duration` as `d.hh:mm:ss:FFF`.
///
/// `FFF` holds up to three fractional digits of the second with trailing zeros dropped,
/// so five and a half seconds is written as `0.00:00:05:5` and five seconds as `0.00:00:05:`.
/// Precision below one millisecond is not kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimespanConverter;

impl JsonConverter for TimespanConverter {
    fn type_name(&self) -> &'static str {
        "Duration"
    }

    fn write(&self, object: &Map<String, Value>) -> Option<Value> {
        let secs = object.get("secs")?.as_u64()?;
        let nanos = object.get("nanos")?.as_u64()?;
        Some(Value::String(format_timespan(secs, nanos)))
    }

    fn read(&self, value: Value) -> Result<Value, ConverterError> {
        match value {
            Value::String(text) if text.trim().is_empty() => Ok(json!({ "secs": 0, "nanos": 0 })),
            Value::String(text) => {
                let (secs, nanos) = parse_timespan(&text).ok_or(ConverterError::TimespanFormat)?;
                Ok(json!({ "secs": secs, "nanos": nanos }))
            }
            object @ Value::Object(_) => Ok(object),
            other => Err(ConverterError::UnexpectedShape { type_name: self.type_name(), found: kind_of(&other) }),
        }
    }
}

fn format_timespan(secs: u64, nanos: u64) -> String {
    let days = secs / SECONDS_PER_DAY;
    let hours = secs % SECONDS_PER_DAY / SECONDS_PER_HOUR;
    let minutes = secs % SECONDS_PER_HOUR / SECONDS_PER_MINUTE;
    let seconds = secs % SECONDS_PER_MINUTE;

    let millis = format!("{:03}", nanos / NANOS_PER_MILLI % 1000);
    let fraction = millis.trim_end_matches('0');

    format!("{days}.{hours:02}:{minutes:02}:{seconds:02}:{fraction}")
}

fn parse_timespan(text: &str) -> Option<(u64, u64)> {
    let (days, clock) = text.split_once('.')?;
    let days = parse_digits(days, 1..=20)?;

    let mut parts = clock.split(':');
    let hours = parse_digits(parts.next()?, 2..=2).filter(|h| *h < 24)?;
    let minutes = parse_digits(parts.next()?, 2..=2).filter(|m| *m < 60)?;
    let seconds = parse_digits(parts.next()?, 2..=2).filter(|s| *s < 60)?;
    let fraction = parts.next()?;
    if parts.next().is_some() || fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis = format!("{fraction:0<3}").parse::<u64>().ok()?;

    let secs = days
        .checked_mul(SECONDS_PER_DAY)?
        .checked_add(hours * SECONDS_PER_HOUR + minutes * SECONDS_PER_MINUTE + seconds)?;

    Some((secs, millis * NANOS_PER_MILLI))
}

fn parse_digits(text: &str, width: std::ops::RangeInclusive<usize>) -> Option<u64> {
    if !width.contains(&text.len()) || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
