//! Relative and absolute time expressions.
//!
//! `-1h30m` is relative to the reference instant. Absolute expressions are
//! tried in this order: RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`; the
//! last two are read as UTC.

#![warn(clippy::all, rust_2018_idioms)]

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Time expression that is neither a duration nor a known timestamp format
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse {0:?} as a relative or absolute time")]
pub struct ParseError(pub String);

const NANOS_PER_MICRO: i128 = 1_000;
const NANOS_PER_MILLI: i128 = 1_000_000;
const NANOS_PER_SECOND: i128 = 1_000_000_000;

// Longest unit names first so that "ms" wins over "m"
const UNITS: &[(&str, i128)] = &[
    ("ns", 1),
    ("us", NANOS_PER_MICRO),
    ("µs", NANOS_PER_MICRO),
    ("μs", NANOS_PER_MICRO),
    ("ms", NANOS_PER_MILLI),
    ("s", NANOS_PER_SECOND),
    ("m", 60 * NANOS_PER_SECOND),
    ("h", 3600 * NANOS_PER_SECOND),
];

/// Resolve `spec` against `now`
pub fn parse_time(spec: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ParseError> {
    let spec = spec.trim();

    if let Some(offset) = parse_duration(spec) {
        return now
            .checked_add_signed(offset)
            .ok_or_else(|| ParseError(spec.to_string()));
    }

    parse_absolute(spec).ok_or_else(|| ParseError(spec.to_string()))
}

fn parse_absolute(spec: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(spec) {
        return Some(timestamp.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(spec, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc());
    }

    if let Ok(date_time) = NaiveDateTime::parse_from_str(spec, "%Y-%m-%d %H:%M:%S") {
        return Some(date_time.and_utc());
    }

    None
}

/// Signed duration such as `-2h`, `1h30m`, `+90s` or `1.5h`
pub fn parse_duration(spec: &str) -> Option<Duration> {
    let (negative, mut rest) = match spec.as_bytes().first() {
        Some(b'-') => (true, &spec[1..]),
        Some(b'+') => (false, &spec[1..]),
        _ => (false, spec),
    };

    if rest == "0" {
        return Some(Duration::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let integer_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let integer = &rest[..integer_len];
        rest = &rest[integer_len..];

        let mut fraction = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let fraction_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
            fraction = &after_dot[..fraction_len];
            rest = &after_dot[fraction_len..];
        }

        if integer.is_empty() && fraction.is_empty() {
            return None;
        }

        let (unit, nanos_per_unit) = UNITS.iter().find(|(name, _)| rest.starts_with(name))?;
        rest = &rest[unit.len()..];

        let whole: i128 = if integer.is_empty() {
            0
        } else {
            integer.parse().ok()?
        };
        total = total.checked_add(whole.checked_mul(*nanos_per_unit)?)?;

        if !fraction.is_empty() {
            // Digits beyond nanosecond precision cannot change the result
            let digits = &fraction[..fraction.len().min(18)];
            let numerator: i128 = digits.parse().ok()?;
            let denominator = 10i128.pow(digits.len() as u32);
            total = total.checked_add(numerator * nanos_per_unit / denominator)?;
        }
    }

    let total = if negative { -total } else { total };
    i64::try_from(total).ok().map(Duration::nanoseconds)
}
