//! Parsing utilities for human-readable configuration values

use std::fmt;
use std::time::Duration;

const SECOND: f64 = 1000.0;
const MINUTE: f64 = SECOND * 60.0;
const HOUR: f64 = MINUTE * 60.0;
const DAY: f64 = HOUR * 24.0;
const WEEK: f64 = DAY * 7.0;
const YEAR: f64 = DAY * 365.25;

// Longer inputs are refused outright rather than scanned
const MAX_INPUT_LEN: usize = 100;

/// Error returned when a duration string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDurationError {
    input: String,
}

impl fmt::Display for ParseDurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a valid time string (e.g. \"1h\", \"30m\", \"7d\", \"60s\")",
            self.input
        )
    }
}

impl std::error::Error for ParseDurationError {}

/// Milliseconds per unit, or `None` for an unknown unit name.
fn unit_millis(unit: &str) -> Option<f64> {
    let millis = match unit {
        "" | "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1.0,
        "s" | "sec" | "secs" | "second" | "seconds" => SECOND,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "week" | "weeks" => WEEK,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR,
        _ => return None,
    };
    Some(millis)
}

/// `digits`, `digits.digits` or `.digits`; no exponent, no sign.
fn is_decimal(s: &str) -> bool {
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (s, None),
    };
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    match frac {
        Some(frac) => !frac.is_empty() && all_digits(int) && all_digits(frac),
        None => !int.is_empty() && all_digits(int),
    }
}

/// Parse a time string such as `"60s"`, `"5m"`, `"1.5h"`, `"2 days"` or `"1w"`.
///
/// A number followed by an optional unit, optionally separated by spaces.
/// Units match case-insensitively:
///
/// | Unit | Accepted names |
/// |------|----------------|
/// | milliseconds | `ms`, `msec(s)`, `millisecond(s)` |
/// | seconds | `s`, `sec(s)`, `second(s)` |
/// | minutes | `m`, `min(s)`, `minute(s)` |
/// | hours | `h`, `hr(s)`, `hour(s)` |
/// | days | `d`, `day(s)` |
/// | weeks | `w`, `week(s)` |
/// | years (365.25 days) | `y`, `yr(s)`, `year(s)` |
///
/// A bare number is milliseconds. Zero and negative durations are rejected.
pub fn parse_duration(s: &str) -> Result<Duration, ParseDurationError> {
    let err = || ParseDurationError { input: s.to_string() };

    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_INPUT_LEN {
        return Err(err());
    }

    let lowered = trimmed.to_lowercase();
    let split = lowered
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(lowered.len());
    let (number, unit) = lowered.split_at(split);

    if !is_decimal(number) {
        return Err(err());
    }
    let per_unit = unit_millis(unit.trim_start_matches(' ')).ok_or_else(err)?;

    let value: f64 = number.parse().map_err(|_| err())?;
    let nanos = (value * per_unit * 1_000_000.0).round();
    if !nanos.is_finite() || nanos < 1.0 || nanos >= u64::MAX as f64 {
        return Err(err());
    }

    Ok(Duration::from_nanos(nanos as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("100ms"), Ok(Duration::from_millis(100)));
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("5m"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert_eq!(parse_duration("7d"), Ok(Duration::from_secs(7 * 86400)));
        assert_eq!(parse_duration("  5M "), Ok(Duration::from_secs(300)));
    }

    #[test]
    fn test_parse_duration_weeks_and_years() {
        assert_eq!(parse_duration("1w"), Ok(Duration::from_secs(7 * 86400)));
        assert_eq!(parse_duration("2 weeks"), Ok(Duration::from_secs(14 * 86400)));
        assert_eq!(parse_duration("1y"), Ok(Duration::from_secs(31_557_600)));
        assert_eq!(parse_duration("1 yr"), Ok(Duration::from_secs(31_557_600)));
    }

    #[test]
    fn test_parse_duration_long_unit_names() {
        assert_eq!(parse_duration("2 days"), Ok(Duration::from_secs(2 * 86400)));
        assert_eq!(parse_duration("5 minutes"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_duration("10 mins"), Ok(Duration::from_secs(600)));
        assert_eq!(parse_duration("2hrs"), Ok(Duration::from_secs(7200)));
        assert_eq!(parse_duration("1 Second"), Ok(Duration::from_secs(1)));
        assert_eq!(parse_duration("250 msecs"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("3   hours"), Ok(Duration::from_secs(3 * 3600)));
    }

    #[test]
    fn test_parse_duration_decimals() {
        assert_eq!(parse_duration("1.5h"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration(".5m"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("2.5 s"), Ok(Duration::from_millis(2500)));
    }

    #[test]
    fn test_bare_number_is_milliseconds() {
        assert_eq!(parse_duration("60"), Ok(Duration::from_millis(60)));
        assert_eq!(parse_duration("60000"), Ok(Duration::from_secs(60)));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("-5m").is_err());
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("0.0h").is_err());
        assert!(parse_duration("1.h").is_err());
        assert!(parse_duration("1..5h").is_err());
        assert!(parse_duration("5 fortnights").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("1e3ms").is_err());
        assert!(parse_duration(&"1".repeat(101)).is_err());
    }

    #[test]
    fn test_error_names_input() {
        let err = parse_duration("soon").unwrap_err();
        assert!(err.to_string().contains("'soon'"));
    }
}
