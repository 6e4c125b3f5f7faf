//! Go-style duration strings (`90s`, `1m30s`, `1.5h`, `250ms`).

use std::time::Duration;

const NANOS_PER_UNIT: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("us", 1e3),
    ("µs", 1e3),
    ("μs", 1e3),
    ("ms", 1e6),
    ("s", 1e9),
    ("m", 60e9),
    ("h", 3600e9),
];

/// Parse a duration such as `2m` or `1h15m30.5s`.
///
/// Every number needs a unit, except a bare `0`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let input = s.trim();
    if input.is_empty() {
        return Err("duration cannot be empty".to_string());
    }
    if input == "0" {
        return Ok(Duration::ZERO);
    }

    let invalid = || format!("'{}' is not a valid duration (e.g. 90s, 1m30s, 500ms)", s);

    let mut nanos = 0f64;
    let mut rest = input;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_end == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..num_end].parse().map_err(|_| invalid())?;
        rest = &rest[num_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        if unit.is_empty() {
            return Err(format!("missing unit in duration '{}'", s));
        }
        let scale = NANOS_PER_UNIT
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| format!("unknown unit '{}' in duration '{}'", unit, s))?;

        nanos += value * scale;
        rest = &rest[unit_end..];
    }

    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        return Err(format!("duration '{}' is out of range", s));
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}
