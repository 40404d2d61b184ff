use chrono::Duration;

use crate::error::{JanitorError, Result};

/// Units in the order they must appear, with their size in seconds.
const UNITS: [(char, i64); 4] = [('d', 24 * 60 * 60), ('h', 60 * 60), ('m', 60), ('s', 1)];

/// Marker for a zero duration.
const ZERO: &str = "-";

/// Parses a compact duration such as `30d`, `2h30m` or `90s`.
///
/// Units are case-insensitive, must appear in `d h m s` order and at most once.
/// `-` means zero.
pub fn parse(text: &str) -> Result<Duration> {
    let text = text.trim();
    if text == ZERO {
        return Ok(Duration::zero());
    }

    let invalid = || JanitorError::Duration(text.to_string());

    let mut total: i64 = 0;
    let mut digits = String::new();
    let mut next_unit = 0;
    let mut components = 0;

    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let c = c.to_ascii_lowercase();
        let position = UNITS[next_unit..]
            .iter()
            .position(|(unit, _)| *unit == c)
            .ok_or_else(invalid)?;
        let (_, seconds) = UNITS[next_unit + position];

        if digits.is_empty() {
            return Err(invalid());
        }
        let value: i64 = digits.parse().map_err(|_| invalid())?;
        total = value
            .checked_mul(seconds)
            .and_then(|part| total.checked_add(part))
            .ok_or_else(invalid)?;

        digits.clear();
        next_unit += position + 1;
        components += 1;
    }

    if components == 0 || !digits.is_empty() {
        return Err(invalid());
    }

    Duration::try_seconds(total).ok_or_else(invalid)
}

/// Formats a duration in the compact form accepted by [`parse`].
///
/// Sub-second precision is dropped. Zero and negative durations render as `-`.
pub fn format(duration: &Duration) -> String {
    let mut remaining = duration.num_seconds();
    if remaining <= 0 {
        return ZERO.to_string();
    }

    let mut out = String::new();
    for (unit, seconds) in UNITS {
        if remaining >= seconds {
            out.push_str(&(remaining / seconds).to_string());
            out.push(unit);
            remaining %= seconds;
        }
    }
    out
}

/// `#[serde(with = "crate::duration::compact")]` for `Duration` fields.
pub mod compact {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "crate::duration::compact_opt")]` for `Option<Duration>` fields.
pub mod compact_opt {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&super::format(duration)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| super::parse(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}
