//! Duration strings.
//!
//! Accepts a bare number of seconds (`"240"`) or a sequence of
//! `<number><unit>` pairs (`"90s"`, `"1m30s"`, `"1.5h"`, `"500ms"`).
//! Units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`, `d`.

use std::time::Duration;

use crate::{RedisError, Result};

/// Parse a duration string.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || RedisError::InvalidDuration(input.to_string());

    let text = input.trim();
    if text.is_empty() {
        return Err(invalid());
    }
    if let Ok(secs) = text.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = 0f64;
    let mut rest = text;
    while !rest.is_empty() {
        let unit_start = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let (number, tail) = rest.split_at(unit_start);
        let value: f64 = number.parse().map_err(|_| invalid())?;

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);

        let scale = match unit {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "d" => 86400.0,
            _ => return Err(invalid()),
        };
        total += value * scale;
        rest = next;
    }

    Duration::try_from_secs_f64(total).map_err(|_| invalid())
}

/// Serde helper: serializes as whole seconds, deserializes from seconds or a
/// duration string.
pub mod serde_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(u64),
        Text(String),
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Secs(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => super::parse_duration(&text).map_err(serde::de::Error::custom),
        }
    }
}
