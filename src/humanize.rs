//! Human-readable duration formatting and parsing utilities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid duration format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),
}

/// Duration wrapper with human-readable parsing.
///
/// Accepts plain seconds (`900`) or unit-suffixed segments (`15m`, `1h30m`,
/// `250ms`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct HumanDuration(pub Duration);

impl HumanDuration {
    pub const fn from_secs(secs: u64) -> Self {
        HumanDuration(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_human_readable(&self) -> String {
        const UNITS: &[(&str, u128)] = &[
            ("d", 86_400_000),
            ("h", 3_600_000),
            ("m", 60_000),
            ("s", 1_000),
            ("ms", 1),
        ];

        let mut remaining = self.0.as_millis();
        if remaining == 0 {
            return "0s".to_string();
        }

        let mut out = String::new();
        for &(unit, millis) in UNITS {
            let value = remaining / millis;
            if value > 0 {
                out.push_str(&format!("{}{}", value, unit));
                remaining %= millis;
            }
        }
        out
    }
}

impl From<Duration> for HumanDuration {
    fn from(d: Duration) -> Self {
        HumanDuration(d)
    }
}

impl From<HumanDuration> for Duration {
    fn from(d: HumanDuration) -> Self {
        d.0
    }
}

impl Serialize for HumanDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_human_readable())
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct HumanDurationVisitor;

        impl<'de> serde::de::Visitor<'de> for HumanDurationVisitor {
            type Value = HumanDuration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a duration as string (e.g., \"15m\", \"90s\") or seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(HumanDuration::from_secs(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(v)
                    .map(HumanDuration::from_secs)
                    .map_err(|_| E::custom(format!("negative duration: {}", v)))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<HumanDuration>().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_any(HumanDurationVisitor)
    }
}

impl FromStr for HumanDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        // Plain number means seconds
        if let Ok(secs) = s.parse::<u64>() {
            return Ok(HumanDuration::from_secs(secs));
        }

        if s.is_empty() {
            return Err(ParseError::InvalidFormat(s));
        }

        let mut total = Duration::ZERO;
        let mut rest = s.as_str();
        while !rest.is_empty() {
            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .ok_or_else(|| ParseError::InvalidFormat(s.clone()))?;
            if digits_end == 0 {
                return Err(ParseError::InvalidFormat(s.clone()));
            }
            let num: u64 = rest[..digits_end].parse()?;
            rest = &rest[digits_end..];

            let unit_end = rest
                .find(|c: char| c.is_ascii_digit())
                .unwrap_or(rest.len());
            let unit = rest[..unit_end].trim();
            rest = &rest[unit_end..];

            total += match unit {
                "ms" => Duration::from_millis(num),
                "s" | "sec" | "secs" => Duration::from_secs(num),
                "m" | "min" | "mins" => Duration::from_secs(num * 60),
                "h" | "hr" | "hrs" => Duration::from_secs(num * 3600),
                "d" | "day" | "days" => Duration::from_secs(num * 86_400),
                _ => return Err(ParseError::InvalidUnit(unit.to_string())),
            };
        }

        Ok(HumanDuration(total))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_human_readable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!("900".parse::<HumanDuration>().unwrap(), HumanDuration::from_secs(900));
        assert_eq!("90s".parse::<HumanDuration>().unwrap(), HumanDuration::from_secs(90));
    }

    #[test]
    fn test_parse_minutes_and_hours() {
        assert_eq!("15m".parse::<HumanDuration>().unwrap(), HumanDuration::from_secs(900));
        assert_eq!("1h30m".parse::<HumanDuration>().unwrap(), HumanDuration::from_secs(5400));
        assert_eq!("2 min".parse::<HumanDuration>().unwrap(), HumanDuration::from_secs(120));
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(
            "250ms".parse::<HumanDuration>().unwrap().as_duration(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!("".parse::<HumanDuration>(), Err(ParseError::InvalidFormat(_))));
        assert!(matches!("m15".parse::<HumanDuration>(), Err(ParseError::InvalidFormat(_))));
        assert!(matches!("15".parse::<HumanDuration>(), Ok(_)));
        assert!(matches!("15x".parse::<HumanDuration>(), Err(ParseError::InvalidUnit(_))));
    }

    #[test]
    fn test_to_human_readable() {
        assert_eq!(HumanDuration::from_secs(900).to_human_readable(), "15m");
        assert_eq!(HumanDuration::from_secs(5400).to_human_readable(), "1h30m");
        assert_eq!(HumanDuration::default().to_human_readable(), "0s");
    }

    #[test]
    fn test_deserialize_string_and_number() {
        #[derive(Deserialize)]
        struct TestStruct {
            sleep: HumanDuration,
        }
        let parsed: TestStruct = serde_json::from_str(r#"{"sleep": "15m"}"#).unwrap();
        assert_eq!(parsed.sleep.as_duration(), Duration::from_secs(900));

        let parsed: TestStruct = serde_json::from_str(r#"{"sleep": 60}"#).unwrap();
        assert_eq!(parsed.sleep.as_duration(), Duration::from_secs(60));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", HumanDuration::from_secs(120)), "2m");
    }
}
