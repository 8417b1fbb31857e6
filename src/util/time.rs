//! Time and date parsing utilities.
//!
//! Stored timestamps are UTC with millisecond precision and always render as
//! `YYYY-MM-DDTHH:MM:SS.fffZ`, so a value read back from a record can be fed
//! into a filter and compare equal.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc};
use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Current time truncated to millisecond precision.
#[must_use]
pub fn now() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}

/// Drop sub-millisecond precision.
#[must_use]
pub fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = dt.nanosecond() / 1_000_000 * 1_000_000;
    dt.with_nanosecond(nanos).unwrap_or(dt)
}

/// Render a timestamp in the stored representation.
#[must_use]
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a client-supplied timestamp.
///
/// Supports:
/// - RFC3339: `2025-01-15T12:00:00Z`, `2025-01-15T12:00:00.250+02:00`
/// - Simple date: `2025-01-15` (midnight UTC)
/// - Naive date-time: `2025-01-15T12:00:00`, `2025-01-15 12:00:00` (taken as UTC)
///
/// Returns `None` when nothing matches. Sub-millisecond precision is dropped.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(truncate_to_millis(dt.with_timezone(&Utc)));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(truncate_to_millis(naive.and_utc()));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a stored timestamp, falling back to the Unix epoch on corrupt rows.
#[must_use]
pub fn parse_stored_timestamp(s: &str) -> Timestamp {
    Timestamp(parse_timestamp(s).unwrap_or(DateTime::UNIX_EPOCH))
}

/// A stored record timestamp: UTC, millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Wrap a timestamp, dropping sub-millisecond precision.
    #[must_use]
    pub fn new(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_millis(dt))
    }

    #[must_use]
    pub fn now() -> Self {
        Self(now())
    }

    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::new(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_timestamp(self.0))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .map(Self)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}

impl JsonSchema for Timestamp {
    fn schema_name() -> String {
        "Timestamp".to_string()
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            format: Some("date-time".to_string()),
            ..Default::default()
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_parse_rfc3339() {
        let result = parse_timestamp("2025-01-15T12:00:00Z").unwrap();
        assert_eq!(result.year(), 2025);
        assert_eq!(result.hour(), 12);
    }

    #[test]
    fn test_parse_rfc3339_offset_normalizes_to_utc() {
        let result = parse_timestamp("2025-01-15T12:00:00+02:00").unwrap();
        assert_eq!(result.hour(), 10);
    }

    #[test]
    fn test_parse_simple_date_is_utc_midnight() {
        let result = parse_timestamp("2025-06-20").unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2025, 6, 20, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_datetime() {
        let a = parse_timestamp("2025-06-20 08:30:00").unwrap();
        let b = parse_timestamp("2025-06-20T08:30:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.minute(), 30);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("2025-13-40").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_format_roundtrips_through_parse() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let stored = format_timestamp(truncate_to_millis(at));
        assert_eq!(stored, "2023-11-14T22:13:20.123Z");
        assert_eq!(format_timestamp(parse_timestamp(&stored).unwrap()), stored);
    }

    #[test]
    fn test_now_has_millisecond_precision() {
        assert_eq!(now().nanosecond() % 1_000_000, 0);
    }

    #[test]
    fn test_timestamp_serde() {
        let ts = Timestamp::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2025-01-01T00:00:00.000Z\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
        assert!(serde_json::from_str::<Timestamp>("\"yesterday\"").is_err());
    }

    #[test]
    fn test_corrupt_stored_timestamp_falls_back_to_epoch() {
        assert_eq!(
            parse_stored_timestamp("garbage").as_datetime(),
            DateTime::UNIX_EPOCH
        );
    }
}
