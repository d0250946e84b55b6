//! # Temporal Types — UTC-Only Timestamps
//!
//! `Timestamp` is a UTC instant truncated to whole seconds. It renders as
//! `YYYY-MM-DDTHH:MM:SSZ`, which is both a valid `date-time` for the
//! credential schemas and the form placed into a proof configuration's
//! `created` field before canonicalization.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string with a `Z` suffix.
    ///
    /// Explicit offsets, including `+00:00`, are rejected.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        Self::parse_lenient(s)
    }

    /// Parse an RFC 3339 string with any offset, converting to UTC.
    pub fn parse_lenient(s: &str) -> Result<Self, CoreError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| CoreError::InvalidTimestamp(format!("{s:?}: {e}")))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// `self` shifted by `secs` seconds, or `None` past chrono's range.
    pub fn checked_add_seconds(&self, secs: i64) -> Option<Self> {
        self.0
            .checked_add_signed(chrono::Duration::seconds(secs))
            .map(Self)
    }

    /// Render as ISO 8601 with Z suffix (e.g. `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_lenient(&s).map_err(serde::de::Error::custom)
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_has_no_subseconds() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().nanosecond(), 0);
        assert!(ts.to_iso8601().ends_with('Z'));
    }

    #[test]
    fn test_from_utc_truncates() {
        let dt = Utc
            .with_ymd_and_hms(2026, 1, 15, 12, 30, 45)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();
        assert_eq!(Timestamp::from_utc(dt).to_iso8601(), "2026-01-15T12:30:45Z");
    }

    #[test]
    fn test_parse_strict_rejects_offsets() {
        assert!(Timestamp::parse("2026-01-15T12:00:00Z").is_ok());
        assert!(Timestamp::parse("2026-01-15T12:00:00+00:00").is_err());
        assert!(Timestamp::parse("2026-01-15T08:00:00-04:00").is_err());
        assert!(Timestamp::parse("not-a-date").is_err());
    }

    #[test]
    fn test_parse_lenient_converts_offset() {
        let ts = Timestamp::parse_lenient("2026-01-15T17:00:00+05:00").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn test_serializes_as_z_string() {
        let ts = Timestamp::parse("2024-01-01T00:00:00.750Z").unwrap();
        assert_eq!(
            serde_json::to_string(&ts).unwrap(),
            "\"2024-01-01T00:00:00Z\""
        );
    }

    #[test]
    fn test_checked_add_seconds_rolls_over() {
        let ts = Timestamp::parse("2024-01-01T23:59:59Z").unwrap();
        assert_eq!(
            ts.checked_add_seconds(1).unwrap().to_iso8601(),
            "2024-01-02T00:00:00Z"
        );
    }
}
