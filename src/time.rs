//! # Time Normalizer
//!
//! Source timestamps are RFC 3339 date-times with an offset, e.g.
//! `2025-01-01T00:00:00Z` or `2024-06-30T12:15:00+01:00`. Everything is
//! normalized to UTC.
//!
//! Unparseable text never fails a record: callers get the Unix epoch back
//! together with `ok = false` and decide what to log.

use chrono::{DateTime, Utc};

/// Zero value used for absent or malformed timestamps
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Parse a timestamp, returning the epoch and `false` when it cannot be read
#[must_use]
pub fn parse_timestamp(text: &str) -> (DateTime<Utc>, bool) {
    match DateTime::parse_from_rfc3339(text.trim()) {
        Ok(parsed) => (parsed.with_timezone(&Utc), true),
        Err(_) => (epoch(), false),
    }
}
