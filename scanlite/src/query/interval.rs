// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Half-open query time intervals
//!
//! Serialized as a single `"start/end"` string (ISO-8601, millisecond
//! precision), e.g. `"2016-06-27T00:00:00.000Z/2017-06-28T00:00:00.000Z"`.
//! Date-only endpoints such as `"2016-06-27"` are accepted on input and
//! resolve to midnight UTC.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A half-open `[start, end)` time interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether a millisecond epoch timestamp falls inside `[start, end)`.
    pub fn contains_millis(&self, timestamp_ms: i64) -> bool {
        timestamp_ms >= self.start.timestamp_millis() && timestamp_ms < self.end.timestamp_millis()
    }

    /// Parse one interval endpoint: RFC 3339, or a bare date at midnight UTC.
    fn parse_endpoint(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(DateTime::from_naive_utc_and_offset(midnight, Utc));
            }
        }
        Err(format!("unparseable interval endpoint [{raw}]"))
    }

    /// Parse a `"start/end"` interval string.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (start, end) = raw
            .split_once('/')
            .ok_or_else(|| format!("interval [{raw}] is not of the form start/end"))?;
        Ok(Self {
            start: Self::parse_endpoint(start)?,
            end: Self::parse_endpoint(end)?,
        })
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

impl Serialize for Interval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Interval::parse(&raw).map_err(D::Error::custom)
    }
}
