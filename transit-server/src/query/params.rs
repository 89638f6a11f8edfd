//! Raw request parameters and their validation.
//!
//! Parameters arrive as optional strings straight from the query string.
//! Empty values count as missing.

use std::num::IntErrorKind;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::domain::Coordinates;

use super::error::QueryError;

/// Naive layouts accepted for `start_time`, interpreted in the feed timezone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Query string of the closest-departures endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDepartureParams {
    pub start_coordinates: Option<String>,
    pub end_coordinates: Option<String>,
    pub start_time: Option<String>,
    pub limit: Option<String>,
}

/// Validated closest-departures parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartureParams {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub start_time: DateTime<Utc>,
    /// `None` when the caller gave no limit.
    pub limit: Option<usize>,
}

impl RawDepartureParams {
    /// Check presence, then each value in declaration order.
    ///
    /// `timezone` interprets start times given without an offset.
    pub fn validate(&self, timezone: Tz) -> Result<DepartureParams, QueryError> {
        let start = present(&self.start_coordinates);
        let end = present(&self.end_coordinates);
        let time = present(&self.start_time);

        let (Some(start), Some(end), Some(time)) = (start, end, time) else {
            let missing = [
                ("start_coordinates", start.is_none()),
                ("end_coordinates", end.is_none()),
                ("start_time", time.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            return Err(QueryError::MissingParameters(missing));
        };

        let origin = Coordinates::parse(start).map_err(|_| QueryError::InvalidCoordinates)?;
        let destination = Coordinates::parse(end).map_err(|_| QueryError::InvalidCoordinates)?;
        let start_time = parse_start_time(time, timezone)?;
        let limit = present(&self.limit).map(parse_limit).transpose()?;

        Ok(DepartureParams {
            origin,
            destination,
            start_time,
            limit,
        })
    }
}

/// Query string of the trip endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTripParams {
    pub date: Option<String>,
}

impl RawTripParams {
    /// The requested service date, or the date of `now` in `timezone`.
    pub fn service_date(&self, timezone: Tz, now: DateTime<Utc>) -> Result<NaiveDate, QueryError> {
        match present(&self.date) {
            Some(date) => {
                NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| QueryError::InvalidDate)
            }
            None => Ok(now.with_timezone(&timezone).date_naive()),
        }
    }
}

/// A non-negative integer. Values too large for `usize` saturate.
fn parse_limit(s: &str) -> Result<usize, QueryError> {
    let digits = s.strip_prefix('+').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(QueryError::InvalidLimit);
    }
    match digits.parse::<usize>() {
        Ok(limit) => Ok(limit),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(usize::MAX),
        Err(_) => Err(QueryError::InvalidLimit),
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse an ISO 8601 timestamp.
///
/// With an offset (`Z`, `+02:00`, `+0200`) the instant is exact; without
/// one it is local time in `timezone`. Local times skipped by a DST change
/// are rejected; repeated ones resolve to the earlier instant.
fn parse_start_time(s: &str, timezone: Tz) -> Result<DateTime<Utc>, QueryError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(t.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .and_then(|naive| naive.and_local_timezone(timezone).earliest())
        .map(|t| t.with_timezone(&Utc))
        .ok_or(QueryError::InvalidStartTime)
}
