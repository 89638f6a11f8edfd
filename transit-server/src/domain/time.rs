//! Schedule time handling for GTFS feeds.
//!
//! GTFS gives stop times as `H:MM:SS` strings measured from the start of the
//! service day. Trips running past midnight keep counting, so `25:10:00` is a
//! valid time meaning ten past one on the following calendar day.
//!
//! The service day starts at "noon minus 12h" in the feed timezone. On most
//! days that is midnight; on daylight-saving transition days it is offset by
//! an hour, which keeps schedule offsets consistent across the transition.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;

/// Error returned when parsing an invalid schedule time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid schedule time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A GTFS schedule time: seconds since the service day origin.
///
/// # Examples
///
/// ```
/// use transit_server::domain::ScheduleTime;
///
/// let t = ScheduleTime::parse("08:34:00").unwrap();
/// assert_eq!(t.seconds(), 8 * 3600 + 34 * 60);
///
/// // Single-digit hours and after-midnight times are allowed
/// assert!(ScheduleTime::parse("8:34:00").is_ok());
/// assert_eq!(ScheduleTime::parse("25:10:00").unwrap().to_string(), "25:10:00");
///
/// // Malformed input is rejected
/// assert!(ScheduleTime::parse("08:34").is_err());
/// assert!(ScheduleTime::parse("08:60:00").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduleTime(u32);

impl ScheduleTime {
    /// Create a schedule time from seconds since the service day origin.
    pub fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Create a schedule time from hours, minutes and seconds.
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    /// Parse a time in `H:MM:SS` or `HH:MM:SS` format.
    ///
    /// Hours may exceed 23 for trips that run past midnight.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TimeError::new("expected HH:MM:SS format"));
        };

        if h.is_empty() || h.len() > 3 || !h.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimeError::new("invalid hour digits"));
        }
        let hours: u32 = h
            .parse()
            .map_err(|_| TimeError::new("invalid hour digits"))?;

        let minutes =
            parse_two_digits(m.as_bytes()).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minutes > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let seconds = parse_two_digits(sec.as_bytes())
            .ok_or_else(|| TimeError::new("invalid second digits"))?;
        if seconds > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        Ok(Self::from_hms(hours, minutes, seconds))
    }

    /// Seconds since the service day origin.
    pub fn seconds(&self) -> u32 {
        self.0
    }

    /// Absolute instant of this time on a service day.
    pub fn on(&self, origin: DateTime<Utc>) -> DateTime<Utc> {
        origin + Duration::seconds(i64::from(self.0))
    }
}

impl fmt::Debug for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScheduleTime({self})")
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.0 / 3600,
            (self.0 / 60) % 60,
            self.0 % 60
        )
    }
}

/// The instant a service day starts: noon minus twelve hours, local time.
///
/// # Examples
///
/// ```
/// use transit_server::domain::service_day_origin;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
/// let origin = service_day_origin(date, chrono_tz::Europe::Warsaw);
/// // Warsaw is UTC+2 in April
/// assert_eq!(origin.to_rfc3339(), "2025-04-01T22:00:00+00:00");
/// ```
pub fn service_day_origin(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default());
    let local_noon = tz
        .from_local_datetime(&noon)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&noon));
    local_noon.with_timezone(&Utc) - Duration::hours(12)
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}
