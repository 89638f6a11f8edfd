//! Catalog error types.
//!
//! Any of these aborts the import of a catalog generation. The previously
//! published generation, if any, keeps serving.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::{InvalidCoordinates, RouteId, ServiceId, StopId, TimeError, TripId};

/// Errors raised while importing or validating a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A required feed file is absent
    #[error("missing required feed file {0}")]
    MissingFile(PathBuf),

    /// Failed to read a feed file
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV syntax or type error
    #[error("{file}: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },

    /// A row that parsed but violates the catalog rules
    #[error("{file} line {line}: {source}")]
    AtRow {
        file: &'static str,
        line: u64,
        #[source]
        source: Box<CatalogError>,
    },

    #[error("invalid time {value:?}: {source}")]
    InvalidTime {
        value: String,
        #[source]
        source: TimeError,
    },

    #[error("stop {stop}: {source}")]
    InvalidStopCoordinates {
        stop: StopId,
        #[source]
        source: InvalidCoordinates,
    },

    #[error("invalid timezone {0:?}")]
    InvalidTimezone(String),

    #[error("agencies disagree on timezone: {0} and {1}")]
    ConflictingTimezones(String, String),

    #[error("invalid date {0:?}, expected YYYYMMDD")]
    InvalidDate(String),

    #[error("invalid {field} value {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("duplicate stop id {0}")]
    DuplicateStop(StopId),

    #[error("duplicate route id {0}")]
    DuplicateRoute(RouteId),

    #[error("duplicate trip id {0}")]
    DuplicateTrip(TripId),

    #[error("duplicate calendar entry for service {0}")]
    DuplicateService(ServiceId),

    #[error("duplicate calendar_dates entry for service {service} on {date}")]
    DuplicateException { service: ServiceId, date: NaiveDate },

    #[error("stop time references unknown trip {0}")]
    UnknownTrip(TripId),

    #[error("trip {trip} references unknown stop {stop}")]
    UnknownStop { trip: TripId, stop: StopId },

    #[error("trip {trip} references unknown route {route}")]
    UnknownRoute { trip: TripId, route: RouteId },

    #[error("trip {trip} references unknown service {service}")]
    UnknownService { trip: TripId, service: ServiceId },

    #[error("trip {trip} repeats stop_sequence {sequence}")]
    DuplicateSequence { trip: TripId, sequence: u32 },

    #[error("trip {trip} at stop_sequence {sequence}: {reason}")]
    InconsistentTimes {
        trip: TripId,
        sequence: u32,
        reason: &'static str,
    },

    /// The background load was cancelled or panicked
    #[error("catalog load task failed: {0}")]
    LoadTask(#[from] tokio::task::JoinError),
}

impl CatalogError {
    /// Attach the feed file and line a row-level error came from.
    pub fn at_row(self, file: &'static str, line: u64) -> Self {
        CatalogError::AtRow {
            file,
            line,
            source: Box::new(self),
        }
    }
}
