//! Query errors.
//!
//! Messages are part of the public API: they are returned verbatim to
//! clients in the `error` field of the response body.

use crate::trips::TripError;

/// Broad class of a [`QueryError`], used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed or unsupported.
    Validation,
    /// The request is well-formed but names something that does not exist.
    NotFound,
}

/// Errors from the query facade.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Parameter names in request-declaration order
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<&'static str>),

    #[error("Invalid coordinates format. Use lat,lon.")]
    InvalidCoordinates,

    #[error("Invalid start_time format. Use ISO8601 format.")]
    InvalidStartTime,

    #[error("Invalid limit. Use a non-negative integer.")]
    InvalidLimit,

    #[error("Invalid date format. Use YYYY-MM-DD.")]
    InvalidDate,

    #[error("Unsupported city: {requested}. Only {supported} is supported.")]
    UnsupportedCity { requested: String, supported: String },

    #[error("Trip {0} not found.")]
    TripNotFound(String),
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::TripNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Validation,
        }
    }
}

impl From<TripError> for QueryError {
    fn from(e: TripError) -> Self {
        match e {
            TripError::NotFound(id) => QueryError::TripNotFound(id),
        }
    }
}
