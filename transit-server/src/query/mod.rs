//! Query service facade.
//!
//! Sits between the HTTP layer and the domain: validates raw request
//! parameters, runs them against the current catalog generation and
//! shapes the results for serialization.

mod error;
mod params;
mod response;
mod service;

pub use error::{ErrorKind, QueryError};
pub use params::{DepartureParams, RawDepartureParams, RawTripParams};
pub use response::{
    CoordinatesResponse, DepartureResponse, DepartureStopResponse, TripResponse,
    TripStopResponse, format_instant,
};
pub use service::QueryService;
