//! Trip detail assembly.
//!
//! Joins a trip's stop times with stop names and positions and resolves its
//! schedule onto a concrete service date.

use chrono::{DateTime, NaiveDate, Utc};

use crate::catalog::{Catalog, Route};
use crate::domain::{Coordinates, StopId, TripId, service_day_origin};

/// Error from trip lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TripError {
    #[error("trip {0} not found")]
    NotFound(String),
}

/// A trip with its full stop sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct TripDetails {
    pub trip_id: TripId,
    pub route: Route,
    pub headsign: String,
    pub service_date: NaiveDate,
    /// Ordered by stop sequence.
    pub stops: Vec<TripStop>,
}

/// One stop of a trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripStop {
    pub stop: StopId,
    pub name: String,
    pub coordinates: Coordinates,
    pub sequence: u32,
    pub arrival_time: DateTime<Utc>,
    pub departure_time: DateTime<Utc>,
}

/// Look up `trip_id` and resolve its schedule on `service_date`.
///
/// The service date is taken as given; whether the trip actually runs that
/// day is not checked.
pub fn trip_details(
    catalog: &Catalog,
    trip_id: &str,
    service_date: NaiveDate,
) -> Result<TripDetails, TripError> {
    let trip = catalog
        .trip(trip_id)
        .ok_or_else(|| TripError::NotFound(trip_id.to_string()))?;
    let route = catalog
        .route(trip.route.as_str())
        .cloned()
        .unwrap_or_else(|| Route::bare(trip.route.clone()));
    let origin = service_day_origin(service_date, catalog.timezone());

    let stops = trip
        .stop_times
        .iter()
        .filter_map(|st| {
            let stop = catalog.stop(st.stop.as_str())?;
            Some(TripStop {
                stop: stop.id.clone(),
                name: stop.name.clone(),
                coordinates: stop.coordinates,
                sequence: st.sequence,
                arrival_time: st.arrival.on(origin),
                departure_time: st.departure.on(origin),
            })
        })
        .collect();

    Ok(TripDetails {
        trip_id: trip.id.clone(),
        route,
        headsign: trip.headsign.clone(),
        service_date,
        stops,
    })
}
