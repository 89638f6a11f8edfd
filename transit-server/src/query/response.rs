//! JSON response shapes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::departures::Departure;
use crate::domain::Coordinates;
use crate::trips::{TripDetails, TripStop};

/// RFC 3339 in UTC with a `Z` suffix, whole seconds.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatesResponse {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinates> for CoordinatesResponse {
    fn from(c: Coordinates) -> Self {
        Self {
            latitude: c.latitude(),
            longitude: c.longitude(),
        }
    }
}

/// The stop a departure leaves from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartureStopResponse {
    pub id: String,
    pub name: String,
    pub coordinates: CoordinatesResponse,
    pub arrival_time: String,
    pub departure_time: String,
}

/// One element of the closest-departures array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartureResponse {
    pub trip_id: String,
    pub route_id: String,
    pub trip_headsign: String,
    pub stop: DepartureStopResponse,
    /// Meters, rounded to centimeters.
    pub distance_start_to_stop: f64,
}

impl From<&Departure> for DepartureResponse {
    fn from(d: &Departure) -> Self {
        Self {
            trip_id: d.trip.to_string(),
            route_id: d.route.to_string(),
            trip_headsign: d.headsign.clone(),
            stop: DepartureStopResponse {
                id: d.stop.to_string(),
                name: d.stop_name.clone(),
                coordinates: d.stop_coordinates.into(),
                arrival_time: format_instant(&d.arrival_time),
                departure_time: format_instant(&d.departure_time),
            },
            distance_start_to_stop: (d.distance_m * 100.0).round() / 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripStopResponse {
    pub name: String,
    pub coordinates: CoordinatesResponse,
    pub arrival_time: String,
    pub departure_time: String,
}

impl From<&TripStop> for TripStopResponse {
    fn from(s: &TripStop) -> Self {
        Self {
            name: s.name.clone(),
            coordinates: s.coordinates.into(),
            arrival_time: format_instant(&s.arrival_time),
            departure_time: format_instant(&s.departure_time),
        }
    }
}

/// Body of the trip endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripResponse {
    pub trip_id: String,
    pub route_id: String,
    pub trip_headsign: String,
    pub stops: Vec<TripStopResponse>,
}

impl From<&TripDetails> for TripResponse {
    fn from(t: &TripDetails) -> Self {
        Self {
            trip_id: t.trip_id.to_string(),
            route_id: t.route.id.to_string(),
            trip_headsign: t.headsign.clone(),
            stops: t.stops.iter().map(TripStopResponse::from).collect(),
        }
    }
}
