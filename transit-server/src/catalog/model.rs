//! Catalog entities.

use crate::domain::{Coordinates, RouteId, ScheduleTime, ServiceId, StopId, TripId};

/// A place where vehicles stop.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub coordinates: Coordinates,
}

/// A line, e.g. tram 3 or bus A.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: RouteId,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
}

impl Route {
    /// Route with no display metadata, used when the feed has no `routes.txt`.
    pub fn bare(id: RouteId) -> Self {
        Self {
            id,
            short_name: None,
            long_name: None,
        }
    }
}

/// A scheduled visit of a trip to a stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTime {
    pub stop: StopId,
    /// `stop_sequence` from the feed; strictly increasing within a trip.
    pub sequence: u32,
    pub arrival: ScheduleTime,
    pub departure: ScheduleTime,
}

/// One run of a vehicle along a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: TripId,
    pub route: RouteId,
    pub service: ServiceId,
    pub headsign: String,
    /// Stop times ordered by sequence.
    pub stop_times: Vec<StopTime>,
}

/// Entry of the per-stop departure index.
///
/// Points at `trip.stop_times[position]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopVisit {
    pub trip: TripId,
    pub position: usize,
    pub departure: ScheduleTime,
}
