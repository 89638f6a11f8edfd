//! Static transit catalog.
//!
//! A [`Catalog`] is one fully validated, read-only snapshot of a city's
//! schedule: stops, routes, trips and their stop times, plus the service
//! calendar and a per-stop departure index. It is built once from a GTFS
//! feed (see [`import`]) and never mutated afterwards; reloads build a new
//! catalog and swap it in through [`CatalogHandle`].

mod builder;
mod calendar;
mod error;
pub mod import;
mod model;
mod snapshot;

#[cfg(test)]
pub(crate) mod fixtures;

use std::collections::{BTreeMap, HashMap};

use chrono_tz::Tz;

use crate::domain::{RouteId, ScheduleTime, StopId, TripId};

pub use builder::CatalogBuilder;
pub use calendar::{ServiceCalendar, ServiceCalendarBuilder, ServiceException, WeeklyPattern};
pub use error::CatalogError;
pub use model::{Route, Stop, StopTime, StopVisit, Trip};
pub use snapshot::{CatalogGeneration, CatalogHandle};

/// Immutable schedule data for one city.
#[derive(Debug)]
pub struct Catalog {
    timezone: Tz,
    stops: BTreeMap<StopId, Stop>,
    routes: BTreeMap<RouteId, Route>,
    trips: BTreeMap<TripId, Trip>,
    calendar: ServiceCalendar,
    /// Boardable stop times per stop, sorted by (departure, trip, position).
    visits: HashMap<StopId, Vec<StopVisit>>,
    latest_departure: ScheduleTime,
}

impl Catalog {
    /// Start building a catalog whose schedule times are in `timezone`.
    pub fn builder(timezone: Tz) -> CatalogBuilder {
        CatalogBuilder::new(timezone)
    }

    /// Timezone schedule times are expressed in.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn stop(&self, id: &str) -> Option<&Stop> {
        self.stops.get(id)
    }

    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.get(id)
    }

    pub fn trip(&self, id: &str) -> Option<&Trip> {
        self.trips.get(id)
    }

    /// All stops, ordered by id.
    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.values()
    }

    /// All trips, ordered by id.
    pub fn trips(&self) -> impl Iterator<Item = &Trip> {
        self.trips.values()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    pub fn calendar(&self) -> &ServiceCalendar {
        &self.calendar
    }

    /// Every boardable stop time at `stop`, ordered by departure.
    pub fn visits(&self, stop: &StopId) -> &[StopVisit] {
        self.visits.get(stop).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Boardable stop times at `stop` departing within `[from, to]`.
    ///
    /// Two binary searches over the pre-sorted visit list; never scans other
    /// stops.
    pub fn visits_between(
        &self,
        stop: &StopId,
        from: ScheduleTime,
        to: ScheduleTime,
    ) -> &[StopVisit] {
        let visits = self.visits(stop);
        if from > to {
            return &[];
        }
        let start = visits.partition_point(|v| v.departure < from);
        let end = visits.partition_point(|v| v.departure <= to);
        &visits[start..end]
    }

    /// Latest departure offset of any trip, used to decide how many earlier
    /// service days can still be running at a given instant.
    pub fn latest_departure(&self) -> ScheduleTime {
        self.latest_departure
    }
}
