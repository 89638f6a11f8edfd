//! Validating catalog construction.
//!
//! Rows are added one at a time so the importer can attach file and line
//! information to each rejection. Cross-row rules (route and service
//! references, stop ordering and timing) are checked in [`CatalogBuilder::build`].

use std::collections::{BTreeMap, HashMap};

use chrono_tz::Tz;

use crate::domain::{Coordinates, RouteId, ScheduleTime, ServiceId, StopId, TripId};

use super::calendar::ServiceCalendar;
use super::error::CatalogError;
use super::model::{Route, Stop, StopTime, StopVisit, Trip};
use super::Catalog;

/// Accumulates feed rows into a [`Catalog`].
///
/// Stops and trips must be added before the stop times that reference them.
#[derive(Debug)]
pub struct CatalogBuilder {
    timezone: Tz,
    stops: BTreeMap<StopId, Stop>,
    /// `None` when the feed has no `routes.txt`.
    routes: Option<BTreeMap<RouteId, Route>>,
    trips: BTreeMap<TripId, Trip>,
    calendar: ServiceCalendar,
}

impl CatalogBuilder {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            stops: BTreeMap::new(),
            routes: None,
            trips: BTreeMap::new(),
            calendar: ServiceCalendar::Unrestricted,
        }
    }

    /// Override the feed timezone (e.g. from `agency.txt`).
    pub fn set_timezone(&mut self, timezone: Tz) {
        self.timezone = timezone;
    }

    pub fn set_calendar(&mut self, calendar: ServiceCalendar) {
        self.calendar = calendar;
    }

    /// Add a stop. Coordinates are validated here.
    pub fn add_stop(
        &mut self,
        id: StopId,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), CatalogError> {
        if self.stops.contains_key(&id) {
            return Err(CatalogError::DuplicateStop(id));
        }
        let coordinates = Coordinates::new(latitude, longitude).map_err(|source| {
            CatalogError::InvalidStopCoordinates {
                stop: id.clone(),
                source,
            }
        })?;
        self.stops.insert(
            id.clone(),
            Stop {
                id,
                name: name.into(),
                coordinates,
            },
        );
        Ok(())
    }

    /// Add a route. Once any route is added, trips must reference known routes.
    pub fn add_route(&mut self, route: Route) -> Result<(), CatalogError> {
        let routes = self.routes.get_or_insert_with(BTreeMap::new);
        if routes.contains_key(&route.id) {
            return Err(CatalogError::DuplicateRoute(route.id));
        }
        routes.insert(route.id.clone(), route);
        Ok(())
    }

    /// Declare that the feed carries a routes table, even an empty one.
    pub fn expect_routes(&mut self) {
        self.routes.get_or_insert_with(BTreeMap::new);
    }

    pub fn add_trip(
        &mut self,
        id: TripId,
        route: RouteId,
        service: ServiceId,
        headsign: impl Into<String>,
    ) -> Result<(), CatalogError> {
        if self.trips.contains_key(&id) {
            return Err(CatalogError::DuplicateTrip(id));
        }
        self.trips.insert(
            id.clone(),
            Trip {
                id,
                route,
                service,
                headsign: headsign.into(),
                stop_times: Vec::new(),
            },
        );
        Ok(())
    }

    /// Add a stop time to an existing trip.
    ///
    /// The stop id is replaced by the catalog's own copy so every stop time
    /// at a stop shares one allocation.
    pub fn add_stop_time(
        &mut self,
        trip: &TripId,
        mut stop_time: StopTime,
    ) -> Result<(), CatalogError> {
        let Some((stop, _)) = self.stops.get_key_value(&stop_time.stop) else {
            return Err(CatalogError::UnknownStop {
                trip: trip.clone(),
                stop: stop_time.stop,
            });
        };
        stop_time.stop = stop.clone();
        let entry = self
            .trips
            .get_mut(trip)
            .ok_or_else(|| CatalogError::UnknownTrip(trip.clone()))?;
        entry.stop_times.push(stop_time);
        Ok(())
    }

    /// Validate cross-row rules and build the read-only catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let CatalogBuilder {
            timezone,
            stops,
            routes,
            mut trips,
            calendar,
        } = self;

        let routes = match routes {
            Some(routes) => {
                for trip in trips.values() {
                    if !routes.contains_key(&trip.route) {
                        return Err(CatalogError::UnknownRoute {
                            trip: trip.id.clone(),
                            route: trip.route.clone(),
                        });
                    }
                }
                routes
            }
            None => trips
                .values()
                .map(|t| (t.route.clone(), Route::bare(t.route.clone())))
                .collect(),
        };

        for trip in trips.values_mut() {
            if !calendar.knows(&trip.service) {
                return Err(CatalogError::UnknownService {
                    trip: trip.id.clone(),
                    service: trip.service.clone(),
                });
            }
            trip.stop_times.sort_by_key(|st| st.sequence);
            validate_stop_times(trip)?;
        }

        let mut visits: HashMap<StopId, Vec<StopVisit>> = HashMap::new();
        let mut latest_departure = ScheduleTime::from_seconds(0);
        for trip in trips.values() {
            // The last stop time ends the trip; nobody departs from it.
            let boardable = trip.stop_times.len().saturating_sub(1);
            for (position, st) in trip.stop_times.iter().enumerate().take(boardable) {
                latest_departure = latest_departure.max(st.departure);
                visits.entry(st.stop.clone()).or_default().push(StopVisit {
                    trip: trip.id.clone(),
                    position,
                    departure: st.departure,
                });
            }
        }
        for list in visits.values_mut() {
            list.sort_by(|a, b| {
                a.departure
                    .cmp(&b.departure)
                    .then_with(|| a.trip.cmp(&b.trip))
                    .then_with(|| a.position.cmp(&b.position))
            });
        }

        Ok(Catalog {
            timezone,
            stops,
            routes,
            trips,
            calendar,
            visits,
            latest_departure,
        })
    }
}

/// Check sequence uniqueness and timing monotonicity of a sorted trip.
fn validate_stop_times(trip: &Trip) -> Result<(), CatalogError> {
    for st in &trip.stop_times {
        if st.arrival > st.departure {
            return Err(CatalogError::InconsistentTimes {
                trip: trip.id.clone(),
                sequence: st.sequence,
                reason: "arrival is after departure",
            });
        }
    }
    for pair in trip.stop_times.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.sequence == next.sequence {
            return Err(CatalogError::DuplicateSequence {
                trip: trip.id.clone(),
                sequence: next.sequence,
            });
        }
        if prev.departure > next.arrival {
            return Err(CatalogError::InconsistentTimes {
                trip: trip.id.clone(),
                sequence: next.sequence,
                reason: "arrival is before the previous departure",
            });
        }
    }
    Ok(())
}
