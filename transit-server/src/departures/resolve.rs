//! Nearest upcoming departures toward a destination.
//!
//! Given an origin, a destination and a start time, the resolver walks
//! outward from the origin stop by stop and collects departures inside the
//! look-ahead window from trips that get closer to the destination after
//! leaving the stop. All work happens against one immutable catalog
//! generation; nothing here performs I/O.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, trace};

use crate::catalog::{Catalog, Stop, Trip};
use crate::domain::{Coordinates, RouteId, ScheduleTime, StopId, TripId, service_day_origin};
use crate::spatial::{NearbyStop, StopIndex};

use super::config::ResolverConfig;
use super::rank::rank_departures;

/// A departure lookup.
#[derive(Debug, Clone)]
pub struct DepartureQuery {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub start_time: DateTime<Utc>,
    /// Clamped to [`ResolverConfig::max_limit`].
    pub limit: usize,
}

/// How a departure relates to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// A later stop on the trip is closer to the destination.
    TowardDestination,
    /// Origin and destination coincide, so no direction applies.
    Undirected,
}

/// One boardable departure near the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub trip: TripId,
    pub route: RouteId,
    pub headsign: String,
    pub stop: StopId,
    pub stop_name: String,
    pub stop_coordinates: Coordinates,
    pub stop_sequence: u32,
    pub arrival_time: DateTime<Utc>,
    pub departure_time: DateTime<Utc>,
    /// Great-circle distance from the origin to the stop in meters.
    pub distance_m: f64,
    pub direction: Direction,
}

/// A service date whose trips may depart inside the query window.
#[derive(Debug, Clone, Copy)]
struct ServiceDay {
    date: NaiveDate,
    origin: DateTime<Utc>,
    /// Schedule offsets on this day that fall inside the window.
    from: ScheduleTime,
    to: ScheduleTime,
}

/// Per-query state shared by every stop examined.
#[derive(Debug)]
struct Search {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    destination: Coordinates,
    direction: Direction,
    days: Vec<ServiceDay>,
}

/// Departure resolver over one catalog generation.
pub struct DepartureResolver<'a> {
    catalog: &'a Catalog,
    index: &'a StopIndex,
    config: &'a ResolverConfig,
}

impl<'a> DepartureResolver<'a> {
    pub fn new(catalog: &'a Catalog, index: &'a StopIndex, config: &'a ResolverConfig) -> Self {
        Self {
            catalog,
            index,
            config,
        }
    }

    /// Find up to `query.limit` departures, best first.
    ///
    /// An empty result is not an error: it means nothing suitable departs
    /// within the window.
    pub fn resolve(&self, query: &DepartureQuery) -> Vec<Departure> {
        let limit = query.limit.min(self.config.max_limit);
        if limit == 0 || self.index.is_empty() {
            return Vec::new();
        }

        let end = query.start_time + self.config.look_ahead();
        let search = Search {
            start: query.start_time,
            end,
            destination: query.destination,
            direction: if query.origin == query.destination {
                Direction::Undirected
            } else {
                Direction::TowardDestination
            },
            days: self.service_days(query.start_time, end),
        };

        let mut candidates = self
            .index
            .nearest_stops(&query.origin, self.config.nearest_stops);
        candidates.truncate(self.config.max_candidate_stops);
        let mut expanded = false;
        let mut found = Vec::new();
        let mut last_distance: Option<f64> = None;
        let mut examined = 0;

        while examined <= candidates.len() {
            if examined == candidates.len() {
                if expanded || found.len() >= limit {
                    break;
                }
                expanded = true;
                self.expand(&mut candidates, &query.origin);
                continue;
            }

            let nearby = &candidates[examined];
            // Everything gathered so far is at least as near as this stop.
            if found.len() >= limit && last_distance.is_some_and(|d| nearby.distance_m > d) {
                break;
            }
            examined += 1;
            last_distance = Some(nearby.distance_m);

            let Some(stop) = self.catalog.stop(nearby.stop.as_str()) else {
                continue;
            };
            let before = found.len();
            self.collect_at_stop(&search, stop, nearby, &mut found);
            trace!(
                stop = %stop.id,
                distance_m = nearby.distance_m,
                departures = found.len() - before,
                "Examined stop"
            );
        }

        debug!(
            stops_examined = examined,
            expanded,
            candidates = found.len(),
            limit,
            "Resolved departures"
        );

        rank_departures(found, limit)
    }

    /// Add stops within the search radius that are not candidates yet.
    fn expand(&self, candidates: &mut Vec<NearbyStop>, origin: &Coordinates) {
        let room = self
            .config
            .max_candidate_stops
            .saturating_sub(candidates.len());
        if room == 0 {
            return;
        }
        let known: HashSet<StopId> = candidates.iter().map(|c| c.stop.clone()).collect();
        let extra: Vec<NearbyStop> = self
            .index
            .within_radius(origin, self.config.max_search_radius_m)
            .into_iter()
            .filter(|c| !known.contains(&c.stop))
            .take(room)
            .collect();
        trace!(added = extra.len(), "Expanded candidate stops by radius");
        candidates.extend(extra);
    }

    /// Service dates whose schedule can place a departure in
    /// `[start, end]`.
    ///
    /// Schedule times may run past 24:00, so trips of earlier service dates
    /// can still be departing; how far back to look follows from the latest
    /// departure offset in the catalog.
    fn service_days(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<ServiceDay> {
        let tz = self.catalog.timezone();
        let latest = self.catalog.latest_departure();
        let days_back = i64::from(latest.seconds() / 86_400) + 1;

        let first = start.with_timezone(&tz).date_naive() - Duration::days(days_back);
        // A DST change can start the next service day before local midnight.
        let last = end.with_timezone(&tz).date_naive() + Duration::days(1);

        first
            .iter_days()
            .take_while(|date| *date <= last)
            .filter_map(|date| {
                let origin = service_day_origin(date, tz);
                let from = offset_seconds(origin, start).max(0);
                let to = offset_seconds(origin, end).min(i64::from(latest.seconds()));
                if to < 0 || from > to {
                    return None;
                }
                Some(ServiceDay {
                    date,
                    origin,
                    from: ScheduleTime::from_seconds(u32::try_from(from).ok()?),
                    to: ScheduleTime::from_seconds(u32::try_from(to).ok()?),
                })
            })
            .collect()
    }

    /// Admissible departures from `stop` on every service day of the search.
    fn collect_at_stop(
        &self,
        search: &Search,
        stop: &Stop,
        nearby: &NearbyStop,
        found: &mut Vec<Departure>,
    ) {
        for day in &search.days {
            self.collect_on_day(search, stop, nearby, day, found);
        }
    }

    fn collect_on_day(
        &self,
        search: &Search,
        stop: &Stop,
        nearby: &NearbyStop,
        day: &ServiceDay,
        found: &mut Vec<Departure>,
    ) {
        for visit in self.catalog.visits_between(&stop.id, day.from, day.to) {
            let Some(trip) = self.catalog.trip(visit.trip.as_str()) else {
                continue;
            };
            if !self.catalog.calendar().is_active(&trip.service, day.date) {
                continue;
            }
            let stop_time = &trip.stop_times[visit.position];
            let departure_time = stop_time.departure.on(day.origin);
            if departure_time < search.start || departure_time > search.end {
                continue;
            }
            if search.direction == Direction::TowardDestination
                && !self.heads_toward(trip, visit.position, &stop.coordinates, &search.destination)
            {
                continue;
            }
            found.push(Departure {
                trip: trip.id.clone(),
                route: trip.route.clone(),
                headsign: trip.headsign.clone(),
                stop: stop.id.clone(),
                stop_name: stop.name.clone(),
                stop_coordinates: stop.coordinates,
                stop_sequence: stop_time.sequence,
                arrival_time: stop_time.arrival.on(day.origin),
                departure_time,
                distance_m: nearby.distance_m,
                direction: search.direction,
            });
        }
    }

    /// Whether some stop after `position` on `trip` is strictly closer to
    /// `destination` than `here`.
    fn heads_toward(
        &self,
        trip: &Trip,
        position: usize,
        here: &Coordinates,
        destination: &Coordinates,
    ) -> bool {
        let current = here.distance_m(destination);
        trip.stop_times[position + 1..]
            .iter()
            .filter_map(|st| self.catalog.stop(st.stop.as_str()))
            .any(|later| later.coordinates.distance_m(destination) < current)
    }
}

/// Whole seconds from `origin` to `instant`, rounded toward the past.
fn offset_seconds(origin: DateTime<Utc>, instant: DateTime<Utc>) -> i64 {
    let delta = instant - origin;
    let seconds = delta.num_seconds();
    if delta < Duration::seconds(seconds) {
        seconds - 1
    } else {
        seconds
    }
}
