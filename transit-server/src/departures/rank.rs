//! Ordering of resolved departures.
//!
//! Walking distance matters most to someone standing at the origin, so the
//! nearest stop wins; among equally near stops the earliest departure wins.

use std::cmp::Ordering;

use super::resolve::Departure;

/// Total order used for departure results.
///
/// Departures are ordered by:
/// 1. Distance from the origin to the stop (nearer first)
/// 2. Departure instant (earlier first)
/// 3. Trip id
/// 4. Stop sequence
pub fn compare_departures(a: &Departure, b: &Departure) -> Ordering {
    a.distance_m
        .total_cmp(&b.distance_m)
        .then_with(|| a.departure_time.cmp(&b.departure_time))
        .then_with(|| a.trip.cmp(&b.trip))
        .then_with(|| a.stop_sequence.cmp(&b.stop_sequence))
}

/// Sort departures best-first and keep at most `limit`.
pub fn rank_departures(mut departures: Vec<Departure>, limit: usize) -> Vec<Departure> {
    departures.sort_by(compare_departures);
    departures.truncate(limit);
    departures
}
