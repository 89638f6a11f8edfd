//! R-tree over stop positions.
//!
//! Stops are stored as points on the unit sphere. Straight-line distance
//! between two such points is a monotonic function of their great-circle
//! distance, so the tree's Euclidean nearest-neighbour order is the haversine
//! order, with no distortion near the poles or the antimeridian. Reported
//! distances are recomputed with the haversine formula.

use std::cmp::Ordering;
use std::fmt;

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::catalog::Stop;
use crate::domain::{Coordinates, StopId, chord_2_for_distance};

/// Relative slack applied when comparing squared chords, so stops whose
/// haversine distance ties are not separated by rounding in the chord.
const CHORD_SLACK: f64 = 1e-9;
const CHORD_FLOOR: f64 = 1e-15;

/// A stop found by a spatial query.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStop {
    pub stop: StopId,
    /// Great-circle distance from the query point in meters.
    pub distance_m: f64,
}

#[derive(Debug, Clone)]
struct StopNode {
    stop: StopId,
    coordinates: Coordinates,
    point: [f64; 3],
}

impl RTreeObject for StopNode {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StopNode {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        let dz = self.point[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// Immutable nearest-stop index, built once per catalog generation.
pub struct StopIndex {
    tree: RTree<StopNode>,
}

impl fmt::Debug for StopIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopIndex").field("stops", &self.len()).finish()
    }
}

impl StopIndex {
    pub fn build<'a>(stops: impl IntoIterator<Item = &'a Stop>) -> Self {
        let nodes = stops
            .into_iter()
            .map(|stop| StopNode {
                stop: stop.id.clone(),
                coordinates: stop.coordinates,
                point: stop.coordinates.unit_vector(),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(nodes),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `max_results` stops closest to `origin`, nearest first.
    ///
    /// Equal distances are ordered by stop id. Every stop tied with the last
    /// place is considered before truncating, so the result does not depend
    /// on the tree's internal layout.
    pub fn nearest_stops(&self, origin: &Coordinates, max_results: usize) -> Vec<NearbyStop> {
        if max_results == 0 {
            return Vec::new();
        }
        let query = origin.unit_vector();
        let mut candidates = Vec::with_capacity(max_results);
        let mut cutoff: Option<f64> = None;
        for node in self.tree.nearest_neighbor_iter(&query) {
            let distance_2 = node.distance_2(&query);
            if cutoff.is_some_and(|c| distance_2 > c) {
                break;
            }
            candidates.push(node);
            if cutoff.is_none() && candidates.len() == max_results {
                cutoff = Some(distance_2 * (1.0 + CHORD_SLACK) + CHORD_FLOOR);
            }
        }
        let mut found = measure(origin, candidates);
        found.truncate(max_results);
        found
    }

    /// Every stop within `radius_m` meters of `origin`, nearest first.
    pub fn within_radius(&self, origin: &Coordinates, radius_m: f64) -> Vec<NearbyStop> {
        if radius_m.is_nan() || radius_m < 0.0 {
            return Vec::new();
        }
        let query = origin.unit_vector();
        let chord_2 = chord_2_for_distance(radius_m) * (1.0 + CHORD_SLACK) + CHORD_FLOOR;
        let candidates = self.tree.locate_within_distance(query, chord_2);
        let mut found = measure(origin, candidates);
        found.retain(|s| s.distance_m <= radius_m);
        found
    }
}

/// Haversine distances from `origin`, sorted by (distance, stop id).
fn measure<'a>(
    origin: &Coordinates,
    nodes: impl IntoIterator<Item = &'a StopNode>,
) -> Vec<NearbyStop> {
    let mut found: Vec<NearbyStop> = nodes
        .into_iter()
        .map(|node| NearbyStop {
            stop: node.stop.clone(),
            distance_m: origin.distance_m(&node.coordinates),
        })
        .collect();
    found.sort_by(compare_nearby);
    found
}

fn compare_nearby(a: &NearbyStop, b: &NearbyStop) -> Ordering {
    a.distance_m
        .total_cmp(&b.distance_m)
        .then_with(|| a.stop.cmp(&b.stop))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{destination, origin, wroclaw};

    fn stop(id: &str, lat: f64, lon: f64) -> Stop {
        Stop {
            id: StopId::new(id),
            name: id.to_string(),
            coordinates: Coordinates::new(lat, lon).unwrap(),
        }
    }

    fn ids(found: &[NearbyStop]) -> Vec<&str> {
        found.iter().map(|s| s.stop.as_str()).collect()
    }

    fn wroclaw_index() -> StopIndex {
        StopIndex::build(wroclaw().stops())
    }

    #[test]
    fn nearest_in_distance_order() {
        let index = wroclaw_index();
        let found = index.nearest_stops(&origin(), 3);
        assert_eq!(ids(&found), vec!["DOMINIKANSKI", "OPERA", "RYNEK"]);
        assert!(found[0].distance_m < 50.0);
        assert!(found.windows(2).all(|w| w[0].distance_m <= w[1].distance_m));
    }

    #[test]
    fn nearest_to_destination() {
        let index = wroclaw_index();
        let found = index.nearest_stops(&destination(), 1);
        assert_eq!(ids(&found), vec!["UNIWERSYTET"]);
    }

    #[test]
    fn more_than_available_returns_all() {
        let index = wroclaw_index();
        let found = index.nearest_stops(&origin(), 100);
        assert_eq!(found.len(), index.len());
    }

    #[test]
    fn zero_results_and_empty_index() {
        let index = wroclaw_index();
        assert!(index.nearest_stops(&origin(), 0).is_empty());

        let empty = StopIndex::build(std::iter::empty());
        assert!(empty.is_empty());
        assert!(empty.nearest_stops(&origin(), 5).is_empty());
        assert!(empty.within_radius(&origin(), 1000.0).is_empty());
    }

    #[test]
    fn null_island_still_finds_stops() {
        let index = wroclaw_index();
        let found = index.nearest_stops(&Coordinates::new(0.0, 0.0).unwrap(), 1);
        assert_eq!(found.len(), 1);
        assert!(found[0].distance_m > 5_000_000.0);
    }

    #[test]
    fn ties_broken_by_stop_id() {
        // Four stops equidistant from the origin, north/south/east/west.
        let stops = [
            stop("D", 0.0, -0.01),
            stop("B", 0.01, 0.0),
            stop("C", 0.0, 0.01),
            stop("A", -0.01, 0.0),
        ];
        let index = StopIndex::build(&stops);
        let here = Coordinates::new(0.0, 0.0).unwrap();
        assert_eq!(ids(&index.nearest_stops(&here, 2)), vec!["A", "B"]);
        assert_eq!(ids(&index.nearest_stops(&here, 4)), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn across_the_antimeridian() {
        let stops = [stop("EAST", 0.0, 179.99), stop("FAR", 0.0, 170.0)];
        let index = StopIndex::build(&stops);
        let found = index.nearest_stops(&Coordinates::new(0.0, -179.99).unwrap(), 1);
        assert_eq!(ids(&found), vec!["EAST"]);
        assert!(found[0].distance_m < 3_000.0);
    }

    #[test]
    fn within_radius_filters_by_haversine() {
        let index = wroclaw_index();
        let found = index.within_radius(&origin(), 500.0);
        assert_eq!(ids(&found), vec!["DOMINIKANSKI", "OPERA", "RYNEK"]);
        assert!(found.iter().all(|s| s.distance_m <= 500.0));

        assert!(index.within_radius(&origin(), -1.0).is_empty());
        assert!(index.within_radius(&origin(), f64::NAN).is_empty());
        assert_eq!(index.within_radius(&origin(), 50_000.0).len(), index.len());
    }
}
