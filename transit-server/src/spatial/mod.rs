//! Spatial lookup of stops.
//!
//! [`StopIndex`] answers "which stops are nearest to this point" without
//! scanning the catalog. Distances reported to callers are always
//! great-circle (haversine) meters.

mod index;

pub use index::{NearbyStop, StopIndex};
