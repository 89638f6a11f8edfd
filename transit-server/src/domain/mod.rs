//! Domain types for the public transport query service.
//!
//! This module contains the value types shared by the catalog, the spatial
//! index and the resolvers. All types enforce their invariants at
//! construction time, so code that receives them can trust their validity.

mod coordinates;
mod ids;
mod time;

pub use coordinates::{Coordinates, EARTH_RADIUS_M, InvalidCoordinates};
pub(crate) use coordinates::chord_2_for_distance;
pub use ids::{RouteId, ServiceId, StopId, TripId};
pub use time::{ScheduleTime, TimeError, service_day_origin};
