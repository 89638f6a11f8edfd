//! Public transport query server.
//!
//! Answers two questions over a city's static GTFS schedule: "which
//! vehicles leave soonest from the stops nearest to me, heading toward
//! where I want to go?" and "what does this trip look like end to end?"

pub mod catalog;
pub mod departures;
pub mod domain;
pub mod query;
pub mod spatial;
pub mod trips;
pub mod web;
