//! Nearest-departure resolution.
//!
//! This module answers "what can I board near here, soon, that takes me
//! toward where I am going?" against a single catalog generation.

mod config;
mod rank;
mod resolve;


pub use config::ResolverConfig;
pub use rank::{compare_departures, rank_departures};
pub use resolve::{Departure, DepartureQuery, DepartureResolver, Direction};
