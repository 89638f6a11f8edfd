//! Web layer for the public transport API.
//!
//! Provides the HTTP endpoints for closest departures and trip details.

mod dto;
mod routes;
mod state;


pub use dto::ErrorResponse;
pub use routes::{AppError, create_router};
pub use state::AppState;
