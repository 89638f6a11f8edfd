//! Data transfer objects owned by the web layer.
//!
//! Request and success bodies come from [`crate::query`]; this module only
//! adds what is specific to HTTP.

use serde::Serialize;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
