//! Tuning knobs for the departure resolver.

use chrono::Duration;

/// Configuration parameters for departure lookup.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Number of nearest stops always considered.
    pub nearest_stops: usize,

    /// Upper bound on stops examined per query, including radius expansion.
    pub max_candidate_stops: usize,

    /// Radius (meters) searched beyond the nearest stops when they do not
    /// yield enough departures.
    pub max_search_radius_m: f64,

    /// How far past the start time to look for departures (minutes).
    pub look_ahead_mins: i64,

    /// Number of departures returned when the caller gives no limit.
    pub default_limit: usize,

    /// Larger requested limits are clamped to this.
    pub max_limit: usize,
}

impl ResolverConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        nearest_stops: usize,
        max_candidate_stops: usize,
        max_search_radius_m: f64,
        look_ahead_mins: i64,
        default_limit: usize,
        max_limit: usize,
    ) -> Self {
        Self {
            nearest_stops,
            max_candidate_stops,
            max_search_radius_m,
            look_ahead_mins,
            default_limit,
            max_limit,
        }
    }

    /// Returns the look-ahead window as a Duration.
    pub fn look_ahead(&self) -> Duration {
        Duration::minutes(self.look_ahead_mins)
    }

    /// Apply the limit policy to a requested limit.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            nearest_stops: 20,
            max_candidate_stops: 200,
            max_search_radius_m: 1500.0,
            look_ahead_mins: 120, // 2 hours
            default_limit: 5,
            max_limit: 50,
        }
    }
}
