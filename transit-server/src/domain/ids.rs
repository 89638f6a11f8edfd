//! Identifier types for feed entities.
//!
//! GTFS identifiers are opaque strings. Each entity kind gets its own newtype
//! so a stop id can never be passed where a trip id is expected. The inner
//! `Arc<str>` keeps clones cheap: departures and indexes copy ids freely.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

macro_rules! feed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Create an identifier from its feed representation.
            pub fn new(id: impl AsRef<str>) -> Self {
                Self(Arc::from(id.as_ref()))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(Arc::from(id))
            }
        }
    };
}

feed_id!(
    /// Identifier of a stop (`stop_id`).
    StopId
);
feed_id!(
    /// Identifier of a route (`route_id`).
    RouteId
);
feed_id!(
    /// Identifier of a trip (`trip_id`).
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_server::domain::TripId;
    ///
    /// let trip = TripId::new("3_14613060");
    /// assert_eq!(trip.as_str(), "3_14613060");
    /// assert!(TripId::new("10_1") < TripId::new("3_1")); // lexicographic
    /// ```
    TripId
);
feed_id!(
    /// Identifier of a service calendar (`service_id`).
    ServiceId
);
