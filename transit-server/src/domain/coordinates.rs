//! Geographic coordinates and great-circle distance.

use std::fmt;

/// Mean Earth radius used for haversine distances, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Error returned when coordinates are malformed or out of range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid coordinates: {reason}")]
pub struct InvalidCoordinates {
    reason: &'static str,
}

impl InvalidCoordinates {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A validated WGS84 position in degrees.
///
/// Latitude is always within [-90, 90] and longitude within [-180, 180].
/// Any `Coordinates` value is valid by construction.
///
/// # Examples
///
/// ```
/// use transit_server::domain::Coordinates;
///
/// let rynek = Coordinates::parse("51.1079,17.0385").unwrap();
/// assert_eq!(rynek.latitude(), 51.1079);
/// assert_eq!(rynek.longitude(), 17.0385);
///
/// assert!(Coordinates::parse("invalid").is_err());
/// assert!(Coordinates::parse("91.0,17.0").is_err());
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Create coordinates from latitude and longitude in degrees.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinates> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(InvalidCoordinates::new("must be finite numbers"));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinates::new("latitude must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinates::new(
                "longitude must be within [-180, 180]",
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse the `lat,lon` wire format.
    ///
    /// Whitespace around either number is ignored.
    pub fn parse(s: &str) -> Result<Self, InvalidCoordinates> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| InvalidCoordinates::new("expected lat,lon"))?;
        let latitude = lat
            .trim()
            .parse::<f64>()
            .map_err(|_| InvalidCoordinates::new("latitude is not a number"))?;
        let longitude = lon
            .trim()
            .parse::<f64>()
            .map_err(|_| InvalidCoordinates::new("longitude is not a number"))?;
        Self::new(latitude, longitude)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other` in meters (haversine formula).
    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_RADIUS_M * c
    }

    /// Position on the unit sphere.
    ///
    /// Straight-line (chord) distance between unit vectors grows monotonically
    /// with great-circle distance, which lets a Cartesian R-tree answer
    /// nearest-neighbour queries in haversine order.
    pub(crate) fn unit_vector(&self) -> [f64; 3] {
        let lat = self.latitude.to_radians();
        let lon = self.longitude.to_radians();
        [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
    }
}

/// Squared chord length on the unit sphere for a great-circle distance.
pub(crate) fn chord_2_for_distance(distance_m: f64) -> f64 {
    let angle = (distance_m / EARTH_RADIUS_M).min(std::f64::consts::PI);
    let chord = 2.0 * (angle / 2.0).sin();
    chord * chord
}

impl fmt::Debug for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinates({}, {})", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}
