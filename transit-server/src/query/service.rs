//! Request-level entry points.
//!
//! [`QueryService`] validates raw parameters, takes the current catalog
//! generation and hands the work to the resolver or the trip assembler. It
//! holds no business rules of its own.

use chrono::Utc;

use crate::catalog::CatalogHandle;
use crate::departures::{DepartureQuery, DepartureResolver, ResolverConfig};
use crate::trips::trip_details;

use super::error::QueryError;
use super::params::{RawDepartureParams, RawTripParams};
use super::response::{DepartureResponse, TripResponse};

/// Query facade for one city.
pub struct QueryService {
    catalogs: CatalogHandle,
    city: String,
    config: ResolverConfig,
}

impl QueryService {
    pub fn new(catalogs: CatalogHandle, city: impl Into<String>, config: ResolverConfig) -> Self {
        Self {
            catalogs,
            city: city.into(),
            config,
        }
    }

    /// The supported city.
    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn catalogs(&self) -> &CatalogHandle {
        &self.catalogs
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Closest departures toward a destination.
    ///
    /// Parameters are validated before the city so that a malformed request
    /// is reported as such whatever city it names.
    pub async fn closest_departures(
        &self,
        city: &str,
        params: &RawDepartureParams,
    ) -> Result<Vec<DepartureResponse>, QueryError> {
        let generation = self.catalogs.current();
        let params = params.validate(generation.catalog.timezone())?;
        self.check_city(city)?;

        let query = DepartureQuery {
            origin: params.origin,
            destination: params.destination,
            start_time: params.start_time,
            limit: self.config.effective_limit(params.limit),
        };
        let departures =
            DepartureResolver::new(&generation.catalog, &generation.index, &self.config)
                .resolve(&query);

        Ok(departures.iter().map(DepartureResponse::from).collect())
    }

    /// Full details of one trip.
    pub async fn trip(
        &self,
        city: &str,
        trip_id: &str,
        params: &RawTripParams,
    ) -> Result<TripResponse, QueryError> {
        self.check_city(city)?;
        let generation = self.catalogs.current();
        let date = params.service_date(generation.catalog.timezone(), Utc::now())?;
        let details = trip_details(&generation.catalog, trip_id, date)?;
        Ok(TripResponse::from(&details))
    }

    fn check_city(&self, city: &str) -> Result<(), QueryError> {
        if city.eq_ignore_ascii_case(&self.city) {
            Ok(())
        } else {
            Err(QueryError::UnsupportedCity {
                requested: city.to_string(),
                supported: self.city.clone(),
            })
        }
    }
}
