//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::query::{
    DepartureResponse, ErrorKind, QueryError, RawDepartureParams, RawTripParams, TripResponse,
};

use super::dto::ErrorResponse;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .route(
            "/public_transport/city/:city/closest_departures",
            get(closest_departures),
        )
        .route(
            "/public_transport/city/:city/closest_departures/",
            get(closest_departures),
        )
        .route("/public_transport/city/:city/trip/:trip_id", get(trip))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn welcome() -> &'static str {
    "Welcome to the Public Transport API for Wrocław!"
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Closest departures from a start point toward an end point.
async fn closest_departures(
    State(state): State<AppState>,
    Path(city): Path<String>,
    params: Result<Query<RawDepartureParams>, QueryRejection>,
) -> Result<Json<Vec<DepartureResponse>>, AppError> {
    let Query(params) = params?;
    let departures = state.queries.closest_departures(&city, &params).await?;
    Ok(Json(departures))
}

/// Every stop of one trip on a service date.
async fn trip(
    State(state): State<AppState>,
    Path((city, trip_id)): Path<(String, String)>,
    params: Result<Query<RawTripParams>, QueryRejection>,
) -> Result<Json<TripResponse>, AppError> {
    let Query(params) = params?;
    let trip = state.queries.trip(&city, &trip_id, &params).await?;
    Ok(Json(trip))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        let message = e.to_string();
        match e.kind() {
            ErrorKind::Validation => AppError::BadRequest { message },
            ErrorKind::NotFound => AppError::NotFound { message },
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
        };

        warn!(status = status.as_u16(), error = %message, "Request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
