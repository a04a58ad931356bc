//! HTTP API handlers and routes using axum.

use crate::protocol::ErrorReply;
use crate::ws_server::ws_handler;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use dispatcher::Dispatcher;
use model::ValidationError;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Application state shared across handlers.
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Flipped once on shutdown; every open stream handler watches it.
    pub shutdown: watch::Receiver<bool>,
}

/// Create the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/sites", get(sites_handler))
        .route("/vehicles", get(vehicles_handler))
        .route(
            "/appointments/{user_type}/{control_type}/{vehicle_type}/{organism}/{site}/{start_date}/{end_date}",
            get(appointments_handler),
        )
        .route("/appointments/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Readiness and counters.
/// GET /health
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ready = state.dispatcher.ready();
    let (stored_keys, stored_slots) = state.dispatcher.store_stats();
    Json(HealthResponse {
        status: if ready { "ok" } else { "starting" },
        ready,
        stored_keys,
        stored_slots,
        subscriptions: state.dispatcher.subscription_count(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    ready: bool,
    stored_keys: usize,
    stored_slots: usize,
    subscriptions: usize,
}

/// Current organism/site enumeration.
/// GET /sites
async fn sites_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.dispatcher.sites())
}

/// Current vehicle-type enumeration.
/// GET /vehicles
async fn vehicles_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.dispatcher.vehicle_types())
}

/// Stored slots for one category within a date window (end exclusive).
/// GET /appointments/{user_type}/{control_type}/{vehicle_type}/{organism}/{site}/{start_date}/{end_date}
async fn appointments_handler(
    State(state): State<Arc<AppState>>,
    Path((user_type, control_type, vehicle_type, organism, site, start_date, end_date)): Path<(
        String,
        String,
        String,
        String,
        String,
        String,
        String,
    )>,
) -> Result<impl IntoResponse, ApiError> {
    let slots = state.dispatcher.query(
        &user_type,
        &control_type,
        &vehicle_type,
        &organism,
        &site,
        &start_date,
        &end_date,
    )?;
    Ok(Json(slots))
}

// ============================================================================
// Error Handling
// ============================================================================

/// API error types.
#[derive(Debug)]
pub enum ApiError {
    /// Bad client input; the message is safe to return verbatim.
    Validation(ValidationError),
    /// Anything unexpected; detail stays in the logs.
    #[allow(dead_code)]
    Internal,
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, reply) = match self {
            ApiError::Validation(err) => {
                (StatusCode::BAD_REQUEST, ErrorReply::validation(err.to_string()))
            }
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, ErrorReply::internal()),
        };
        (status, Json(reply)).into_response()
    }
}
