//! HTTP endpoints for ratings, health checks and Prometheus metrics
//!
//! This module builds the Axum router served by the rating service.

use crate::analysis::TeamReport;
use crate::error::RatingsError;
use crate::metrics;
use crate::rating::EventStatus;
use crate::service::app::AppState;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::types::{EventRatings, TeamNumber};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Create the Axum router with all endpoints
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/alive", get(alive_handler))
        .route("/metrics", get(metrics_handler))
        .route("/stats", get(stats_handler))
        .route("/events", get(events_handler))
        .route("/events/{code}", get(event_handler))
        .route("/events/{code}/opr", get(opr_handler))
        .route(
            "/events/{code}/schedule-strength",
            get(schedule_strength_handler),
        )
        .route("/events/{code}/teams/{team}", get(team_handler))
        .route("/events/{code}/refresh", post(refresh_handler))
        .with_state(app_state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Map a failed refresh or lookup to an HTTP status
fn status_for(error: &anyhow::Error) -> StatusCode {
    match error.downcast_ref::<RatingsError>() {
        Some(RatingsError::EventNotFound { .. }) | Some(RatingsError::TeamNotFound { .. }) => {
            StatusCode::NOT_FOUND
        }
        Some(RatingsError::InvalidSnapshot { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(RatingsError::ProviderFailed { .. }) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Latest published ratings of an event, or the response to send instead
fn published(app_state: &AppState, event_code: &str) -> Result<Arc<EventRatings>, Response> {
    match app_state.board().latest(event_code) {
        Ok(Some(ratings)) => Ok(ratings),
        Ok(None) => {
            let e = anyhow::Error::from(RatingsError::EventNotFound {
                event_code: event_code.to_string(),
            });
            Err(error_response(status_for(&e), e.to_string()))
        }
        Err(e) => {
            error!("Failed to read ratings for {}: {}", event_code, e);
            Err(error_response(status_for(&e), e.to_string()))
        }
    }
}

/// Root endpoint handler - shows service information
async fn root_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let scheduler = app_state.scheduler();
    Json(json!({
        "service": app_state.config().service.name,
        "version": crate::VERSION,
        "provider": scheduler.provider().name(),
        "calculator": scheduler.calculator().config(),
        "endpoints": [
            "/health",
            "/ready",
            "/alive",
            "/metrics",
            "/stats",
            "/events",
            "/events/{code}",
            "/events/{code}/opr",
            "/events/{code}/schedule-strength",
            "/events/{code}/teams/{team}",
            "/events/{code}/refresh"
        ]
    }))
}

/// Lightweight health check endpoint handler
async fn health_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Health check requested");

    let status = HealthCheck::liveness_check(app_state.clone())
        .await
        .unwrap_or(HealthStatus::Unhealthy);
    let code = match status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    (
        code,
        Json(json!({
            "status": status,
            "service": app_state.config().service.name,
            "version": crate::VERSION
        })),
    )
}

/// Readiness check endpoint handler
async fn ready_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Readiness check requested");

    match HealthCheck::readiness_check(app_state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Ready"),
        Ok(HealthStatus::Degraded) => (StatusCode::OK, "Degraded but ready"),
        Ok(HealthStatus::Unhealthy) => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
        Err(e) => {
            error!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Not ready")
        }
    }
}

/// Liveness check endpoint handler
async fn alive_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    match HealthCheck::liveness_check(app_state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Alive"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "Not alive"),
    }
}

/// Prometheus metrics endpoint handler
async fn metrics_handler(State(app_state): State<Arc<AppState>>) -> Response {
    match metrics::render_text(&app_state.metrics()) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, metrics::text_content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}

/// Detailed service statistics endpoint handler
async fn stats_handler(State(app_state): State<Arc<AppState>>) -> Response {
    match HealthCheck::check(app_state).await {
        Ok(health) => (StatusCode::OK, Json(health)).into_response(),
        Err(e) => {
            error!("Failed to get stats: {}", e);
            error_response(StatusCode::SERVICE_UNAVAILABLE, "Failed to get service stats")
        }
    }
}

/// Configured events plus any refreshed manually, with their board status
async fn events_handler(State(app_state): State<Arc<AppState>>) -> Response {
    let mut statuses = match app_state.board().statuses() {
        Ok(statuses) => statuses,
        Err(e) => return error_response(status_for(&e), e.to_string()),
    };

    for code in &app_state.config().data.events {
        if !statuses.iter().any(|s| &s.event_code == code) {
            statuses.push(EventStatus {
                event_code: code.clone(),
                generation: None,
                computed_at: None,
                last_success_at: None,
                rated_teams: 0,
                last_failure: None,
            });
        }
    }
    statuses.sort_by(|a, b| a.event_code.cmp(&b.event_code));

    Json(statuses).into_response()
}

async fn event_handler(
    State(app_state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Response {
    match published(&app_state, &code) {
        Ok(ratings) => Json(ratings.as_ref().clone()).into_response(),
        Err(response) => response,
    }
}

async fn opr_handler(State(app_state): State<Arc<AppState>>, Path(code): Path<String>) -> Response {
    match published(&app_state, &code) {
        Ok(ratings) => Json(ratings.ratings.clone()).into_response(),
        Err(response) => response,
    }
}

async fn schedule_strength_handler(
    State(app_state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Response {
    match published(&app_state, &code) {
        Ok(ratings) => Json(ratings.schedule_strength.clone()).into_response(),
        Err(response) => response,
    }
}

async fn team_handler(
    State(app_state): State<Arc<AppState>>,
    Path((code, team)): Path<(String, TeamNumber)>,
) -> Response {
    let ratings = match published(&app_state, &code) {
        Ok(ratings) => ratings,
        Err(response) => return response,
    };

    let report = TeamReport::build(team, &ratings);
    if report.is_empty() {
        let e = anyhow::Error::from(RatingsError::TeamNotFound {
            event_code: code,
            team_number: team,
        });
        return error_response(status_for(&e), e.to_string());
    }

    Json(report).into_response()
}

/// Run one refresh immediately and report its outcome
async fn refresh_handler(
    State(app_state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Response {
    if !app_state.config().data.events.contains(&code) {
        let e = anyhow::Error::from(RatingsError::EventNotFound { event_code: code });
        return error_response(status_for(&e), e.to_string());
    }

    match app_state.scheduler().refresh_event(&code).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => {
            warn!("Manual refresh of {} failed: {}", code, e);
            error_response(status_for(&e), e.to_string())
        }
    }
}
