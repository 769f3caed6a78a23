//! Health check endpoints and monitoring
//!
//! This module provides health check functionality for the rating service,
//! including readiness and liveness probes.

use crate::rating::EventStatus;
use crate::service::app::AppState;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Events count as stale after this many missed refresh intervals
const STALE_AFTER_INTERVALS: u32 = 3;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Value reported on the health status gauge
    pub fn gauge_value(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional message when not healthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Number of configured events
    pub tracked_events: usize,
    /// Configured events that have published ratings
    pub events_with_results: usize,
    /// Rated teams summed over all events
    pub rated_teams: usize,
    /// Most recent successful publish across events
    pub last_success_at: Option<DateTime<Utc>>,
    /// Service uptime information
    pub uptime_info: String,
}

impl HealthCheck {
    /// Perform a comprehensive health check of the service
    pub async fn check(app_state: Arc<AppState>) -> Result<Self> {
        let mut checks = Vec::new();
        let mut overall_status = HealthStatus::Healthy;

        let service_check = Self::check_service_running(&app_state).await;
        if service_check.status != HealthStatus::Healthy {
            overall_status = HealthStatus::Unhealthy;
        }
        checks.push(service_check);

        let statuses = app_state.board().statuses()?;

        for check in [
            Self::check_board(&app_state, &statuses),
            Self::check_provider(&app_state, &statuses),
        ] {
            if check.status == HealthStatus::Unhealthy {
                overall_status = HealthStatus::Unhealthy;
            } else if check.status == HealthStatus::Degraded
                && overall_status == HealthStatus::Healthy
            {
                overall_status = HealthStatus::Degraded;
            }
            checks.push(check);
        }

        let metrics = app_state.metrics();
        metrics.update_health_status(overall_status.gauge_value());
        for check in &checks {
            metrics.update_component_health(&check.name, check.status == HealthStatus::Healthy);
        }

        let stats = Self::gather_service_stats(&app_state, &statuses);

        Ok(HealthCheck {
            status: overall_status,
            service: app_state.config().service.name.clone(),
            version: crate::VERSION.to_string(),
            timestamp: Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if app_state.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness check - every configured event has published ratings
    pub async fn readiness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if !app_state.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }

        let statuses = app_state.board().statuses()?;
        let missing = Self::events_without_results(&app_state, &statuses);
        if missing.is_empty() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Check if service is running
    async fn check_service_running(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = if app_state.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn events_without_results(app_state: &AppState, statuses: &[EventStatus]) -> Vec<String> {
        app_state
            .config()
            .data
            .events
            .iter()
            .filter(|code| {
                !statuses
                    .iter()
                    .any(|s| &s.event_code == *code && s.generation.is_some())
            })
            .cloned()
            .collect()
    }

    /// Check that every configured event has fresh ratings
    fn check_board(app_state: &AppState, statuses: &[EventStatus]) -> ComponentCheck {
        let start = std::time::Instant::now();
        let mut problems = Vec::new();

        let missing = Self::events_without_results(app_state, statuses);
        if !missing.is_empty() {
            problems.push(format!("No ratings yet for {}", missing.join(", ")));
        }

        if let Some(interval) = app_state.config().refresh_interval() {
            let max_age = interval * STALE_AFTER_INTERVALS;
            let now = Utc::now();
            let stale: Vec<&str> = statuses
                .iter()
                .filter(|s| {
                    s.last_success_at.is_some_and(|at| {
                        (now - at).to_std().map_or(false, |age| age > max_age)
                    })
                })
                .map(|s| s.event_code.as_str())
                .collect();

            if !stale.is_empty() {
                problems.push(format!("Stale ratings for {}", stale.join(", ")));
            }
        }

        let (status, message) = if problems.is_empty() {
            (HealthStatus::Healthy, None)
        } else {
            (HealthStatus::Degraded, Some(problems.join("; ")))
        };

        ComponentCheck {
            name: "board".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Check whether the latest refresh of any configured event failed
    fn check_provider(app_state: &AppState, statuses: &[EventStatus]) -> ComponentCheck {
        let start = std::time::Instant::now();
        let configured = &app_state.config().data.events;

        let failing: Vec<String> = statuses
            .iter()
            .filter(|s| configured.contains(&s.event_code))
            .filter_map(|s| {
                s.last_failure
                    .as_ref()
                    .map(|f| format!("{}: {}", s.event_code, f.message))
            })
            .collect();

        let (status, message) = if failing.is_empty() {
            (HealthStatus::Healthy, None)
        } else {
            error!("Latest refresh failed for {} event(s)", failing.len());
            (HealthStatus::Degraded, Some(failing.join("; ")))
        };

        ComponentCheck {
            name: "provider".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Gather current service statistics
    fn gather_service_stats(app_state: &AppState, statuses: &[EventStatus]) -> ServiceStats {
        let tracked_events = app_state.config().data.events.len();
        let missing = Self::events_without_results(app_state, statuses).len();
        let uptime = Utc::now() - app_state.started_at();

        ServiceStats {
            tracked_events,
            events_with_results: tracked_events - missing,
            rated_teams: statuses.iter().map(|s| s.rated_teams).sum(),
            last_success_at: statuses.iter().filter_map(|s| s.last_success_at).max(),
            uptime_info: format!("Up {}s", uptime.num_seconds().max(0)),
        }
    }
}

/// Convert health check to JSON string
impl HealthCheck {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}
