//! Service layer for the scout-ratings service
//!
//! This module contains the application state, health checks and the HTTP
//! server exposing ratings, health and metrics.

pub mod app;
pub mod health;
pub mod server;

pub use app::AppState;
pub use health::{ComponentCheck, HealthCheck, HealthStatus, ServiceStats};
pub use server::create_router;
