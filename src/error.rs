//! Error types for the rating service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. The rating core itself never fails: insufficient
//! or malformed data degrades to partial or empty results instead.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating service scenarios
#[derive(Debug, thiserror::Error)]
pub enum RatingsError {
    #[error("Event not found: {event_code}")]
    EventNotFound { event_code: String },

    #[error("Team {team_number} not found in event {event_code}")]
    TeamNotFound {
        event_code: String,
        team_number: u32,
    },

    #[error("Invalid event snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    #[error("Event data provider failed: {message}")]
    ProviderFailed { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
