//! Scout Ratings - OPR and strength-of-schedule service for robotics scouting
//!
//! This crate computes Offensive Power Ratings from alliance match scores,
//! derives each team's strength of schedule, and keeps the newest results
//! for a set of events available over HTTP while the event is running.

pub mod analysis;
pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod refresh;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RatingsError, Result};
pub use types::*;

// Re-export key components
pub use rating::{
    compute_ratings, compute_schedule_strength, OprRatingCalculator, OprSolver, RatingBoard,
    RatingCalculator, SolverConfig,
};
pub use refresh::{EventDataProvider, FileEventDataProvider, RefreshScheduler, StaticEventDataProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
