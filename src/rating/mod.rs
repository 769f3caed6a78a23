//! Team performance ratings: OPR and strength of schedule
//!
//! This module provides the least-squares OPR solver, the schedule-strength
//! calculator built on top of it, the shared match filtering policy, and the
//! board that publishes the newest results per event.

pub mod board;
pub mod calculator;
pub mod opr;
pub mod policy;
pub mod schedule;

// Re-export commonly used types
pub use board::{EventStatus, RatingBoard, RefreshFailure};
pub use calculator::{ComputedRatings, OprRatingCalculator, RatingCalculator};
pub use opr::{compute_ratings, OprSolver, RatingOutcome, SolverConfig, SolverDiagnostics};
pub use policy::{classify_luck, LUCK_THRESHOLD};
pub use schedule::compute_schedule_strength;
