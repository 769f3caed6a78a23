//! Score analysis around the ratings
//!
//! This module provides event-wide scoring statistics, per-team records, and
//! the combined team report served to dashboards.

pub mod report;
pub mod summary;

pub use report::TeamReport;
pub use summary::{EventScoreSummary, ScoreStats, TeamRecord};
