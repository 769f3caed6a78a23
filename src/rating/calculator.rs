//! Rating calculator trait and the OPR-backed implementation
//!
//! The refresh pipeline and the report CLI only see [`RatingCalculator`], so
//! every surface ranks teams through the same code path.

use crate::rating::opr::{OprSolver, SolverConfig, SolverDiagnostics};
use crate::rating::schedule::compute_schedule_strength;
use crate::types::{EventSnapshot, RatingResult, ScheduleStrengthResult};
use serde::{Deserialize, Serialize};

/// Result of one rating calculation over an event snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComputedRatings {
    /// OPR, descending
    pub ratings: Vec<RatingResult>,
    /// Strength of schedule, descending
    pub schedule_strength: Vec<ScheduleStrengthResult>,
    pub diagnostics: SolverDiagnostics,
}

/// Trait for turning an event snapshot into rankings
pub trait RatingCalculator: Send + Sync {
    /// Compute both rankings for one snapshot. Never fails: insufficient
    /// data yields empty rankings.
    fn compute(&self, snapshot: &EventSnapshot) -> ComputedRatings;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}

/// Production calculator: least-squares OPR followed by strength of schedule
#[derive(Debug, Clone, Default)]
pub struct OprRatingCalculator {
    solver: OprSolver,
}

impl OprRatingCalculator {
    /// Create a new calculator with a validated solver configuration
    pub fn new(config: SolverConfig) -> crate::error::Result<Self> {
        Ok(Self {
            solver: OprSolver::new(config)?,
        })
    }
}

impl RatingCalculator for OprRatingCalculator {
    fn compute(&self, snapshot: &EventSnapshot) -> ComputedRatings {
        let outcome = self.solver.solve(&snapshot.teams, &snapshot.matches);
        let schedule_strength =
            compute_schedule_strength(&snapshot.teams, &snapshot.matches, &outcome.ratings);

        ComputedRatings {
            ratings: outcome.ratings,
            schedule_strength,
            diagnostics: outcome.diagnostics,
        }
    }

    fn config(&self) -> serde_json::Value {
        let config = self.solver.config();
        serde_json::json!({
            "type": "opr_gauss_seidel",
            "max_iterations": config.max_iterations,
            "tolerance": config.tolerance,
            "min_completed_matches": config.min_completed_matches,
            "assumed_alliance_size": config.assumed_alliance_size,
        })
    }
}
