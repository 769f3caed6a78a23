//! Offensive Power Rating solver
//!
//! Each completed match gives one equation per alliance: the sum of the
//! members' unknown contributions equals the alliance score. The solver
//! accumulates the least-squares normal equations `(AᵗA) x = Aᵗb` directly,
//! without ever building the design matrix, and relaxes them with
//! Gauss-Seidel so that singular systems (teams with very few matches)
//! still produce usable estimates in bounded time.

use crate::error::RatingsError;
use crate::rating::policy::{
    usable_matches, UsableMatch, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, MIN_COMPLETED_MATCHES,
};
use crate::types::{Match, RatingResult, TeamNumber};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Tuning for the OPR solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Upper bound on Gauss-Seidel passes
    pub max_iterations: u32,
    /// Stop once the largest change in a pass drops below this
    pub tolerance: f64,
    /// Minimum usable completed matches before any rating is produced
    pub min_completed_matches: usize,
    /// Pin the alliance size used for the initial estimate instead of
    /// measuring it from the matches
    pub assumed_alliance_size: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            min_completed_matches: MIN_COMPLETED_MATCHES,
            assumed_alliance_size: None,
        }
    }
}

impl SolverConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.max_iterations == 0 {
            return Err(RatingsError::ConfigurationError {
                message: "Solver max_iterations must be greater than 0".to_string(),
            }
            .into());
        }

        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(RatingsError::ConfigurationError {
                message: "Solver tolerance must be a positive number".to_string(),
            }
            .into());
        }

        if self.min_completed_matches == 0 {
            return Err(RatingsError::ConfigurationError {
                message: "Solver min_completed_matches must be at least 1".to_string(),
            }
            .into());
        }

        if self.assumed_alliance_size == Some(0) {
            return Err(RatingsError::ConfigurationError {
                message: "Assumed alliance size must be at least 1".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// How a solve went; informational only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverDiagnostics {
    /// Completed matches that passed validation
    pub completed_matches: usize,
    /// Completed matches left out of the system
    pub skipped_matches: usize,
    /// Teams that received a rating
    pub rated_teams: usize,
    /// Gauss-Seidel passes performed
    pub iterations: u32,
    pub converged: bool,
    /// Largest change during the final pass
    pub max_change: f64,
    /// Starting value for every unknown
    pub initial_estimate: f64,
}

/// Ratings plus the diagnostics of the solve that produced them
#[derive(Debug, Clone, Default)]
pub struct RatingOutcome {
    pub ratings: Vec<RatingResult>,
    pub diagnostics: SolverDiagnostics,
}

/// Normal-equations projection of the match system, `m×m` for `m` teams
#[derive(Debug, Clone)]
struct NormalEquations {
    size: usize,
    ata: Vec<f64>,
    atb: Vec<f64>,
}

impl NormalEquations {
    fn new(size: usize) -> Self {
        Self {
            size,
            ata: vec![0.0; size * size],
            atb: vec![0.0; size],
        }
    }

    fn add_alliance(&mut self, members: &[usize], score: f64) {
        for &i in members {
            self.atb[i] += score;
            for &j in members {
                self.ata[i * self.size + j] += 1.0;
            }
        }
    }

    fn diagonal(&self, i: usize) -> f64 {
        self.ata[i * self.size + i]
    }

    /// Gauss-Seidel relaxation in place, returning (passes, converged, last max change)
    fn relax(&self, x: &mut [f64], max_iterations: u32, tolerance: f64) -> (u32, bool, f64) {
        let n = self.size;
        let mut passes = 0;
        let mut max_change = 0.0_f64;

        for _ in 0..max_iterations {
            passes += 1;
            max_change = 0.0;

            for i in 0..n {
                let diag = self.diagonal(i);
                if diag == 0.0 {
                    continue;
                }

                let row = &self.ata[i * n..(i + 1) * n];
                let mut sum = self.atb[i];
                for (j, (&coefficient, &estimate)) in row.iter().zip(x.iter()).enumerate() {
                    if j != i {
                        sum -= coefficient * estimate;
                    }
                }

                let next = sum / diag;
                if !next.is_finite() {
                    continue;
                }

                max_change = max_change.max((next - x[i]).abs());
                x[i] = next;
            }

            if max_change < tolerance {
                return (passes, true, max_change);
            }
        }

        (passes, false, max_change)
    }
}

/// Least-squares OPR solver
#[derive(Debug, Clone, Default)]
pub struct OprSolver {
    config: SolverConfig,
}

impl OprSolver {
    /// Create a solver with a validated configuration
    pub fn new(config: SolverConfig) -> crate::error::Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Compute ratings for every roster team that has played
    pub fn solve(&self, teams: &[TeamNumber], matches: &[Match]) -> RatingOutcome {
        let selection = usable_matches(matches);
        let mut diagnostics = SolverDiagnostics {
            completed_matches: selection.usable.len(),
            skipped_matches: selection.malformed,
            ..SolverDiagnostics::default()
        };

        if selection.usable.len() < self.config.min_completed_matches || teams.is_empty() {
            debug!(
                "Not enough data for OPR: {} completed matches, {} teams",
                selection.usable.len(),
                teams.len()
            );
            return RatingOutcome {
                ratings: Vec::new(),
                diagnostics,
            };
        }

        let mut roster: Vec<TeamNumber> = Vec::with_capacity(teams.len());
        let mut index: HashMap<TeamNumber, usize> = HashMap::with_capacity(teams.len());
        for &team in teams {
            if !index.contains_key(&team) {
                index.insert(team, roster.len());
                roster.push(team);
            }
        }

        let mut system = NormalEquations::new(roster.len());
        let mut score_total = 0.0;
        let mut slot_total = 0usize;
        let mut alliance_total = 0usize;

        for m in &selection.usable {
            let Some((members_a, members_b)) = roster_members(m, &index) else {
                diagnostics.skipped_matches += 1;
                continue;
            };

            system.add_alliance(&members_a, m.alliance_a.score);
            system.add_alliance(&members_b, m.alliance_b.score);

            score_total += m.alliance_a.score + m.alliance_b.score;
            slot_total += members_a.len() + members_b.len();
            alliance_total += 2;
        }

        let slots = match self.config.assumed_alliance_size {
            Some(size) => alliance_total * size,
            None => slot_total,
        };
        let initial_estimate = if slots > 0 {
            score_total / slots as f64
        } else {
            0.0
        };

        let mut estimates = vec![initial_estimate; roster.len()];
        let (iterations, converged, max_change) = system.relax(
            &mut estimates,
            self.config.max_iterations,
            self.config.tolerance,
        );

        if converged {
            debug!(
                "OPR converged after {} passes (max change {:.5})",
                iterations, max_change
            );
        } else {
            warn!(
                "OPR stopped at the {} pass cap without converging (max change {:.5})",
                iterations, max_change
            );
        }

        let mut ratings: Vec<RatingResult> = roster
            .iter()
            .enumerate()
            .filter(|(i, _)| system.diagonal(*i) != 0.0)
            .map(|(i, &team_number)| RatingResult {
                team_number,
                opr: estimates[i],
                rank: 0,
            })
            .collect();

        // Stable: equal ratings keep roster order
        ratings.sort_by(|a, b| {
            b.opr
                .partial_cmp(&a.opr)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for (position, rating) in ratings.iter_mut().enumerate() {
            rating.rank = position as u32 + 1;
        }

        diagnostics.rated_teams = ratings.len();
        diagnostics.iterations = iterations;
        diagnostics.converged = converged;
        diagnostics.max_change = max_change;
        diagnostics.initial_estimate = initial_estimate;

        RatingOutcome {
            ratings,
            diagnostics,
        }
    }
}

/// Roster indices of both alliances, or `None` if either has no roster team
fn roster_members(
    m: &UsableMatch<'_>,
    index: &HashMap<TeamNumber, usize>,
) -> Option<(Vec<usize>, Vec<usize>)> {
    let lookup = |teams: &[TeamNumber]| -> Vec<usize> {
        teams.iter().filter_map(|t| index.get(t).copied()).collect()
    };

    let members_a = lookup(&m.alliance_a.teams);
    let members_b = lookup(&m.alliance_b.teams);

    if members_a.is_empty() || members_b.is_empty() {
        None
    } else {
        Some((members_a, members_b))
    }
}

/// Compute OPR rankings with the default solver settings
pub fn compute_ratings(teams: &[TeamNumber], matches: &[Match]) -> Vec<RatingResult> {
    OprSolver::default().solve(teams, matches).ratings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Alliance;

    fn played(a: Vec<TeamNumber>, sa: f64, b: Vec<TeamNumber>, sb: f64) -> Match {
        Match::new(
            "Q",
            Alliance::new(a, Some(sa)),
            Alliance::new(b, Some(sb)),
        )
    }

    fn solo_event() -> (Vec<TeamNumber>, Vec<Match>) {
        (
            vec![1, 2, 3],
            vec![
                played(vec![1], 20.0, vec![2], 15.0),
                played(vec![1], 30.0, vec![3], 10.0),
                played(vec![2], 25.0, vec![3], 5.0),
            ],
        )
    }

    fn opr_of(ratings: &[RatingResult], team: TeamNumber) -> f64 {
        ratings
            .iter()
            .find(|r| r.team_number == team)
            .map(|r| r.opr)
            .unwrap()
    }

    #[test]
    fn test_threshold_gate() {
        let (teams, matches) = solo_event();

        for count in 0..3 {
            let ratings = compute_ratings(&teams, &matches[..count]);
            assert!(ratings.is_empty(), "{} matches should not rate", count);
        }

        assert!(compute_ratings(&[], &matches).is_empty());
    }

    #[test]
    fn test_alliance_of_one_reduces_to_averages() {
        let (teams, matches) = solo_event();
        let ratings = compute_ratings(&teams, &matches);

        assert_eq!(ratings.len(), 3);
        assert!((opr_of(&ratings, 1) - 25.0).abs() < 0.01);
        assert!((opr_of(&ratings, 2) - 20.0).abs() < 0.01);
        assert!((opr_of(&ratings, 3) - 7.5).abs() < 0.01);

        let order: Vec<_> = ratings.iter().map(|r| (r.team_number, r.rank)).collect();
        assert_eq!(order, vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_two_team_alliances_recover_contributions() {
        // Contributions 10, 20, 30, 40 with every pairing played
        let teams = vec![1, 2, 3, 4];
        let matches = vec![
            played(vec![1, 2], 30.0, vec![3, 4], 70.0),
            played(vec![1, 3], 40.0, vec![2, 4], 60.0),
            played(vec![1, 4], 50.0, vec![2, 3], 50.0),
        ];

        let ratings = compute_ratings(&teams, &matches);
        assert_eq!(ratings.len(), 4);
        for (team, expected) in [(1, 10.0), (2, 20.0), (3, 30.0), (4, 40.0)] {
            assert!(
                (opr_of(&ratings, team) - expected).abs() < 0.5,
                "team {} got {}",
                team,
                opr_of(&ratings, team)
            );
        }
        assert_eq!(ratings[0].team_number, 4);
    }

    #[test]
    fn test_unplayed_roster_team_is_omitted() {
        let (mut teams, matches) = solo_event();
        teams.push(99);

        let ratings = compute_ratings(&teams, &matches);
        assert_eq!(ratings.len(), 3);
        assert!(ratings.iter().all(|r| r.team_number != 99));
    }

    #[test]
    fn test_ties_keep_roster_order() {
        let teams = vec![30, 10, 20];
        let matches = vec![
            played(vec![30], 10.0, vec![10], 10.0),
            played(vec![10], 10.0, vec![20], 10.0),
            played(vec![20], 10.0, vec![30], 10.0),
        ];

        let ratings = compute_ratings(&teams, &matches);
        let order: Vec<_> = ratings.iter().map(|r| r.team_number).collect();
        assert_eq!(order, vec![30, 10, 20]);
        assert_eq!(ratings[2].rank, 3);
    }

    #[test]
    fn test_repeated_solves_are_bit_identical() {
        let teams = vec![5, 6, 7, 8, 9];
        let matches = vec![
            played(vec![5, 6], 41.0, vec![7, 8], 37.0),
            played(vec![9, 5], 22.0, vec![6, 7], 58.0),
            played(vec![8, 9], 19.0, vec![5, 7], 44.0),
            played(vec![6, 8], 33.0, vec![9, 7], 29.0),
        ];

        let first = compute_ratings(&teams, &matches);
        let second = compute_ratings(&teams, &matches);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.team_number, b.team_number);
            assert_eq!(a.opr.to_bits(), b.opr.to_bits());
            assert_eq!(a.rank, b.rank);
        }
    }

    #[test]
    fn test_malformed_matches_do_not_blank_ratings() {
        let (teams, mut matches) = solo_event();
        matches.push(played(vec![], 50.0, vec![1], 10.0));
        matches.push(played(vec![2], f64::NAN, vec![3], 10.0));

        let outcome = OprSolver::default().solve(&teams, &matches);
        assert_eq!(outcome.ratings.len(), 3);
        assert_eq!(outcome.diagnostics.completed_matches, 3);
        assert_eq!(outcome.diagnostics.skipped_matches, 2);
        assert!((opr_of(&outcome.ratings, 1) - 25.0).abs() < 0.01);
    }

    #[test]
    fn test_off_roster_teams_are_ignored() {
        let teams = vec![1, 2, 3];
        let matches = vec![
            played(vec![1, 100], 20.0, vec![2], 15.0),
            played(vec![1], 30.0, vec![3], 10.0),
            played(vec![2], 25.0, vec![3], 5.0),
            played(vec![100], 90.0, vec![101], 90.0),
        ];

        let outcome = OprSolver::default().solve(&teams, &matches);
        assert_eq!(outcome.ratings.len(), 3);
        assert_eq!(outcome.diagnostics.skipped_matches, 1);
        assert!((opr_of(&outcome.ratings, 1) - 25.0).abs() < 0.01);
    }

    #[test]
    fn test_initial_estimate_uses_observed_alliance_sizes() {
        let (teams, matches) = solo_event();
        let outcome = OprSolver::default().solve(&teams, &matches);

        // 105 points over six single-team alliances
        assert!((outcome.diagnostics.initial_estimate - 17.5).abs() < 1e-9);

        let pinned = OprSolver::new(SolverConfig {
            assumed_alliance_size: Some(3),
            ..SolverConfig::default()
        })
        .unwrap()
        .solve(&teams, &matches);
        assert!((pinned.diagnostics.initial_estimate - 105.0 / 18.0).abs() < 1e-9);
        assert!((opr_of(&pinned.ratings, 1) - 25.0).abs() < 0.01);
    }

    #[test]
    fn test_iteration_cap_is_respected() {
        let teams = vec![1, 2, 3, 4];
        let matches = vec![
            played(vec![1, 2], 30.0, vec![3, 4], 70.0),
            played(vec![1, 3], 40.0, vec![2, 4], 60.0),
            played(vec![1, 4], 50.0, vec![2, 3], 50.0),
        ];

        let solver = OprSolver::new(SolverConfig {
            max_iterations: 1,
            tolerance: 1e-12,
            ..SolverConfig::default()
        })
        .unwrap();

        let outcome = solver.solve(&teams, &matches);
        assert_eq!(outcome.diagnostics.iterations, 1);
        assert!(!outcome.diagnostics.converged);
        assert_eq!(outcome.ratings.len(), 4);
    }

    #[test]
    fn test_config_validation() {
        assert!(SolverConfig::default().validate().is_ok());

        let bad = [
            SolverConfig {
                max_iterations: 0,
                ..SolverConfig::default()
            },
            SolverConfig {
                tolerance: 0.0,
                ..SolverConfig::default()
            },
            SolverConfig {
                tolerance: f64::NAN,
                ..SolverConfig::default()
            },
            SolverConfig {
                min_completed_matches: 0,
                ..SolverConfig::default()
            },
            SolverConfig {
                assumed_alliance_size: Some(0),
                ..SolverConfig::default()
            },
        ];

        for config in bad {
            assert!(OprSolver::new(config).is_err());
        }
    }
}
