//! Shared thresholds and match filtering for the rating calculators
//!
//! Both the OPR solver and the schedule-strength calculator read matches
//! through [`usable_matches`], so they always agree on which results count.

use crate::types::{Alliance, AllianceSide, Match, ScheduleLuck, TeamNumber};

/// Fewer completed matches than this yields no ratings at all
pub const MIN_COMPLETED_MATCHES: usize = 3;

/// Gauss-Seidel pass cap
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Largest per-pass change at which the solver stops early
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Absolute SoS value beyond which a schedule is labeled lucky or unlucky
pub const LUCK_THRESHOLD: f64 = 2.0;

/// Label a strength-of-schedule value for display
pub fn classify_luck(sos: f64) -> ScheduleLuck {
    if sos > LUCK_THRESHOLD {
        ScheduleLuck::Lucky
    } else if sos < -LUCK_THRESHOLD {
        ScheduleLuck::Unlucky
    } else {
        ScheduleLuck::Neutral
    }
}

/// An alliance that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAlliance {
    /// Members in their listed order, duplicates removed
    pub teams: Vec<TeamNumber>,
    pub score: f64,
}

/// A completed match whose two alliances both passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct UsableMatch<'a> {
    pub label: &'a str,
    pub alliance_a: ScoredAlliance,
    pub alliance_b: ScoredAlliance,
}

impl UsableMatch<'_> {
    pub fn alliance(&self, side: AllianceSide) -> &ScoredAlliance {
        match side {
            AllianceSide::A => &self.alliance_a,
            AllianceSide::B => &self.alliance_b,
        }
    }

    pub fn side_of(&self, team: TeamNumber) -> Option<AllianceSide> {
        if self.alliance_a.teams.contains(&team) {
            Some(AllianceSide::A)
        } else if self.alliance_b.teams.contains(&team) {
            Some(AllianceSide::B)
        } else {
            None
        }
    }
}

/// Completed matches split into the ones the calculators use and a count of
/// the ones rejected as malformed
#[derive(Debug, Clone, Default)]
pub struct MatchSelection<'a> {
    pub usable: Vec<UsableMatch<'a>>,
    pub malformed: usize,
}

/// Select completed matches, skipping malformed ones individually.
///
/// Matches that are simply not played yet are neither usable nor malformed.
pub fn usable_matches(matches: &[Match]) -> MatchSelection<'_> {
    let mut selection = MatchSelection::default();

    for m in matches.iter().filter(|m| m.is_completed()) {
        match (scored(&m.alliance_a), scored(&m.alliance_b)) {
            (Some(alliance_a), Some(alliance_b))
                if !alliance_a.teams.iter().any(|t| alliance_b.teams.contains(t)) =>
            {
                selection.usable.push(UsableMatch {
                    label: &m.label,
                    alliance_a,
                    alliance_b,
                })
            }
            _ => selection.malformed += 1,
        }
    }

    selection
}

fn scored(alliance: &Alliance) -> Option<ScoredAlliance> {
    let score = alliance.score.filter(|s| s.is_finite())?;
    if alliance.team_numbers.is_empty() {
        return None;
    }

    let mut teams = Vec::with_capacity(alliance.team_numbers.len());
    for &team in &alliance.team_numbers {
        if !teams.contains(&team) {
            teams.push(team);
        }
    }

    Some(ScoredAlliance { teams, score })
}
