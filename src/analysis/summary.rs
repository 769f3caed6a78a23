//! Event-wide and per-team score statistics
//!
//! These are the numbers shown next to the rankings: how high the event is
//! scoring, how the two alliance sides compare, and a team's own record.

use crate::rating::policy::usable_matches;
use crate::types::{AllianceSide, Match, TeamNumber};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Running statistics over alliance scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreStats {
    /// Number of samples collected
    pub sample_count: u64,
    /// Sum of all scores (for calculating mean)
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for ScoreStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self {
            sample_count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn add_sample(&mut self, score: f64) {
        self.sample_count += 1;
        self.sum += score;
        self.min = self.min.min(score);
        self.max = self.max.max(score);
    }

    /// Mean score, 0 with no samples
    pub fn mean(&self) -> f64 {
        if self.sample_count == 0 {
            return 0.0;
        }

        self.sum / self.sample_count as f64
    }
}

/// Scoring overview for one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventScoreSummary {
    pub completed_matches: usize,
    /// Mean over every alliance score
    pub average_score: f64,
    pub high_score: f64,
    pub low_score: f64,
    pub alliance_a_average: f64,
    pub alliance_b_average: f64,
    pub alliance_a_wins: usize,
    pub alliance_b_wins: usize,
    pub ties: usize,
}

impl EventScoreSummary {
    /// Summarize completed matches; `None` until the first one is scored
    pub fn from_matches(matches: &[Match]) -> Option<Self> {
        let selection = usable_matches(matches);
        if selection.usable.is_empty() {
            return None;
        }

        let mut all = ScoreStats::new();
        let mut side_a = ScoreStats::new();
        let mut side_b = ScoreStats::new();
        let (mut a_wins, mut b_wins, mut ties) = (0, 0, 0);

        for m in &selection.usable {
            let (a, b) = (m.alliance_a.score, m.alliance_b.score);
            all.add_sample(a);
            all.add_sample(b);
            side_a.add_sample(a);
            side_b.add_sample(b);

            match a.partial_cmp(&b) {
                Some(Ordering::Greater) => a_wins += 1,
                Some(Ordering::Less) => b_wins += 1,
                _ => ties += 1,
            }
        }

        Some(Self {
            completed_matches: selection.usable.len(),
            average_score: all.mean(),
            high_score: all.max,
            low_score: all.min,
            alliance_a_average: side_a.mean(),
            alliance_b_average: side_b.mean(),
            alliance_a_wins: a_wins,
            alliance_b_wins: b_wins,
            ties,
        })
    }

    /// Share of completed matches won by the given side, 0.0 to 1.0
    pub fn win_rate(&self, side: AllianceSide) -> f64 {
        if self.completed_matches == 0 {
            return 0.0;
        }

        let wins = match side {
            AllianceSide::A => self.alliance_a_wins,
            AllianceSide::B => self.alliance_b_wins,
        };
        wins as f64 / self.completed_matches as f64
    }
}

/// Win/loss record and scoring of one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    pub team_number: TeamNumber,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    /// Mean score of the alliances the team played on
    pub average_score: f64,
}

impl TeamRecord {
    /// Build a team's record from completed matches; `None` if it has not played
    pub fn for_team(team_number: TeamNumber, matches: &[Match]) -> Option<Self> {
        let selection = usable_matches(matches);
        let mut scores = ScoreStats::new();
        let (mut wins, mut losses, mut ties) = (0, 0, 0);

        for m in &selection.usable {
            let Some(side) = m.side_of(team_number) else {
                continue;
            };
            let own = m.alliance(side).score;
            let other = m.alliance(side.opponent()).score;
            scores.add_sample(own);

            match own.partial_cmp(&other) {
                Some(Ordering::Greater) => wins += 1,
                Some(Ordering::Less) => losses += 1,
                _ => ties += 1,
            }
        }

        if scores.sample_count == 0 {
            return None;
        }

        Some(Self {
            team_number,
            played: scores.sample_count as u32,
            wins,
            losses,
            ties,
            average_score: scores.mean(),
        })
    }

    /// Records for every roster team that has played, in roster order
    pub fn for_roster(teams: &[TeamNumber], matches: &[Match]) -> Vec<Self> {
        let mut seen = HashSet::new();
        teams
            .iter()
            .filter(|team| seen.insert(**team))
            .filter_map(|team| Self::for_team(*team, matches))
            .collect()
    }
}
