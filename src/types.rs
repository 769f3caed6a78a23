//! Common types used throughout the rating service

use crate::analysis::{EventScoreSummary, TeamRecord};
use crate::rating::SolverDiagnostics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Team identifier, unique within an event
pub type TeamNumber = u32;

/// Event identifier as used by the competition data provider
pub type EventCode = String;

/// Unique identifier for one computed rating snapshot
pub type SnapshotId = Uuid;

/// Which of the two alliances in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllianceSide {
    A,
    B,
}

impl AllianceSide {
    /// The opposing alliance
    pub fn opponent(self) -> Self {
        match self {
            AllianceSide::A => AllianceSide::B,
            AllianceSide::B => AllianceSide::A,
        }
    }
}

impl std::fmt::Display for AllianceSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllianceSide::A => write!(f, "A"),
            AllianceSide::B => write!(f, "B"),
        }
    }
}

/// One alliance in a match: its member teams and combined final score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alliance {
    #[serde(alias = "teams", default)]
    pub team_numbers: Vec<TeamNumber>,
    /// `None` until the match has been scored
    #[serde(alias = "total", default)]
    pub score: Option<f64>,
}

impl Alliance {
    pub fn new(team_numbers: Vec<TeamNumber>, score: Option<f64>) -> Self {
        Self {
            team_numbers,
            score,
        }
    }
}

/// A match as fetched from the competition data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    #[serde(alias = "description", default)]
    pub label: String,
    /// Explicit completion flag; derived from the scores when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(alias = "red")]
    pub alliance_a: Alliance,
    #[serde(alias = "blue")]
    pub alliance_b: Alliance,
}

impl Match {
    pub fn new(label: impl Into<String>, alliance_a: Alliance, alliance_b: Alliance) -> Self {
        Self {
            label: label.into(),
            completed: None,
            alliance_a,
            alliance_b,
        }
    }

    /// A match is completed only when both alliances carry a score.
    ///
    /// A missing score always wins over an explicit `completed: true`; an
    /// explicit `completed: false` keeps a pre-filled score out of the ratings.
    pub fn is_completed(&self) -> bool {
        self.alliance_a.score.is_some()
            && self.alliance_b.score.is_some()
            && self.completed.unwrap_or(true)
    }
}

/// Everything the rating engine needs for one event, as fetched at one point in time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSnapshot {
    #[serde(default)]
    pub event_code: EventCode,
    /// Ordered roster; the order pins iteration and tie-break order
    #[serde(default)]
    pub teams: Vec<TeamNumber>,
    #[serde(default)]
    pub matches: Vec<Match>,
}

impl EventSnapshot {
    pub fn new(event_code: impl Into<String>, teams: Vec<TeamNumber>, matches: Vec<Match>) -> Self {
        Self {
            event_code: event_code.into(),
            teams,
            matches,
        }
    }
}

/// Offensive Power Rating for one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResult {
    pub team_number: TeamNumber,
    pub opr: f64,
    /// 1-based position in the descending OPR order
    pub rank: u32,
}

/// Presentation label for a strength-of-schedule value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleLuck {
    Lucky,
    Neutral,
    Unlucky,
}

impl std::fmt::Display for ScheduleLuck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleLuck::Lucky => write!(f, "Lucky"),
            ScheduleLuck::Neutral => write!(f, "Neutral"),
            ScheduleLuck::Unlucky => write!(f, "Unlucky"),
        }
    }
}

/// Strength of schedule for one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStrengthResult {
    pub team_number: TeamNumber,
    /// Average partner OPR minus average opponent OPR
    pub sos: f64,
    #[serde(rename = "avgPartnerOPR")]
    pub avg_partner_opr: f64,
    #[serde(rename = "avgOpponentOPR")]
    pub avg_opponent_opr: f64,
    pub match_count: u32,
    pub rank: u32,
    pub luck: ScheduleLuck,
}

/// One recomputation for one event, as published to readers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRatings {
    pub snapshot_id: SnapshotId,
    pub event_code: EventCode,
    /// Order in which the underlying data was fetched
    pub generation: u64,
    pub fetched_at: DateTime<Utc>,
    pub computed_at: DateTime<Utc>,
    pub ratings: Vec<RatingResult>,
    pub schedule_strength: Vec<ScheduleStrengthResult>,
    pub summary: Option<EventScoreSummary>,
    /// Records of roster teams that have played, in roster order
    #[serde(default)]
    pub records: Vec<TeamRecord>,
    pub solver: SolverDiagnostics,
}

impl EventRatings {
    pub fn rating_for(&self, team: TeamNumber) -> Option<&RatingResult> {
        self.ratings.iter().find(|r| r.team_number == team)
    }

    pub fn schedule_strength_for(&self, team: TeamNumber) -> Option<&ScheduleStrengthResult> {
        self.schedule_strength.iter().find(|s| s.team_number == team)
    }

    pub fn record_for(&self, team: TeamNumber) -> Option<&TeamRecord> {
        self.records.iter().find(|r| r.team_number == team)
    }
}
