//! Per-team report combining ratings, schedule strength and record

use crate::analysis::summary::TeamRecord;
use crate::types::{EventRatings, RatingResult, ScheduleStrengthResult, TeamNumber};
use serde::{Deserialize, Serialize};

/// Everything known about one team at one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamReport {
    pub team_number: TeamNumber,
    pub rating: Option<RatingResult>,
    pub schedule_strength: Option<ScheduleStrengthResult>,
    pub record: Option<TeamRecord>,
}

impl TeamReport {
    /// Assemble a report from published ratings
    pub fn build(team_number: TeamNumber, ratings: &EventRatings) -> Self {
        Self {
            team_number,
            rating: ratings.rating_for(team_number).cloned(),
            schedule_strength: ratings.schedule_strength_for(team_number).cloned(),
            record: ratings.record_for(team_number).cloned(),
        }
    }

    /// True when nothing at all is known about the team
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.schedule_strength.is_none() && self.record.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::{OprRatingCalculator, RatingCalculator};
    use crate::types::{Alliance, EventSnapshot, Match};
    use chrono::Utc;
    use uuid::Uuid;

    fn published(snapshot: &EventSnapshot) -> EventRatings {
        let computed = OprRatingCalculator::default().compute(snapshot);
        EventRatings {
            snapshot_id: Uuid::new_v4(),
            event_code: snapshot.event_code.clone(),
            generation: 1,
            fetched_at: Utc::now(),
            computed_at: Utc::now(),
            ratings: computed.ratings,
            schedule_strength: computed.schedule_strength,
            summary: None,
            records: TeamRecord::for_roster(&snapshot.teams, &snapshot.matches),
            solver: computed.diagnostics,
        }
    }

    #[test]
    fn test_team_report() {
        let snapshot = EventSnapshot::new(
            "EVT",
            vec![1, 2, 3, 4],
            vec![
                Match::new(
                    "Q1",
                    Alliance::new(vec![1], Some(20.0)),
                    Alliance::new(vec![2], Some(15.0)),
                ),
                Match::new(
                    "Q2",
                    Alliance::new(vec![1], Some(30.0)),
                    Alliance::new(vec![3], Some(10.0)),
                ),
                Match::new(
                    "Q3",
                    Alliance::new(vec![2], Some(25.0)),
                    Alliance::new(vec![3], Some(5.0)),
                ),
            ],
        );
        let ratings = published(&snapshot);

        let report = TeamReport::build(1, &ratings);
        assert_eq!(report.rating.as_ref().unwrap().rank, 1);
        assert_eq!(report.schedule_strength.as_ref().unwrap().rank, 1);
        assert_eq!(report.record.as_ref().unwrap().wins, 2);
        assert!(!report.is_empty());

        let idle = TeamReport::build(4, &ratings);
        assert!(idle.is_empty());
    }
}
