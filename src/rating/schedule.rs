//! Strength of schedule
//!
//! Compares the OPR of a team's partners with the OPR of its opponents over
//! every completed match it played. Positive values mean the draw helped.

use crate::rating::policy::{classify_luck, usable_matches};
use crate::types::{Match, RatingResult, ScheduleStrengthResult, TeamNumber};
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Accumulator {
    partner_sum: f64,
    partner_count: u32,
    opponent_sum: f64,
    opponent_count: u32,
    match_count: u32,
}

impl Accumulator {
    fn mean(sum: f64, count: u32) -> f64 {
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    fn has_rated_contacts(&self) -> bool {
        self.partner_count + self.opponent_count > 0
    }
}

/// Compute strength of schedule for every roster team that has played,
/// using the supplied OPR results
pub fn compute_schedule_strength(
    teams: &[TeamNumber],
    matches: &[Match],
    ratings: &[RatingResult],
) -> Vec<ScheduleStrengthResult> {
    if ratings.is_empty() {
        return Vec::new();
    }

    let opr: HashMap<TeamNumber, f64> = ratings.iter().map(|r| (r.team_number, r.opr)).collect();
    let selection = usable_matches(matches);

    let mut seen: Vec<TeamNumber> = Vec::with_capacity(teams.len());
    let mut results = Vec::new();

    for &team in teams {
        if seen.contains(&team) {
            continue;
        }
        seen.push(team);

        let mut acc = Accumulator::default();
        for m in &selection.usable {
            let Some(side) = m.side_of(team) else {
                continue;
            };
            acc.match_count += 1;

            for partner in m.alliance(side).teams.iter().filter(|&&t| t != team) {
                if let Some(value) = opr.get(partner) {
                    acc.partner_sum += value;
                    acc.partner_count += 1;
                }
            }

            for opponent in &m.alliance(side.opponent()).teams {
                if let Some(value) = opr.get(opponent) {
                    acc.opponent_sum += value;
                    acc.opponent_count += 1;
                }
            }
        }

        if acc.match_count == 0 || !acc.has_rated_contacts() {
            continue;
        }

        let avg_partner_opr = Accumulator::mean(acc.partner_sum, acc.partner_count);
        let avg_opponent_opr = Accumulator::mean(acc.opponent_sum, acc.opponent_count);
        let sos = avg_partner_opr - avg_opponent_opr;

        results.push(ScheduleStrengthResult {
            team_number: team,
            sos,
            avg_partner_opr,
            avg_opponent_opr,
            match_count: acc.match_count,
            rank: 0,
            luck: classify_luck(sos),
        });
    }

    results.sort_by(|a, b| {
        b.sos
            .partial_cmp(&a.sos)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (position, result) in results.iter_mut().enumerate() {
        result.rank = position as u32 + 1;
    }

    results
}
