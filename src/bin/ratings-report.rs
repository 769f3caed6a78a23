//! Ratings Report CLI Tool
//!
//! Computes OPR and strength of schedule for one event snapshot file and
//! prints them as tables or JSON.
//!
//! Usage:
//!   cargo run --bin ratings-report -- data/CMP1.json
//!   cargo run --bin ratings-report -- data/CMP1.json --top 10
//!   cargo run --bin ratings-report -- data/CMP1.json --team 1234
//!   cargo run --bin ratings-report -- data/CMP1.json --json

use anyhow::{Context, Result};
use clap::Parser;
use scout_ratings::analysis::{EventScoreSummary, TeamRecord, TeamReport};
use scout_ratings::rating::{OprRatingCalculator, RatingCalculator, SolverConfig};
use scout_ratings::refresh::parse_snapshot;
use scout_ratings::types::{AllianceSide, EventRatings, TeamNumber};
use scout_ratings::utils::{current_timestamp, format_rating, format_signed, generate_snapshot_id};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ratings-report")]
#[command(about = "Print OPR and strength-of-schedule rankings for an event snapshot")]
struct Cli {
    /// Snapshot JSON file (teams and matches)
    file: PathBuf,

    /// Print machine-readable JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Only report on this team
    #[arg(long, value_name = "NUMBER")]
    team: Option<TeamNumber>,

    /// Limit ranking tables to the first N rows
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Pin the alliance size used for the solver's starting estimate
    #[arg(long, value_name = "SIZE")]
    alliance_size: Option<usize>,
}

fn load_ratings(cli: &Cli) -> Result<EventRatings> {
    let raw = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;

    let fallback_code = cli
        .file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let snapshot = parse_snapshot(&fallback_code, &raw)?;

    let calculator = OprRatingCalculator::new(SolverConfig {
        assumed_alliance_size: cli.alliance_size,
        ..SolverConfig::default()
    })?;
    let computed = calculator.compute(&snapshot);
    let now = current_timestamp();

    Ok(EventRatings {
        snapshot_id: generate_snapshot_id(),
        event_code: snapshot.event_code.clone(),
        generation: 1,
        fetched_at: now,
        computed_at: now,
        ratings: computed.ratings,
        schedule_strength: computed.schedule_strength,
        summary: EventScoreSummary::from_matches(&snapshot.matches),
        records: TeamRecord::for_roster(&snapshot.teams, &snapshot.matches),
        solver: computed.diagnostics,
    })
}

fn print_summary(ratings: &EventRatings) {
    println!("Event: {}", ratings.event_code);

    let solver = &ratings.solver;
    println!(
        "Solver: {} usable matches, {} skipped, {} passes, {}",
        solver.completed_matches,
        solver.skipped_matches,
        solver.iterations,
        if solver.converged {
            "converged"
        } else {
            "not converged"
        }
    );

    match &ratings.summary {
        Some(summary) => {
            println!();
            println!("Score analysis ({} matches)", summary.completed_matches);
            println!(
                "  Average {:.0}  High {:.0}  Low {:.0}",
                summary.average_score, summary.high_score, summary.low_score
            );
            println!(
                "  Alliance A avg {:.0} ({} wins, {:.0}%)  Alliance B avg {:.0} ({} wins, {:.0}%)  Ties {}",
                summary.alliance_a_average,
                summary.alliance_a_wins,
                summary.win_rate(AllianceSide::A) * 100.0,
                summary.alliance_b_average,
                summary.alliance_b_wins,
                summary.win_rate(AllianceSide::B) * 100.0,
                summary.ties
            );
        }
        None => println!("Waiting for match data"),
    }
}

fn print_tables(ratings: &EventRatings, top: usize) {
    println!();
    println!("OPR");
    println!("{:>4}  {:>6}  {:>7}", "Rank", "Team", "OPR");
    for r in ratings.ratings.iter().take(top) {
        println!(
            "{:>4}  {:>6}  {:>7}",
            r.rank,
            r.team_number,
            format_rating(r.opr)
        );
    }
    if ratings.ratings.is_empty() {
        println!("  (not enough completed matches)");
    }

    println!();
    println!("Strength of schedule");
    println!(
        "{:>4}  {:>6}  {:>7}  {:>8}  {:>8}  {:>7}  {}",
        "Rank", "Team", "SoS", "Partner", "Opponent", "Matches", "Luck"
    );
    for s in ratings.schedule_strength.iter().take(top) {
        println!(
            "{:>4}  {:>6}  {:>7}  {:>8}  {:>8}  {:>7}  {}",
            s.rank,
            s.team_number,
            format_signed(s.sos),
            format_rating(s.avg_partner_opr),
            format_rating(s.avg_opponent_opr),
            s.match_count,
            s.luck
        );
    }
}

fn print_team(report: &TeamReport) {
    println!("Team {}", report.team_number);

    match &report.rating {
        Some(r) => println!("  OPR: {} (rank {})", format_rating(r.opr), r.rank),
        None => println!("  OPR: -"),
    }
    match &report.schedule_strength {
        Some(s) => println!(
            "  SoS: {} (rank {}, {}) partners {} vs opponents {}",
            format_signed(s.sos),
            s.rank,
            s.luck,
            format_rating(s.avg_partner_opr),
            format_rating(s.avg_opponent_opr)
        ),
        None => println!("  SoS: -"),
    }
    match &report.record {
        Some(r) => println!(
            "  Record: {}-{}-{} in {} matches, average alliance score {:.1}",
            r.wins, r.losses, r.ties, r.played, r.average_score
        ),
        None => println!("  Record: no completed matches"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let ratings = load_ratings(&cli)?;

    if let Some(team) = cli.team {
        let report = TeamReport::build(team, &ratings);
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_team(&report);
        }
        return Ok(());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&ratings)?);
        return Ok(());
    }

    print_summary(&ratings);
    print_tables(&ratings, cli.top.unwrap_or(usize::MAX));
    Ok(())
}
