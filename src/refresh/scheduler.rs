//! Refresh scheduling and result ordering
//!
//! Every refresh takes a generation number before it starts fetching. The
//! board only accepts a result whose generation is newer than the one it
//! holds, so overlapping refreshes (a timer tick racing a manual refresh)
//! always settle on the result built from the most recently fetched data.

use crate::analysis::{EventScoreSummary, TeamRecord};
use crate::metrics::MetricsCollector;
use crate::rating::{RatingBoard, RatingCalculator};
use crate::refresh::provider::EventDataProvider;
use crate::types::{EventRatings, EventSnapshot};
use crate::utils::{current_timestamp, generate_snapshot_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

/// What happened to a refresh that completed successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum RefreshOutcome {
    /// The result is now the published one
    Applied { generation: u64 },
    /// A newer result was already published; this one was discarded
    Superseded { generation: u64 },
}

impl RefreshOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            RefreshOutcome::Applied { generation } | RefreshOutcome::Superseded { generation } => {
                *generation
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Applied { .. } => "applied",
            RefreshOutcome::Superseded { .. } => "superseded",
        }
    }
}

/// Fetches event data, recomputes ratings and publishes them in fetch order
pub struct RefreshScheduler {
    provider: Arc<dyn EventDataProvider>,
    calculator: Arc<dyn RatingCalculator>,
    board: Arc<RatingBoard>,
    metrics: Arc<MetricsCollector>,
    last_generation: AtomicU64,
}

impl RefreshScheduler {
    /// Create a new refresh scheduler
    pub fn new(
        provider: Arc<dyn EventDataProvider>,
        calculator: Arc<dyn RatingCalculator>,
        board: Arc<RatingBoard>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            provider,
            calculator,
            board,
            metrics,
            last_generation: AtomicU64::new(0),
        }
    }

    pub fn board(&self) -> Arc<RatingBoard> {
        self.board.clone()
    }

    pub fn provider(&self) -> Arc<dyn EventDataProvider> {
        self.provider.clone()
    }

    pub fn calculator(&self) -> Arc<dyn RatingCalculator> {
        self.calculator.clone()
    }

    fn next_generation(&self) -> u64 {
        self.last_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Compute publishable ratings for a snapshot without touching the board
    pub fn build_ratings(
        &self,
        event_code: &str,
        generation: u64,
        fetched_at: DateTime<Utc>,
        snapshot: &EventSnapshot,
    ) -> EventRatings {
        let started = Instant::now();
        let computed = self.calculator.compute(snapshot);
        self.metrics
            .record_computation(event_code, &computed.diagnostics, started.elapsed());

        EventRatings {
            snapshot_id: generate_snapshot_id(),
            event_code: event_code.to_string(),
            generation,
            fetched_at,
            computed_at: current_timestamp(),
            ratings: computed.ratings,
            schedule_strength: computed.schedule_strength,
            summary: EventScoreSummary::from_matches(&snapshot.matches),
            records: TeamRecord::for_roster(&snapshot.teams, &snapshot.matches),
            solver: computed.diagnostics,
        }
    }

    /// Fetch, recompute and publish one event.
    ///
    /// A failed fetch leaves the previously published ratings in place.
    pub async fn refresh_event(&self, event_code: &str) -> crate::error::Result<RefreshOutcome> {
        let generation = self.next_generation();
        let started = Instant::now();
        let fetched_at = current_timestamp();

        debug!("Refreshing {} (generation {})", event_code, generation);

        let snapshot = match self.provider.fetch_event(event_code).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    "Refresh of {} failed (generation {}): {}",
                    event_code, generation, e
                );
                self.board
                    .record_failure(event_code, generation, e.to_string())?;
                self.metrics
                    .record_refresh(event_code, "failed", started.elapsed());
                return Err(e);
            }
        };

        let ratings = self.build_ratings(event_code, generation, fetched_at, &snapshot);
        let rated_teams = ratings.ratings.len();

        let outcome = if self.board.apply(ratings)? {
            RefreshOutcome::Applied { generation }
        } else {
            RefreshOutcome::Superseded { generation }
        };

        self.metrics
            .record_refresh(event_code, outcome.label(), started.elapsed());

        match outcome {
            RefreshOutcome::Applied { .. } => info!(
                "Published ratings for {} (generation {}): {} teams rated, {:.2}ms",
                event_code,
                generation,
                rated_teams,
                started.elapsed().as_secs_f64() * 1000.0
            ),
            RefreshOutcome::Superseded { .. } => debug!(
                "Ratings for {} generation {} superseded by newer data",
                event_code, generation
            ),
        }

        Ok(outcome)
    }

    /// Refresh every listed event, one after another
    pub async fn refresh_all(
        &self,
        event_codes: &[String],
    ) -> Vec<(String, crate::error::Result<RefreshOutcome>)> {
        let mut results = Vec::with_capacity(event_codes.len());
        for event_code in event_codes {
            let result = self.refresh_event(event_code).await;
            results.push((event_code.clone(), result));
        }
        results
    }

    /// Poll all events on a fixed interval until `running` turns false.
    ///
    /// The first refresh happens immediately.
    pub async fn run(
        self: Arc<Self>,
        event_codes: Vec<String>,
        interval: Duration,
        running: Arc<RwLock<bool>>,
    ) {
        info!(
            "Refresh loop started: {} events every {}s",
            event_codes.len(),
            interval.as_secs_f64()
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(ticker);

        while ticks.next().await.is_some() {
            if !*running.read().await {
                break;
            }

            let results = self.refresh_all(&event_codes).await;
            let failed = results.iter().filter(|(_, r)| r.is_err()).count();
            if failed > 0 {
                warn!("{} of {} event refreshes failed", failed, results.len());
            }
        }

        info!("Refresh loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RatingsError;
    use crate::rating::OprRatingCalculator;
    use crate::refresh::provider::{MockEventDataProvider, StaticEventDataProvider};
    use crate::types::{Alliance, Match};

    fn snapshot(event_code: &str) -> EventSnapshot {
        EventSnapshot::new(
            event_code,
            vec![1, 2, 3],
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
        )
    }

    fn scheduler(provider: Arc<dyn EventDataProvider>) -> RefreshScheduler {
        RefreshScheduler::new(
            provider,
            Arc::new(OprRatingCalculator::default()),
            Arc::new(RatingBoard::new()),
            Arc::new(MetricsCollector::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn test_refresh_publishes_ratings() {
        let provider = Arc::new(StaticEventDataProvider::with_snapshots(vec![snapshot(
            "EVT",
        )]));
        let scheduler = scheduler(provider);

        let outcome = scheduler.refresh_event("EVT").await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Applied { generation: 1 });

        let latest = scheduler.board().latest("EVT").unwrap().unwrap();
        assert_eq!(latest.ratings.len(), 3);
        assert_eq!(latest.schedule_strength.len(), 3);
        assert_eq!(latest.summary.as_ref().unwrap().completed_matches, 3);
        assert!(latest.computed_at >= latest.fetched_at);
    }

    #[tokio::test]
    async fn test_generations_increase() {
        let provider = Arc::new(StaticEventDataProvider::with_snapshots(vec![
            snapshot("AAA"),
            snapshot("BBB"),
        ]));
        let scheduler = scheduler(provider);

        let results = scheduler
            .refresh_all(&["AAA".to_string(), "BBB".to_string(), "AAA".to_string()])
            .await;
        let generations: Vec<u64> = results
            .iter()
            .map(|(_, r)| r.as_ref().unwrap().generation())
            .collect();
        assert_eq!(generations, vec![1, 2, 3]);
        assert_eq!(
            scheduler.board().latest("AAA").unwrap().unwrap().generation,
            3
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_ratings() {
        let mut mock = MockEventDataProvider::new();
        let mut calls = 0;
        mock.expect_fetch_event().times(2).returning(move |code| {
            calls += 1;
            if calls == 1 {
                Ok(snapshot(code))
            } else {
                Err(RatingsError::ProviderFailed {
                    message: "upstream timeout".to_string(),
                }
                .into())
            }
        });
        let scheduler = scheduler(Arc::new(mock));

        assert!(scheduler.refresh_event("EVT").await.is_ok());
        assert!(scheduler.refresh_event("EVT").await.is_err());

        let board = scheduler.board();
        let latest = board.latest("EVT").unwrap().unwrap();
        assert_eq!(latest.generation, 1);
        assert_eq!(latest.ratings.len(), 3);

        let status = board.status("EVT").unwrap().unwrap();
        let failure = status.last_failure.unwrap();
        assert_eq!(failure.generation, 2);
        assert!(failure.message.contains("upstream timeout"));
    }

    #[tokio::test]
    async fn test_run_stops_when_not_running() {
        let provider = Arc::new(StaticEventDataProvider::with_snapshots(vec![snapshot(
            "EVT",
        )]));
        let scheduler = Arc::new(scheduler(provider));
        let running = Arc::new(RwLock::new(true));

        let handle = tokio::spawn(scheduler.clone().run(
            vec!["EVT".to_string()],
            Duration::from_millis(10),
            running.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        *running.write().await = false;
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();

        let latest = scheduler.board().latest("EVT").unwrap().unwrap();
        assert!(latest.generation >= 1);
    }
}
