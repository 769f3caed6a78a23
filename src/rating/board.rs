//! Latest published ratings per event
//!
//! The board is the hand-off point between the refresh pipeline and readers.
//! Results are applied in fetch order: an entry only ever moves forward to a
//! newer generation, so a slow refresh that finishes after a faster, newer one
//! is discarded instead of overwriting fresher rankings.

use crate::error::RatingsError;
use crate::types::{EventCode, EventRatings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Most recent refresh failure for an event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshFailure {
    pub generation: u64,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct BoardEntry {
    latest: Option<Arc<EventRatings>>,
    last_success_at: Option<DateTime<Utc>>,
    last_failure: Option<RefreshFailure>,
}

impl BoardEntry {
    fn generation(&self) -> u64 {
        self.latest.as_ref().map(|r| r.generation).unwrap_or(0)
    }
}

/// Summary of one event's board entry, for listings and health checks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStatus {
    pub event_code: EventCode,
    pub generation: Option<u64>,
    pub computed_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub rated_teams: usize,
    pub last_failure: Option<RefreshFailure>,
}

/// Thread-safe holder of the newest ratings for each event
#[derive(Debug, Default)]
pub struct RatingBoard {
    entries: RwLock<BTreeMap<EventCode, BoardEntry>>,
}

impl RatingBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_error(kind: &str) -> RatingsError {
        RatingsError::InternalError {
            message: format!("Failed to acquire rating board {} lock", kind),
        }
    }

    /// Publish a computed result if it is newer than what the board holds.
    ///
    /// Returns `false` when the result was superseded and discarded.
    pub fn apply(&self, ratings: EventRatings) -> crate::error::Result<bool> {
        let mut entries = self.entries.write().map_err(|_| Self::lock_error("write"))?;
        let entry = entries.entry(ratings.event_code.clone()).or_default();

        if entry.latest.is_some() && ratings.generation <= entry.generation() {
            debug!(
                "Discarding stale ratings for {}: generation {} <= {}",
                ratings.event_code,
                ratings.generation,
                entry.generation()
            );
            return Ok(false);
        }

        if entry
            .last_failure
            .as_ref()
            .is_some_and(|f| f.generation < ratings.generation)
        {
            entry.last_failure = None;
        }

        entry.last_success_at = Some(ratings.computed_at);
        entry.latest = Some(Arc::new(ratings));
        Ok(true)
    }

    /// Remember a failed refresh; older failures than the applied result are ignored
    pub fn record_failure(
        &self,
        event_code: &str,
        generation: u64,
        message: impl Into<String>,
    ) -> crate::error::Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::lock_error("write"))?;
        let entry = entries.entry(event_code.to_string()).or_default();

        let newer_than_applied = entry.latest.is_none() || generation > entry.generation();
        let newer_than_failure = entry
            .last_failure
            .as_ref()
            .map_or(true, |f| generation > f.generation);

        if newer_than_applied && newer_than_failure {
            entry.last_failure = Some(RefreshFailure {
                generation,
                message: message.into(),
                at: Utc::now(),
            });
        }

        Ok(())
    }

    /// Latest ratings for an event, if any have been applied
    pub fn latest(&self, event_code: &str) -> crate::error::Result<Option<Arc<EventRatings>>> {
        let entries = self.entries.read().map_err(|_| Self::lock_error("read"))?;

        Ok(entries
            .get(event_code)
            .and_then(|entry| entry.latest.clone()))
    }

    /// Status of every event the board has seen, ordered by event code
    pub fn statuses(&self) -> crate::error::Result<Vec<EventStatus>> {
        let entries = self.entries.read().map_err(|_| Self::lock_error("read"))?;

        Ok(entries
            .iter()
            .map(|(event_code, entry)| EventStatus {
                event_code: event_code.clone(),
                generation: entry.latest.as_ref().map(|r| r.generation),
                computed_at: entry.latest.as_ref().map(|r| r.computed_at),
                last_success_at: entry.last_success_at,
                rated_teams: entry.latest.as_ref().map_or(0, |r| r.ratings.len()),
                last_failure: entry.last_failure.clone(),
            })
            .collect())
    }

    /// Status of one event, `None` if never refreshed
    pub fn status(&self, event_code: &str) -> crate::error::Result<Option<EventStatus>> {
        Ok(self
            .statuses()?
            .into_iter()
            .find(|s| s.event_code == event_code))
    }
}
