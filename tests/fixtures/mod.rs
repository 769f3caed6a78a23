//! Test fixtures and provider implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use scout_ratings::error::{RatingsError, Result};
use scout_ratings::refresh::EventDataProvider;
use scout_ratings::types::{Alliance, EventSnapshot, Match, TeamNumber};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A completed match between two alliances
pub fn played(a: &[TeamNumber], score_a: f64, b: &[TeamNumber], score_b: f64) -> Match {
    Match::new(
        "Q",
        Alliance::new(a.to_vec(), Some(score_a)),
        Alliance::new(b.to_vec(), Some(score_b)),
    )
}

/// A scheduled match that has not been scored yet
pub fn scheduled(a: &[TeamNumber], b: &[TeamNumber]) -> Match {
    Match::new(
        "Q",
        Alliance::new(a.to_vec(), None),
        Alliance::new(b.to_vec(), None),
    )
}

/// Three single-team matches where team 1 averages 25, team 2 20, team 3 7.5
pub fn solo_event(event_code: &str) -> EventSnapshot {
    EventSnapshot::new(
        event_code,
        vec![1, 2, 3],
        vec![
            played(&[1], 20.0, &[2], 15.0),
            played(&[1], 30.0, &[3], 10.0),
            played(&[2], 25.0, &[3], 5.0),
        ],
    )
}

/// Two-team alliances whose scores are exactly additive over strengths 10/20/30/40
pub fn additive_event(event_code: &str) -> EventSnapshot {
    EventSnapshot::new(
        event_code,
        vec![1, 2, 3, 4],
        vec![
            played(&[1, 2], 30.0, &[3, 4], 70.0),
            played(&[1, 3], 40.0, &[2, 4], 60.0),
            played(&[1, 4], 50.0, &[2, 3], 50.0),
            scheduled(&[1, 2], &[3, 4]),
        ],
    )
}

/// Provider that answers each fetch with the next scripted snapshot after a delay
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<(Duration, Option<EventSnapshot>)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response; `None` fails the fetch
    pub fn push(&self, delay: Duration, snapshot: Option<EventSnapshot>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back((delay, snapshot));
        }
    }
}

#[async_trait]
impl EventDataProvider for ScriptedProvider {
    async fn fetch_event(&self, event_code: &str) -> Result<EventSnapshot> {
        let next = self
            .responses
            .lock()
            .map_err(|_| RatingsError::InternalError {
                message: "scripted provider lock poisoned".to_string(),
            })?
            .pop_front();

        let Some((delay, snapshot)) = next else {
            return Err(RatingsError::EventNotFound {
                event_code: event_code.to_string(),
            }
            .into());
        };

        tokio::time::sleep(delay).await;

        snapshot.ok_or_else(|| {
            RatingsError::ProviderFailed {
                message: format!("scripted failure for {}", event_code),
            }
            .into()
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
