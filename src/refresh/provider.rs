//! Event data provider interface and implementations
//!
//! Providers hand the refresh pipeline an immutable snapshot of an event's
//! roster and matches. Where the data really comes from (competition API
//! proxy, scraper output, fixtures) stays behind the trait.

use crate::error::RatingsError;
use crate::types::EventSnapshot;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::debug;

/// Trait for fetching event data snapshots
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventDataProvider: Send + Sync {
    /// Fetch the current roster and match list of an event
    async fn fetch_event(&self, event_code: &str) -> crate::error::Result<EventSnapshot>;

    /// Short provider name for logs and health output
    fn name(&self) -> &'static str;
}

/// Reads `<data_dir>/<event_code>.json` on every fetch
#[derive(Debug, Clone)]
pub struct FileEventDataProvider {
    data_dir: PathBuf,
}

impl FileEventDataProvider {
    /// Create a provider rooted at a data directory
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn snapshot_path(&self, event_code: &str) -> crate::error::Result<PathBuf> {
        let valid = !event_code.is_empty()
            && event_code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RatingsError::InvalidSnapshot {
                reason: format!("Invalid event code: {:?}", event_code),
            }
            .into());
        }

        Ok(self.data_dir.join(format!("{}.json", event_code)))
    }
}

/// Parse a snapshot document, filling in the event code when the file omits it
pub fn parse_snapshot(event_code: &str, raw: &str) -> crate::error::Result<EventSnapshot> {
    let mut snapshot: EventSnapshot =
        serde_json::from_str(raw).map_err(|e| RatingsError::InvalidSnapshot {
            reason: format!("{}: {}", event_code, e),
        })?;

    if snapshot.event_code.is_empty() {
        snapshot.event_code = event_code.to_string();
    }

    Ok(snapshot)
}

#[async_trait]
impl EventDataProvider for FileEventDataProvider {
    async fn fetch_event(&self, event_code: &str) -> crate::error::Result<EventSnapshot> {
        let path = self.snapshot_path(event_code)?;

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RatingsError::EventNotFound {
                    event_code: event_code.to_string(),
                }
                .into());
            }
            Err(e) => {
                return Err(RatingsError::ProviderFailed {
                    message: format!("Failed to read {}: {}", path.display(), e),
                }
                .into());
            }
        };

        let snapshot = parse_snapshot(event_code, &raw)?;
        debug!(
            "Loaded {} from {}: {} teams, {} matches",
            event_code,
            path.display(),
            snapshot.teams.len(),
            snapshot.matches.len()
        );

        Ok(snapshot)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// In-memory provider whose snapshots can be replaced at runtime
#[derive(Debug, Default)]
pub struct StaticEventDataProvider {
    events: RwLock<HashMap<String, EventSnapshot>>,
}

impl StaticEventDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider pre-loaded with snapshots
    pub fn with_snapshots(snapshots: impl IntoIterator<Item = EventSnapshot>) -> Self {
        let events = snapshots
            .into_iter()
            .map(|snapshot| (snapshot.event_code.clone(), snapshot))
            .collect();
        Self {
            events: RwLock::new(events),
        }
    }

    /// Insert or replace an event's snapshot
    pub fn set_snapshot(&self, snapshot: EventSnapshot) -> crate::error::Result<()> {
        let mut events = self
            .events
            .write()
            .map_err(|_| RatingsError::InternalError {
                message: "Failed to acquire provider write lock".to_string(),
            })?;

        events.insert(snapshot.event_code.clone(), snapshot);
        Ok(())
    }
}

#[async_trait]
impl EventDataProvider for StaticEventDataProvider {
    async fn fetch_event(&self, event_code: &str) -> crate::error::Result<EventSnapshot> {
        let events = self
            .events
            .read()
            .map_err(|_| RatingsError::InternalError {
                message: "Failed to acquire provider read lock".to_string(),
            })?;

        events.get(event_code).cloned().ok_or_else(|| {
            RatingsError::EventNotFound {
                event_code: event_code.to_string(),
            }
            .into()
        })
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
