//! Event data refresh pipeline
//!
//! Providers fetch event snapshots; the scheduler recomputes ratings and
//! publishes them to the board in fetch order.

pub mod provider;
pub mod scheduler;

pub use provider::{
    parse_snapshot, EventDataProvider, FileEventDataProvider, StaticEventDataProvider,
};
pub use scheduler::{RefreshOutcome, RefreshScheduler};
