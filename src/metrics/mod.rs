//! Metrics and monitoring for the rating service
//!
//! This module provides Prometheus metrics collection for refreshes and
//! solver behavior. The HTTP exposition lives in the service server.

pub mod collector;

pub use collector::{MetricsCollector, RefreshMetrics, ServiceMetrics, SolverMetrics};

use prometheus::{Encoder, TextEncoder};

/// Render all registered metrics in the Prometheus text format
pub fn render_text(collector: &MetricsCollector) -> anyhow::Result<String> {
    let metric_families = collector.registry().gather();
    let encoder = TextEncoder::new();

    encoder
        .encode_to_string(&metric_families)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))
}

/// Content type of [`render_text`] output
pub fn text_content_type() -> String {
    TextEncoder::new().format_type().to_string()
}
