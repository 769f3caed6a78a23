//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the rating service: how
//! often events refresh, how the solver behaves, and overall health.

use crate::rating::SolverDiagnostics;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry,
};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the rating service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Refresh pipeline metrics
    refresh_metrics: RefreshMetrics,

    /// Solver metrics
    solver_metrics: SolverMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Refresh pipeline metrics
#[derive(Clone)]
pub struct RefreshMetrics {
    /// Refreshes by event and outcome (applied, superseded, failed)
    pub refreshes_total: IntCounterVec,

    /// Results discarded because newer data was already published
    pub stale_results_total: IntCounter,

    /// End-to-end refresh duration
    pub refresh_duration_seconds: HistogramVec,
}

/// Solver metrics
#[derive(Clone)]
pub struct SolverMetrics {
    /// Time spent computing OPR and strength of schedule
    pub computation_duration_seconds: Histogram,

    /// Gauss-Seidel passes per solve
    pub iterations: Histogram,

    /// Solves that hit the pass cap
    pub not_converged_total: IntCounter,

    /// Teams with a rating, per event
    pub rated_teams: IntGaugeVec,

    /// Usable completed matches, per event
    pub completed_matches: IntGaugeVec,

    /// Completed matches skipped as malformed, per event
    pub skipped_matches: IntGaugeVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let refresh_metrics = RefreshMetrics::new(&registry)?;
        let solver_metrics = SolverMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            refresh_metrics,
            solver_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get refresh metrics
    pub fn refresh(&self) -> &RefreshMetrics {
        &self.refresh_metrics
    }

    /// Get solver metrics
    pub fn solver(&self) -> &SolverMetrics {
        &self.solver_metrics
    }

    /// Record a finished refresh attempt
    pub fn record_refresh(&self, event_code: &str, outcome: &str, duration: Duration) {
        self.refresh_metrics
            .refreshes_total
            .with_label_values(&[event_code, outcome])
            .inc();

        if outcome == "superseded" {
            self.refresh_metrics.stale_results_total.inc();
        }

        self.refresh_metrics
            .refresh_duration_seconds
            .with_label_values(&[outcome])
            .observe(duration.as_secs_f64());
    }

    /// Record one rating computation
    pub fn record_computation(
        &self,
        event_code: &str,
        diagnostics: &SolverDiagnostics,
        duration: Duration,
    ) {
        self.solver_metrics
            .computation_duration_seconds
            .observe(duration.as_secs_f64());

        // A short-circuited solve performs no passes
        if diagnostics.iterations > 0 {
            self.solver_metrics
                .iterations
                .observe(diagnostics.iterations as f64);

            if !diagnostics.converged {
                self.solver_metrics.not_converged_total.inc();
            }
        }

        self.solver_metrics
            .rated_teams
            .with_label_values(&[event_code])
            .set(diagnostics.rated_teams as i64);
        self.solver_metrics
            .completed_matches
            .with_label_values(&[event_code])
            .set(diagnostics.completed_matches as i64);
        self.solver_metrics
            .skipped_matches
            .with_label_values(&[event_code])
            .set(diagnostics.skipped_matches as i64);
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let health_status = IntGauge::new(
            "scout_ratings_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new(
                "scout_ratings_component_health",
                "Component health (0=unhealthy, 1=healthy)",
            ),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            health_status,
            component_health,
        })
    }
}

impl RefreshMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let refreshes_total = IntCounterVec::new(
            Opts::new(
                "scout_ratings_refreshes_total",
                "Event refreshes by outcome",
            ),
            &["event", "outcome"],
        )?;
        registry.register(Box::new(refreshes_total.clone()))?;

        let stale_results_total = IntCounter::new(
            "scout_ratings_stale_results_total",
            "Computed results discarded because newer data was already published",
        )?;
        registry.register(Box::new(stale_results_total.clone()))?;

        let refresh_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "scout_ratings_refresh_duration_seconds",
                "Fetch, compute and publish duration",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(refresh_duration_seconds.clone()))?;

        Ok(Self {
            refreshes_total,
            stale_results_total,
            refresh_duration_seconds,
        })
    }
}

impl SolverMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let computation_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "scout_ratings_computation_duration_seconds",
                "Time spent computing OPR and strength of schedule",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(computation_duration_seconds.clone()))?;

        let iterations = Histogram::with_opts(
            HistogramOpts::new(
                "scout_ratings_solver_iterations",
                "Gauss-Seidel passes per solve",
            )
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0]),
        )?;
        registry.register(Box::new(iterations.clone()))?;

        let not_converged_total = IntCounter::new(
            "scout_ratings_solver_not_converged_total",
            "Solves that stopped at the pass cap",
        )?;
        registry.register(Box::new(not_converged_total.clone()))?;

        let rated_teams = IntGaugeVec::new(
            Opts::new("scout_ratings_rated_teams", "Teams with an OPR"),
            &["event"],
        )?;
        registry.register(Box::new(rated_teams.clone()))?;

        let completed_matches = IntGaugeVec::new(
            Opts::new(
                "scout_ratings_completed_matches",
                "Usable completed matches",
            ),
            &["event"],
        )?;
        registry.register(Box::new(completed_matches.clone()))?;

        let skipped_matches = IntGaugeVec::new(
            Opts::new(
                "scout_ratings_skipped_matches",
                "Completed matches skipped as malformed",
            ),
            &["event"],
        )?;
        registry.register(Box::new(skipped_matches.clone()))?;

        Ok(Self {
            computation_duration_seconds,
            iterations,
            not_converged_total,
            rated_teams,
            completed_matches,
            skipped_matches,
        })
    }
}
