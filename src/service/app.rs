//! Main application state and service coordination
//!
//! This module contains the AppState that wires the provider, calculator,
//! board and scheduler together and owns the background tasks.

use crate::config::AppConfig;
use crate::error::RatingsError;
use crate::metrics::MetricsCollector;
use crate::rating::{OprRatingCalculator, RatingBoard};
use crate::refresh::{EventDataProvider, FileEventDataProvider, RefreshScheduler};
use crate::service::server;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How long `stop` waits for each background task before aborting it
const TASK_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Published ratings per event
    board: Arc<RatingBoard>,

    /// Fetch, compute and publish pipeline
    scheduler: Arc<RefreshScheduler>,

    /// Metrics collector shared with the scheduler
    metrics: Arc<MetricsCollector>,

    /// Background task handles
    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    /// Signals the HTTP server to shut down
    shutdown_tx: broadcast::Sender<()>,

    started_at: DateTime<Utc>,
}

impl AppState {
    /// Initialize the application reading snapshots from the configured data directory
    pub fn new(config: AppConfig) -> Result<Self> {
        let provider = Arc::new(FileEventDataProvider::new(config.data.data_dir.clone()));
        Self::with_provider(config, provider)
    }

    /// Initialize the application with a custom event data provider
    pub fn with_provider(config: AppConfig, provider: Arc<dyn EventDataProvider>) -> Result<Self> {
        info!("Initializing scout-ratings service");
        info!(
            "Configuration: service={}, provider={}, events={:?}",
            config.service.name,
            provider.name(),
            config.data.events
        );

        let calculator = Arc::new(
            OprRatingCalculator::new(config.solver.clone())
                .context("Failed to create rating calculator")?,
        );
        let metrics = Arc::new(MetricsCollector::new().context("Failed to create metrics")?);
        let board = Arc::new(RatingBoard::new());
        let scheduler = Arc::new(RefreshScheduler::new(
            provider,
            calculator,
            board.clone(),
            metrics.clone(),
        ));
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            config,
            board,
            scheduler,
            metrics,
            background_tasks: Mutex::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
            shutdown_tx,
            started_at: Utc::now(),
        })
    }

    /// Bind the HTTP listener and start the refresh loop and HTTP server
    pub async fn start(self: &Arc<Self>) -> Result<SocketAddr> {
        info!("Starting scout-ratings service");

        let addr = format!("{}:{}", self.config.service.host, self.config.service.http_port);
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            RatingsError::ConfigurationError {
                message: format!("Failed to bind HTTP server to {}: {}", addr, e),
            }
        })?;
        let local_addr = listener.local_addr()?;

        // Mark as running
        *self.is_running.write().await = true;

        self.start_refresh_loop().await;
        self.start_http_server(listener).await;

        info!("✅ scout-ratings service started on http://{}", local_addr);
        Ok(local_addr)
    }

    async fn start_refresh_loop(self: &Arc<Self>) {
        let events = self.config.data.events.clone();

        match self.config.refresh_interval() {
            Some(interval) => {
                info!(
                    "Starting refresh loop ({}s interval, {} events)...",
                    interval.as_secs(),
                    events.len()
                );
                let scheduler = self.scheduler.clone();
                let is_running = self.is_running.clone();
                let handle = tokio::spawn(scheduler.run(events, interval, is_running));
                self.background_tasks.lock().await.push(handle);
            }
            None => {
                info!("Automatic refresh disabled, running one initial refresh");
                for (event_code, result) in self.scheduler.refresh_all(&events).await {
                    if let Err(e) = result {
                        warn!("Initial refresh of {} failed: {}", event_code, e);
                    }
                }
            }
        }
    }

    async fn start_http_server(self: &Arc<Self>, listener: TcpListener) {
        let router = server::create_router(self.clone());
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                    info!("HTTP server shutdown signal received");
                })
                .await;

            match result {
                Ok(()) => info!("HTTP server stopped"),
                Err(e) => error!("HTTP server failed: {}", e),
            }
        });

        self.background_tasks.lock().await.push(handle);
    }

    /// Stop background tasks and the HTTP server
    pub async fn stop(&self) {
        info!("Starting graceful shutdown of scout-ratings service");

        // Mark as not running
        *self.is_running.write().await = false;

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to HTTP server: {}", e);
        }

        let handles: Vec<JoinHandle<()>> = self.background_tasks.lock().await.drain(..).collect();
        for mut handle in handles {
            if tokio::time::timeout(TASK_STOP_TIMEOUT, &mut handle)
                .await
                .is_err()
            {
                warn!("Background task did not stop in time, aborting");
                handle.abort();
            }
        }

        info!("✅ scout-ratings service shutdown completed");
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn board(&self) -> Arc<RatingBoard> {
        self.board.clone()
    }

    pub fn scheduler(&self) -> Arc<RefreshScheduler> {
        self.scheduler.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
