//! Main application configuration
//!
//! This module defines the configuration structures for the rating service,
//! including TOML file loading, environment variable overrides and validation.

use crate::rating::SolverConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub data: DataSettings,
    pub refresh: RefreshSettings,
    pub solver: SolverConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and health output
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Address the HTTP server binds to
    pub host: String,
    /// Port for the HTTP server
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Where event snapshots come from and which events to track
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Directory holding `<event_code>.json` snapshots
    pub data_dir: PathBuf,
    /// Event codes refreshed by the service
    pub events: Vec<String>,
}

/// Refresh loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    /// Seconds between refreshes; 0 disables the loop (manual refresh only)
    pub interval_seconds: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "scout-ratings".to_string(),
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            http_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            events: Vec::new(),
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_seconds: 15,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", name, value))
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|name| env::var(name).ok())?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; missing keys take defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in `from_env`)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Service settings
        if let Some(name) = lookup("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Some(log_level) = lookup("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Some(host) = lookup("HTTP_HOST") {
            self.service.host = host;
        }
        if let Some(port) = lookup("HTTP_PORT") {
            self.service.http_port = parse_var("HTTP_PORT", &port)?;
        }
        if let Some(timeout) = lookup("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds =
                parse_var("SHUTDOWN_TIMEOUT_SECONDS", &timeout)?;
        }

        // Data settings
        if let Some(dir) = lookup("DATA_DIR") {
            self.data.data_dir = PathBuf::from(dir);
        }
        if let Some(codes) = lookup("EVENT_CODES") {
            self.data.events = codes
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string)
                .collect();
        }

        // Refresh settings
        if let Some(interval) = lookup("REFRESH_INTERVAL_SECONDS") {
            self.refresh.interval_seconds = parse_var("REFRESH_INTERVAL_SECONDS", &interval)?;
        }

        // Solver settings
        if let Some(iterations) = lookup("SOLVER_MAX_ITERATIONS") {
            self.solver.max_iterations = parse_var("SOLVER_MAX_ITERATIONS", &iterations)?;
        }
        if let Some(tolerance) = lookup("SOLVER_TOLERANCE") {
            self.solver.tolerance = parse_var("SOLVER_TOLERANCE", &tolerance)?;
        }
        if let Some(min_matches) = lookup("SOLVER_MIN_COMPLETED_MATCHES") {
            self.solver.min_completed_matches =
                parse_var("SOLVER_MIN_COMPLETED_MATCHES", &min_matches)?;
        }
        if let Some(size) = lookup("SOLVER_ASSUMED_ALLIANCE_SIZE") {
            self.solver.assumed_alliance_size = if size.trim().is_empty() {
                None
            } else {
                Some(parse_var("SOLVER_ASSUMED_ALLIANCE_SIZE", &size)?)
            };
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get the refresh interval, or None when only manual refreshes run
    pub fn refresh_interval(&self) -> Option<Duration> {
        match self.refresh.interval_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        }
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.host.is_empty() {
        return Err(anyhow!("HTTP host cannot be empty"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.data.data_dir.as_os_str().is_empty() {
        return Err(anyhow!("Data directory cannot be empty"));
    }
    for code in &config.data.events {
        if code.is_empty() {
            return Err(anyhow!("Event codes cannot be empty"));
        }
    }

    config.solver.validate()?;

    Ok(())
}
