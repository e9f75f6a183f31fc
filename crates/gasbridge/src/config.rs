//! Application configuration.

use crate::error::{AppError, AppResult};
use gasbridge_bus::BusConfig;
use gasbridge_core::{TopicTable, DEFAULT_HISTORY_CAPACITY};
use gasbridge_dashboard::DashboardConfig;
use gasbridge_hub::HubConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file used when neither `--config` nor `GASBRIDGE_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

const HUB_QUEUE_CAPACITY: usize = 1024;

/// Notification history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Notifications retained in memory.
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info,gasbridge=debug".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Broker connection.
    #[serde(default)]
    pub bus: BusConfig,
    /// HTTP / WebSocket server.
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Notification history.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Logging.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Config path: CLI argument, then `GASBRIDGE_CONFIG`, then the default.
    pub fn resolve_path(cli: Option<String>) -> String {
        cli.or_else(|| std::env::var("GASBRIDGE_CONFIG").ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load `path` if it exists. A missing file yields `None`.
    pub fn load(path: &str) -> AppResult<Option<Self>> {
        if Path::new(path).exists() {
            Self::from_file(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    /// Parse TOML text.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply `GASBRIDGE_*` environment overrides.
    pub fn apply_env_overrides(&mut self) -> AppResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> AppResult<()> {
        if let Some(host) = lookup("GASBRIDGE_MQTT_HOST") {
            self.bus.host = host;
        }
        if let Some(port) = lookup("GASBRIDGE_MQTT_PORT") {
            self.bus.port = parse_port("GASBRIDGE_MQTT_PORT", &port)?;
        }
        if let Some(user) = lookup("GASBRIDGE_MQTT_USER") {
            self.bus.username = Some(user);
        }
        if let Some(pass) = lookup("GASBRIDGE_MQTT_PASS") {
            self.bus.password = Some(pass);
        }
        if let Some(port) = lookup("GASBRIDGE_HTTP_PORT") {
            self.dashboard.port = parse_port("GASBRIDGE_HTTP_PORT", &port)?;
        }
        Ok(())
    }

    /// Reject settings the bridge cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.bus.client_id.trim().is_empty() || self.bus.client_id.starts_with(' ') {
            return Err(AppError::Config(format!(
                "client_id must be non-blank and not start with a space: {:?}",
                self.bus.client_id
            )));
        }
        if self.bus.topic_prefix.contains(['+', '#']) {
            return Err(AppError::Config(format!(
                "topic_prefix must not contain wildcards: {}",
                self.bus.topic_prefix
            )));
        }
        if self.history.capacity == 0 {
            return Err(AppError::Config("history.capacity must be > 0".to_string()));
        }
        if self.dashboard.max_connections == 0 {
            return Err(AppError::Config(
                "dashboard.max_connections must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Topic table for the configured prefix.
    pub fn topics(&self) -> TopicTable {
        TopicTable::new(self.bus.topic_prefix.clone())
    }

    /// Hub settings derived from this config.
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            topics: self.topics(),
            history_capacity: self.history.capacity,
            notifications_on_connect: self.dashboard.notifications_on_connect,
            reconnect_delay: self.bus.reconnect_delay(),
            queue_capacity: HUB_QUEUE_CAPACITY,
        }
    }
}

fn parse_port(key: &str, value: &str) -> AppResult<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{key} is not a valid port: {value}")))
}
