//! Dashboard configuration.

use serde::{Deserialize, Serialize};

/// Dashboard server configuration (`[dashboard]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Address to bind.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum concurrent WebSocket connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Frames buffered per WebSocket client before it is dropped.
    #[serde(default = "default_client_buffer")]
    pub client_buffer: usize,
    /// Notifications sent to a client when it connects.
    #[serde(default = "default_notifications_on_connect")]
    pub notifications_on_connect: usize,
    /// Default `limit` for the notification history query.
    #[serde(default = "default_history_limit")]
    pub default_history_limit: usize,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> usize {
    50
}

fn default_client_buffer() -> usize {
    64
}

fn default_notifications_on_connect() -> usize {
    10
}

fn default_history_limit() -> usize {
    50
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            max_connections: default_max_connections(),
            client_buffer: default_client_buffer(),
            notifications_on_connect: default_notifications_on_connect(),
            default_history_limit: default_history_limit(),
        }
    }
}
