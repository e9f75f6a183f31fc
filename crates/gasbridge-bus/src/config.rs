//! Broker connection configuration.

use gasbridge_core::DEFAULT_TOPIC_PREFIX;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// MQTT broker settings (`[bus]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Broker host name.
    #[serde(default = "default_host")]
    pub host: String,
    /// Broker port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client id stem. A random suffix is appended per process.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Optional username.
    #[serde(default)]
    pub username: Option<String>,
    /// Optional password (used only with a username).
    #[serde(default)]
    pub password: Option<String>,
    /// Prefix for every topic the bridge uses.
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    /// MQTT keep-alive interval.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    /// Fixed delay before reconnecting after a drop.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// How long a QoS 1 publish waits for PUBACK.
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
    /// Capacity of the client request queue.
    #[serde(default = "default_request_capacity")]
    pub request_capacity: usize,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "gasbridge".to_string()
}

fn default_topic_prefix() -> String {
    DEFAULT_TOPIC_PREFIX.to_string()
}

fn default_keep_alive_secs() -> u64 {
    60
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_ack_timeout_ms() -> u64 {
    5000
}

fn default_request_capacity() -> usize {
    64
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_id: default_client_id(),
            username: None,
            password: None,
            topic_prefix: default_topic_prefix(),
            keep_alive_secs: default_keep_alive_secs(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            ack_timeout_ms: default_ack_timeout_ms(),
            request_capacity: default_request_capacity(),
        }
    }
}

impl BusConfig {
    /// Client id for this process: `{client_id}-{8 hex chars}`.
    pub fn session_client_id(&self) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-{}", self.client_id, &suffix[..8])
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}
