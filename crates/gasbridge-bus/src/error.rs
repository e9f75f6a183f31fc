//! Bus error types.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("Not connected to broker")]
    NotConnected,

    #[error("No PUBACK within {0:?}")]
    AckTimeout(Duration),

    #[error("Connection dropped before PUBACK")]
    ConnectionDropped,

    #[error("MQTT client error: {0}")]
    Client(String),
}

impl BusError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::AckTimeout(_) => "ack_timeout",
            Self::ConnectionDropped => "connection_dropped",
            Self::Client(_) => "client",
        }
    }
}

impl From<rumqttc::ClientError> for BusError {
    fn from(e: rumqttc::ClientError) -> Self {
        Self::Client(e.to_string())
    }
}

pub type BusResult<T> = Result<T, BusError>;
