//! Error types for gasbridge-core.

use thiserror::Error;

/// Rejected client input. Surfaced synchronously, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Threshold must be between 200 and 9999")]
    ThresholdOutOfRange(i64),
}

/// Malformed bus payload. Logged and dropped by the ingestion path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Threshold out of range: {0}")]
    ThresholdOutOfRange(i64),

    #[error("Malformed notification: {0}")]
    Notification(String),
}

impl DecodeError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ThresholdOutOfRange(_) => "threshold",
            Self::Notification(_) => "notification",
        }
    }
}
