//! Prometheus metrics and structured logging for the gas-monitor bridge.
//!
//! - Prometheus metrics for bus connectivity, ingestion, fan-out and commands
//! - Structured JSON logging with tracing

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
