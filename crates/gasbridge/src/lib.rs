//! Gas-monitor bridge application.
//!
//! Wires the MQTT driver, the hub actor and the dashboard server together.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::{AppConfig, HistoryConfig, TelemetryConfig};
pub use error::{AppError, AppResult};
