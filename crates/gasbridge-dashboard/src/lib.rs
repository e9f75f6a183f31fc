//! Dashboard server for the gas-monitor bridge.
//!
//! Serves:
//! - `GET /ws`: live channel (state, notifications)
//! - `POST /api/control/*`: control commands via the command gateway
//! - `GET /api/data`, `/api/notifications`, `/api/health`, `/metrics`

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod server;

pub use config::DashboardConfig;
pub use error::{DashboardError, DashboardResult};
pub use gateway::{CommandGateway, GatewayError};
pub use server::{create_router, run_server, serve, AppState, ConnectionLimiter};
