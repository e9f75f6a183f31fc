//! MQTT transport for the gas-monitor bridge.
//!
//! Provides:
//! - `MqttConnection`: Drives the broker event loop and emits `BusEvent`s
//! - `BusPublisher`: QoS 1 publish that waits for PUBACK
//! - `BusLink`: Subscribe / resume hooks used after (re)connects
//! - `ReconnectSupervisor`: Pure reconnect state machine

pub mod ack;
pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod link;
pub mod publisher;
pub mod supervisor;

pub use ack::AckTracker;
pub use config::BusConfig;
pub use connection::MqttConnection;
pub use error::{BusError, BusResult};
pub use event::BusEvent;
pub use link::{BusLink, DynBusLink, MockLink, MqttLink};
pub use publisher::{BoxFuture, BusPublisher, DynBusPublisher, MockPublisher, MqttPublisher};
pub use supervisor::{ReconnectSupervisor, SupervisorAction, SupervisorState};
