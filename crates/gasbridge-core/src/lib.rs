//! Core domain types for the gas-monitor bridge.
//!
//! This crate provides the state model shared by every other crate:
//! - `DeviceState`: The canonical snapshot of the monitored device
//! - `StateStore`: Single-writer holder of the snapshot
//! - `NotificationRing`: Bounded newest-first alert history
//! - `TopicTable`: Bus topic routing and payload decoding
//! - `Command`: Validated control commands and their bus encoding
//! - `classify`: Alert severity/category derivation

pub mod alert;
pub mod command;
pub mod error;
pub mod ring;
pub mod store;
pub mod topic;
pub mod types;

pub use alert::{classify, AlertCategory, AlertClass, AlertSeverity};
pub use command::{
    Actuator, Command, DEFAULT_THRESHOLD, THRESHOLD_MAX, THRESHOLD_MIN,
};
pub use error::{DecodeError, ValidationError};
pub use ring::{NotificationRing, DEFAULT_HISTORY_CAPACITY};
pub use store::StateStore;
pub use topic::{decode, Ingested, Route, TopicTable, DEFAULT_TOPIC_PREFIX};
pub use types::{DevicePatch, DeviceState, Mode, NotificationEntry, DEFAULT_NOTIFICATION_KIND};
