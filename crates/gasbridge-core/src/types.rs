//! Device state and notification records.
//!
//! Field names on the wire are camelCase to match the dashboard contract.

use crate::command::DEFAULT_THRESHOLD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification kind used when the device omits one.
pub const DEFAULT_NOTIFICATION_KIND: &str = "danger";

/// Operating mode of the device controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// Controller drives actuators from sensor readings.
    #[default]
    Auto,
    /// Actuators follow explicit commands only.
    Manual,
}

impl Mode {
    /// Bus encoding: AUTO is "1", MANUAL is "0".
    pub fn as_payload(&self) -> &'static str {
        match self {
            Self::Auto => "1",
            Self::Manual => "0",
        }
    }

    /// Decode a status payload. Only "1" means AUTO.
    pub fn from_payload(payload: &str) -> Self {
        if payload == "1" {
            Self::Auto
        } else {
            Self::Manual
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "AUTO"),
            Self::Manual => write!(f, "MANUAL"),
        }
    }
}

/// Canonical snapshot of the monitored device.
///
/// Exactly one instance lives in the process, owned by the `StateStore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    /// Latest gas-concentration reading.
    pub gas_level: u32,
    /// Fire present (sensor reports "0" when it sees flame).
    pub fire_detected: bool,
    /// Relay 1 energized.
    pub relay1: bool,
    /// Relay 2 energized.
    pub relay2: bool,
    /// Window actuator open.
    pub window_open: bool,
    /// Buzzer sounding.
    pub buzzer_on: bool,
    /// Controller mode.
    pub mode: Mode,
    /// Gas alarm threshold.
    pub threshold: u32,
    /// Time of the last field mutation, absent until the first one.
    pub last_update: Option<DateTime<Utc>>,
    /// Whether the bridge currently holds a bus connection.
    pub bus_connected: bool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            gas_level: 0,
            fire_detected: false,
            relay1: false,
            relay2: false,
            window_open: false,
            buzzer_on: false,
            mode: Mode::Auto,
            threshold: DEFAULT_THRESHOLD,
            last_update: None,
            bus_connected: false,
        }
    }
}

/// Partial update to `DeviceState`. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevicePatch {
    pub gas_level: Option<u32>,
    pub fire_detected: Option<bool>,
    pub relay1: Option<bool>,
    pub relay2: Option<bool>,
    pub window_open: Option<bool>,
    pub buzzer_on: Option<bool>,
    pub mode: Option<Mode>,
    pub threshold: Option<u32>,
}

impl DevicePatch {
    /// True if the patch carries no field.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Name of the first field carried, for logs and metrics.
    pub fn field_name(&self) -> &'static str {
        if self.gas_level.is_some() {
            "gasLevel"
        } else if self.fire_detected.is_some() {
            "fireDetected"
        } else if self.relay1.is_some() {
            "relay1"
        } else if self.relay2.is_some() {
            "relay2"
        } else if self.window_open.is_some() {
            "windowOpen"
        } else if self.buzzer_on.is_some() {
            "buzzerOn"
        } else if self.mode.is_some() {
            "mode"
        } else if self.threshold.is_some() {
            "threshold"
        } else {
            "none"
        }
    }

    /// Merge into `state`, leaving absent fields untouched.
    pub fn merge_into(&self, state: &mut DeviceState) {
        if let Some(v) = self.gas_level {
            state.gas_level = v;
        }
        if let Some(v) = self.fire_detected {
            state.fire_detected = v;
        }
        if let Some(v) = self.relay1 {
            state.relay1 = v;
        }
        if let Some(v) = self.relay2 {
            state.relay2 = v;
        }
        if let Some(v) = self.window_open {
            state.window_open = v;
        }
        if let Some(v) = self.buzzer_on {
            state.buzzer_on = v;
        }
        if let Some(v) = self.mode {
            state.mode = v;
        }
        if let Some(v) = self.threshold {
            state.threshold = v;
        }
    }
}

/// Alert event reported by the device. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEntry {
    /// Device-supplied category such as "danger" or "warning".
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable text.
    pub message: String,
    /// When the device says the event happened (Unix ms on the wire).
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub occurred_at: DateTime<Utc>,
    /// When the bridge ingested it.
    #[serde(rename = "receivedAt")]
    pub received_at: DateTime<Utc>,
    /// Optional severity the device may attach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl NotificationEntry {
    /// Create an entry that occurred and was received now.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            kind: kind.into(),
            message: message.into(),
            occurred_at: now,
            received_at: now,
            level: None,
        }
    }
}
