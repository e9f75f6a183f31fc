//! Bus topic routing and payload decoding.
//!
//! Topics are relative to a configurable prefix:
//!
//! | topic                         | effect                                  |
//! |-------------------------------|-----------------------------------------|
//! | `sensor/gasLevel`, `sensor/mq2` | gasLevel, non-numeric reads as 0      |
//! | `sensor/fire`                 | fireDetected, "0" means fire            |
//! | `status/{relay1,relay2,window,buzzer}` | "1" means on                   |
//! | `status/mode`                 | "1" means AUTO                          |
//! | `status/threshold`            | non-numeric reads as 4000               |
//! | `notification`                | JSON alert record                       |

use crate::command::{Actuator, Command, DEFAULT_THRESHOLD, THRESHOLD_MAX, THRESHOLD_MIN};
use crate::error::DecodeError;
use crate::types::{DevicePatch, Mode, NotificationEntry, DEFAULT_NOTIFICATION_KIND};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Default topic prefix.
pub const DEFAULT_TOPIC_PREFIX: &str = "gas";

/// Decoded destination of a bus message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    GasLevel,
    Fire,
    Actuator(Actuator),
    Mode,
    Threshold,
    Notification,
}

/// Result of decoding one bus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingested {
    /// Field update for the state store.
    Patch(DevicePatch),
    /// New entry for the notification ring.
    Notification(NotificationEntry),
}

/// Topic names under one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTable {
    prefix: String,
}

impl TopicTable {
    /// Create a table. Trailing slashes on the prefix are ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}/{}", self.prefix, suffix)
        }
    }

    /// Filters subscribed after every (re)connect.
    pub fn subscriptions(&self) -> Vec<String> {
        vec![
            self.full("sensor/#"),
            self.full("status/#"),
            self.full("notification"),
        ]
    }

    /// Map an incoming topic to its route. Unknown topics yield `None`.
    pub fn route(&self, topic: &str) -> Option<Route> {
        let relative = if self.prefix.is_empty() {
            topic
        } else {
            topic.strip_prefix(self.prefix.as_str())?.strip_prefix('/')?
        };

        match relative {
            "sensor/gasLevel" | "sensor/mq2" => Some(Route::GasLevel),
            "sensor/fire" => Some(Route::Fire),
            "status/mode" => Some(Route::Mode),
            "status/threshold" => Some(Route::Threshold),
            "notification" => Some(Route::Notification),
            other => other
                .strip_prefix("status/")
                .and_then(Actuator::from_leaf)
                .map(Route::Actuator),
        }
    }

    /// Topic a command is published on.
    pub fn control_topic(&self, command: &Command) -> String {
        self.full(&format!("control/{}", command.control_leaf()))
    }
}

impl Default for TopicTable {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_PREFIX)
    }
}

#[derive(Debug, Deserialize)]
struct RawNotification {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: String,
    timestamp: Option<i64>,
    #[serde(rename = "receivedAt")]
    received_at: Option<DateTime<Utc>>,
    level: Option<String>,
}

/// Leading integer of `s`, tolerating trailing garbage ("42ppm" is 42).
fn leading_int(s: &str) -> Option<i64> {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|v| sign * v)
}

/// Decode `payload` for `route`. The payload is trimmed first.
pub fn decode(route: Route, payload: &str, now: DateTime<Utc>) -> Result<Ingested, DecodeError> {
    let payload = payload.trim();
    let mut patch = DevicePatch::default();

    match route {
        Route::GasLevel => {
            let level = leading_int(payload).unwrap_or(0).clamp(0, i64::from(u32::MAX));
            patch.gas_level = Some(level as u32);
        }
        Route::Fire => patch.fire_detected = Some(payload == "0"),
        Route::Actuator(actuator) => {
            let on = payload == "1";
            match actuator {
                Actuator::Relay1 => patch.relay1 = Some(on),
                Actuator::Relay2 => patch.relay2 = Some(on),
                Actuator::Window => patch.window_open = Some(on),
                Actuator::Buzzer => patch.buzzer_on = Some(on),
            }
        }
        Route::Mode => patch.mode = Some(Mode::from_payload(payload)),
        Route::Threshold => {
            let threshold = match leading_int(payload) {
                None => DEFAULT_THRESHOLD,
                Some(v) if (i64::from(THRESHOLD_MIN)..=i64::from(THRESHOLD_MAX)).contains(&v) => {
                    v as u32
                }
                Some(v) => return Err(DecodeError::ThresholdOutOfRange(v)),
            };
            patch.threshold = Some(threshold);
        }
        Route::Notification => return decode_notification(payload, now).map(Ingested::Notification),
    }

    Ok(Ingested::Patch(patch))
}

fn decode_notification(payload: &str, now: DateTime<Utc>) -> Result<NotificationEntry, DecodeError> {
    let raw: RawNotification =
        serde_json::from_str(payload).map_err(|e| DecodeError::Notification(e.to_string()))?;

    let received_at = raw.received_at.unwrap_or(now);
    let occurred_at = raw
        .timestamp
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or(received_at);

    Ok(NotificationEntry {
        kind: raw
            .kind
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_NOTIFICATION_KIND.to_string()),
        message: raw.message,
        occurred_at,
        received_at,
        level: raw.level,
    })
}
