//! Messages pushed to live clients.

use gasbridge_core::{DeviceState, NotificationEntry};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Live-channel frame: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Envelope {
    /// Full device state.
    Data(DeviceState),
    /// One new notification.
    Notification(NotificationEntry),
    /// Recent history, sent once at connect.
    Notifications(Vec<NotificationEntry>),
}

impl Envelope {
    /// Value of the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Data(_) => "data",
            Self::Notification(_) => "notification",
            Self::Notifications(_) => "notifications",
        }
    }

    /// Serialize to a text frame.
    pub fn to_json(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(e) => {
                debug!(error = %e, kind = self.kind(), "Failed to serialize envelope");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_envelope_shape() {
        let json = Envelope::Data(DeviceState::default()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "data");
        assert_eq!(value["data"]["threshold"], 4000);
        assert_eq!(value["data"]["mode"], "AUTO");
    }

    #[test]
    fn test_notifications_envelope_shape() {
        let entries = vec![NotificationEntry::new("danger", "Gas leak")];
        let json = Envelope::Notifications(entries).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "notifications");
        assert_eq!(value["data"][0]["message"], "Gas leak");
        assert_eq!(value["data"][0]["type"], "danger");

        let empty = Envelope::Notifications(Vec::new()).to_json().unwrap();
        assert_eq!(empty, r#"{"type":"notifications","data":[]}"#);
    }
}
