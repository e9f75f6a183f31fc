//! Alert classification for device notifications.
//!
//! Severity comes from the optional `level` field (absent means info).
//! Category is found by keyword in the message, fire taking precedence
//! over gas.

use crate::types::NotificationEntry;

const FIRE_KEYWORDS: [&str; 3] = ["fire", "lửa", "cháy"];
const GAS_KEYWORDS: [&str; 3] = ["gas", "mq2", "khí"];

/// Severity declared by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    fn from_level(level: Option<&str>) -> Self {
        match level.map(|l| l.trim().to_lowercase()).as_deref() {
            Some("critical") => Self::Critical,
            Some("warning") => Self::Warning,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// What the alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertCategory {
    Fire,
    Gas,
    Other,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::Gas => "gas",
            Self::Other => "other",
        }
    }
}

/// Classification of one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertClass {
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    /// Reading quoted after the first ':' in the message, e.g. "850" in "MQ2: 850 ppm".
    pub sensor_value: Option<String>,
}

impl AlertClass {
    /// Warning or critical fire/gas alert.
    pub fn is_escalated(&self) -> bool {
        self.severity >= AlertSeverity::Warning && self.category != AlertCategory::Other
    }
}

/// Classify `entry` by level and message keywords.
pub fn classify(entry: &NotificationEntry) -> AlertClass {
    let message = entry.message.to_lowercase();
    let category = if FIRE_KEYWORDS.iter().any(|k| message.contains(k)) {
        AlertCategory::Fire
    } else if GAS_KEYWORDS.iter().any(|k| message.contains(k)) {
        AlertCategory::Gas
    } else {
        AlertCategory::Other
    };

    AlertClass {
        severity: AlertSeverity::from_level(entry.level.as_deref()),
        category,
        sensor_value: sensor_value(&entry.message),
    }
}

fn sensor_value(message: &str) -> Option<String> {
    let (_, rest) = message.split_once(':')?;
    rest.split_whitespace().next().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str, level: Option<&str>) -> NotificationEntry {
        let mut e = NotificationEntry::new("danger", message);
        e.level = level.map(str::to_string);
        e
    }

    #[test]
    fn test_fire_alert() {
        let class = classify(&entry("Phát hiện cháy! Fire sensor: 0", Some("critical")));
        assert_eq!(class.category, AlertCategory::Fire);
        assert_eq!(class.severity, AlertSeverity::Critical);
        assert_eq!(class.sensor_value.as_deref(), Some("0"));
        assert!(class.is_escalated());
    }

    #[test]
    fn test_gas_alert() {
        let class = classify(&entry("MQ2: 850 ppm", Some("Warning")));
        assert_eq!(class.category, AlertCategory::Gas);
        assert_eq!(class.severity, AlertSeverity::Warning);
        assert_eq!(class.sensor_value.as_deref(), Some("850"));
        assert!(class.is_escalated());
    }

    #[test]
    fn test_fire_takes_precedence() {
        let class = classify(&entry("gas and fire", None));
        assert_eq!(class.category, AlertCategory::Fire);
        assert_eq!(class.severity, AlertSeverity::Info);
        assert!(!class.is_escalated());
    }

    #[test]
    fn test_other_never_escalated() {
        let class = classify(&entry("Door opened", Some("critical")));
        assert_eq!(class.category, AlertCategory::Other);
        assert!(class.sensor_value.is_none());
        assert!(!class.is_escalated());
    }
}
