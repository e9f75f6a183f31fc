//! Control commands issued by dashboard clients.
//!
//! A `Command` is validated at construction; encoding to the bus payload is
//! infallible afterwards.

use crate::error::ValidationError;
use crate::types::Mode;
use serde::{Deserialize, Serialize};

/// Lowest accepted gas threshold.
pub const THRESHOLD_MIN: u32 = 200;
/// Highest accepted gas threshold.
pub const THRESHOLD_MAX: u32 = 9999;
/// Threshold assumed until the device reports one.
pub const DEFAULT_THRESHOLD: u32 = 4000;

/// Two-state actuators on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actuator {
    Relay1,
    Relay2,
    Window,
    Buzzer,
}

impl Actuator {
    pub const ALL: [Actuator; 4] = [Self::Relay1, Self::Relay2, Self::Window, Self::Buzzer];

    /// Topic leaf shared by `status/` and `control/`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relay1 => "relay1",
            Self::Relay2 => "relay2",
            Self::Window => "window",
            Self::Buzzer => "buzzer",
        }
    }

    /// Inverse of `as_str`.
    pub fn from_leaf(leaf: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == leaf)
    }
}

impl std::fmt::Display for Actuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Switch an actuator on or off.
    SetActuator { actuator: Actuator, on: bool },
    /// Change controller mode.
    SetMode(Mode),
    /// Change gas alarm threshold.
    SetThreshold(u32),
}

impl Command {
    pub fn set_actuator(actuator: Actuator, on: bool) -> Self {
        Self::SetActuator { actuator, on }
    }

    pub fn set_mode(mode: Mode) -> Self {
        Self::SetMode(mode)
    }

    /// Validate and build a threshold command.
    ///
    /// Accepts `THRESHOLD_MIN..=THRESHOLD_MAX` inclusive.
    pub fn set_threshold(value: i64) -> Result<Self, ValidationError> {
        if value < i64::from(THRESHOLD_MIN) || value > i64::from(THRESHOLD_MAX) {
            return Err(ValidationError::ThresholdOutOfRange(value));
        }
        Ok(Self::SetThreshold(value as u32))
    }

    /// Leaf appended to `{prefix}/control/`.
    pub fn control_leaf(&self) -> &'static str {
        match self {
            Self::SetActuator { actuator, .. } => actuator.as_str(),
            Self::SetMode(_) => "mode",
            Self::SetThreshold(_) => "threshold",
        }
    }

    /// Bus payload: booleans as "1"/"0", AUTO as "1", threshold as decimal.
    pub fn payload(&self) -> String {
        match self {
            Self::SetActuator { on, .. } => String::from(if *on { "1" } else { "0" }),
            Self::SetMode(mode) => mode.as_payload().to_string(),
            Self::SetThreshold(value) => value.to_string(),
        }
    }

    /// Operation name for logs and metrics, e.g. "set-relay1".
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetActuator { actuator, .. } => match actuator {
                Actuator::Relay1 => "set-relay1",
                Actuator::Relay2 => "set-relay2",
                Actuator::Window => "set-window",
                Actuator::Buzzer => "set-buzzer",
            },
            Self::SetMode(_) => "set-mode",
            Self::SetThreshold(_) => "set-threshold",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_bounds() {
        assert_eq!(
            Command::set_threshold(199),
            Err(ValidationError::ThresholdOutOfRange(199))
        );
        assert_eq!(
            Command::set_threshold(10000),
            Err(ValidationError::ThresholdOutOfRange(10000))
        );
        assert_eq!(Command::set_threshold(200), Ok(Command::SetThreshold(200)));
        assert_eq!(Command::set_threshold(9999), Ok(Command::SetThreshold(9999)));
        assert!(Command::set_threshold(-1).is_err());
    }

    #[test]
    fn test_threshold_error_message() {
        let err = Command::set_threshold(50).unwrap_err();
        assert_eq!(err.to_string(), "Threshold must be between 200 and 9999");
    }

    #[test]
    fn test_encoding() {
        let on = Command::set_actuator(Actuator::Relay1, true);
        assert_eq!(on.control_leaf(), "relay1");
        assert_eq!(on.payload(), "1");
        assert_eq!(on.name(), "set-relay1");

        let off = Command::set_actuator(Actuator::Window, false);
        assert_eq!(off.control_leaf(), "window");
        assert_eq!(off.payload(), "0");

        assert_eq!(Command::set_mode(Mode::Auto).payload(), "1");
        assert_eq!(Command::set_mode(Mode::Manual).payload(), "0");
        assert_eq!(Command::set_mode(Mode::Manual).control_leaf(), "mode");

        let threshold = Command::set_threshold(4500).unwrap();
        assert_eq!(threshold.control_leaf(), "threshold");
        assert_eq!(threshold.payload(), "4500");
    }

    #[test]
    fn test_actuator_leaf_roundtrip() {
        for actuator in Actuator::ALL {
            assert_eq!(Actuator::from_leaf(actuator.as_str()), Some(actuator));
        }
        assert_eq!(Actuator::from_leaf("fan"), None);
    }
}
