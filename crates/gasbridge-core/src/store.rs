//! Single-writer holder of the canonical `DeviceState`.
//!
//! Only the hub task writes to the store; everyone else reads snapshots.

use crate::types::{DevicePatch, DeviceState};
use chrono::{DateTime, Duration, Utc};

/// Canonical device state.
#[derive(Debug, Default)]
pub struct StateStore {
    state: DeviceState,
}

impl StateStore {
    /// Create a store holding the default state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `patch` and stamp `lastUpdate` with the current time.
    ///
    /// Returns the full snapshot after the merge.
    pub fn apply_patch(&mut self, patch: &DevicePatch) -> DeviceState {
        self.apply_patch_at(patch, Utc::now())
    }

    /// Merge `patch` as of `now`.
    ///
    /// `lastUpdate` strictly increases: if `now` is not after the previous
    /// stamp, the previous stamp plus one microsecond is used. An empty patch
    /// changes nothing.
    pub fn apply_patch_at(&mut self, patch: &DevicePatch, now: DateTime<Utc>) -> DeviceState {
        if patch.is_empty() {
            return self.snapshot();
        }

        patch.merge_into(&mut self.state);
        let stamp = match self.state.last_update {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        self.state.last_update = Some(stamp);
        self.snapshot()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> DeviceState {
        self.state.clone()
    }

    /// Update bus connectivity. Leaves `lastUpdate` alone.
    ///
    /// Returns true if the value changed.
    pub fn set_bus_connected(&mut self, connected: bool) -> bool {
        if self.state.bus_connected == connected {
            return false;
        }
        self.state.bus_connected = connected;
        true
    }
}
