//! Reconnection supervisor.
//!
//! Pure state machine: every transition returns the actions the hub must
//! execute. At most one reconnect timer is pending, identified by a
//! generation number so a late firing of a superseded timer is ignored.

use std::time::Duration;

/// Supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Disconnected, no timer.
    Idle,
    /// A connect attempt is in progress.
    Connecting,
    /// Broker session is up.
    Connected,
    /// Disconnected with one timer pending.
    Armed { generation: u64 },
}

impl SupervisorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Armed { .. } => "armed",
        }
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorAction {
    /// Update `busConnected` in the state store.
    SetBusConnected(bool),
    /// Subscribe to the full topic set.
    Subscribe,
    /// Start a timer that reports back with `generation` after `delay`.
    ArmTimer { generation: u64, delay: Duration },
    /// Abort the pending timer.
    CancelTimer,
    /// Let the driver attempt the next connect.
    Resume,
}

/// Reconnect state machine with a fixed delay.
#[derive(Debug)]
pub struct ReconnectSupervisor {
    state: SupervisorState,
    generation: u64,
    delay: Duration,
}

impl ReconnectSupervisor {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: SupervisorState::Idle,
            generation: 0,
            delay,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Idle → Connecting.
    pub fn start(&mut self) -> Vec<SupervisorAction> {
        if self.state == SupervisorState::Idle {
            self.state = SupervisorState::Connecting;
        }
        Vec::new()
    }

    /// Any → Connected. Cancels a pending timer and re-subscribes.
    pub fn on_connected(&mut self) -> Vec<SupervisorAction> {
        let mut actions = Vec::with_capacity(3);
        if matches!(self.state, SupervisorState::Armed { .. }) {
            actions.push(SupervisorAction::CancelTimer);
        }
        self.state = SupervisorState::Connected;
        actions.push(SupervisorAction::SetBusConnected(true));
        actions.push(SupervisorAction::Subscribe);
        actions
    }

    /// Connection lost or connect failed.
    ///
    /// Arms a new timer unless one is already pending.
    pub fn on_disconnected(&mut self) -> Vec<SupervisorAction> {
        if matches!(self.state, SupervisorState::Armed { .. }) {
            return vec![SupervisorAction::SetBusConnected(false)];
        }

        self.generation += 1;
        self.state = SupervisorState::Armed {
            generation: self.generation,
        };
        vec![
            SupervisorAction::SetBusConnected(false),
            SupervisorAction::ArmTimer {
                generation: self.generation,
                delay: self.delay,
            },
        ]
    }

    /// Timer `generation` fired. Stale generations do nothing.
    pub fn on_timer_fired(&mut self, generation: u64) -> Vec<SupervisorAction> {
        match self.state {
            SupervisorState::Armed { generation: armed } if armed == generation => {
                self.state = SupervisorState::Connecting;
                vec![SupervisorAction::Resume]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(1000);

    fn timers(actions: &[SupervisorAction]) -> usize {
        actions
            .iter()
            .filter(|a| matches!(a, SupervisorAction::ArmTimer { .. }))
            .count()
    }

    #[test]
    fn test_start_and_connect() {
        let mut sup = ReconnectSupervisor::new(DELAY);
        assert!(sup.start().is_empty());
        assert_eq!(sup.state(), SupervisorState::Connecting);

        let actions = sup.on_connected();
        assert_eq!(
            actions,
            vec![
                SupervisorAction::SetBusConnected(true),
                SupervisorAction::Subscribe
            ]
        );
        assert_eq!(sup.state(), SupervisorState::Connected);
    }

    #[test]
    fn test_double_disconnect_arms_one_timer() {
        let mut sup = ReconnectSupervisor::new(DELAY);
        sup.start();
        sup.on_connected();

        let first = sup.on_disconnected();
        let second = sup.on_disconnected();

        assert_eq!(timers(&first) + timers(&second), 1);
        assert_eq!(second, vec![SupervisorAction::SetBusConnected(false)]);
        assert_eq!(sup.state(), SupervisorState::Armed { generation: 1 });
        assert!(first.contains(&SupervisorAction::ArmTimer {
            generation: 1,
            delay: DELAY
        }));
    }

    #[test]
    fn test_timer_resumes_then_rearms() {
        let mut sup = ReconnectSupervisor::new(DELAY);
        sup.start();
        sup.on_disconnected();

        assert_eq!(sup.on_timer_fired(1), vec![SupervisorAction::Resume]);
        assert_eq!(sup.state(), SupervisorState::Connecting);

        // Connect attempt failed again.
        let actions = sup.on_disconnected();
        assert!(actions.contains(&SupervisorAction::ArmTimer {
            generation: 2,
            delay: DELAY
        }));
    }

    #[test]
    fn test_stale_timer_ignored() {
        let mut sup = ReconnectSupervisor::new(DELAY);
        sup.start();
        sup.on_disconnected();
        sup.on_timer_fired(1);
        sup.on_disconnected();

        assert!(sup.on_timer_fired(1).is_empty());
        assert_eq!(sup.state(), SupervisorState::Armed { generation: 2 });
    }

    #[test]
    fn test_connect_while_armed_cancels_timer() {
        let mut sup = ReconnectSupervisor::new(DELAY);
        sup.start();
        sup.on_disconnected();

        let actions = sup.on_connected();
        assert_eq!(actions[0], SupervisorAction::CancelTimer);
        assert!(sup.on_timer_fired(1).is_empty());
        assert_eq!(sup.state(), SupervisorState::Connected);
    }
}
