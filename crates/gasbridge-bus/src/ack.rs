//! PUBACK correlation for QoS 1 publishes.
//!
//! A waiter is queued when a publish request is handed to the client. The
//! event loop reports the packet id it assigned (`Outgoing::Publish`) in the
//! same order requests were queued, which binds the oldest unassigned waiter
//! to that id. The matching PUBACK resolves it.

use crate::error::{BusError, BusResult};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tokio::sync::oneshot;
use tracing::trace;

type Waiter = oneshot::Sender<BusResult<()>>;

#[derive(Default)]
struct AckState {
    unassigned: VecDeque<Waiter>,
    inflight: HashMap<u16, Waiter>,
}

/// Tracks publishes awaiting PUBACK.
#[derive(Default)]
pub struct AckTracker {
    state: Mutex<AckState>,
}

impl AckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a waiter for the next publish handed to the client.
    pub fn enqueue(&self) -> oneshot::Receiver<BusResult<()>> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unassigned.push_back(tx);
        rx
    }

    /// Withdraw the most recently queued waiter (its publish never reached the client).
    pub fn cancel_last(&self) {
        self.state.lock().unassigned.pop_back();
    }

    /// The event loop sent a publish with `pkid`.
    pub fn assign(&self, pkid: u16) {
        let mut state = self.state.lock();
        match state.unassigned.pop_front() {
            Some(waiter) => {
                state.inflight.insert(pkid, waiter);
            }
            None => trace!(pkid, "Outgoing publish without waiter"),
        }
    }

    /// PUBACK for `pkid` arrived. Returns true if a waiter was resolved.
    pub fn acknowledge(&self, pkid: u16) -> bool {
        let waiter = self.state.lock().inflight.remove(&pkid);
        match waiter {
            Some(waiter) => {
                // Receiver may have timed out already.
                let _ = waiter.send(Ok(()));
                true
            }
            None => false,
        }
    }

    /// Fail every pending waiter with `error`.
    pub fn fail_all(&self, error: BusError) {
        let mut state = self.state.lock();
        for waiter in state.unassigned.drain(..) {
            let _ = waiter.send(Err(error.clone()));
        }
        for (_, waiter) in state.inflight.drain() {
            let _ = waiter.send(Err(error.clone()));
        }
    }

    /// Number of publishes still waiting.
    pub fn pending(&self) -> usize {
        let state = self.state.lock();
        state.unassigned.len() + state.inflight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::task;
    use tokio_test::{assert_pending, assert_ready_eq};

    #[test]
    fn test_waiter_pending_until_puback() {
        let tracker = AckTracker::new();
        let mut waiter = task::spawn(tracker.enqueue());
        assert_pending!(waiter.poll());

        tracker.assign(5);
        assert_pending!(waiter.poll());
        assert!(!tracker.acknowledge(6));
        assert_pending!(waiter.poll());

        assert!(tracker.acknowledge(5));
        assert!(waiter.is_woken());
        assert_ready_eq!(waiter.poll(), Ok(Ok(())));
    }

    #[tokio::test]
    async fn test_ack_resolves_in_order() {
        let tracker = AckTracker::new();
        let first = tracker.enqueue();
        let second = tracker.enqueue();

        tracker.assign(7);
        tracker.assign(8);
        assert_eq!(tracker.pending(), 2);

        assert!(tracker.acknowledge(8));
        assert_eq!(second.await.unwrap(), Ok(()));
        assert!(tracker.acknowledge(7));
        assert_eq!(first.await.unwrap(), Ok(()));
        assert_eq!(tracker.pending(), 0);
    }

    #[tokio::test]
    async fn test_fail_all_on_drop() {
        let tracker = AckTracker::new();
        let queued = tracker.enqueue();
        let sent = tracker.enqueue();
        tracker.assign(1);

        tracker.fail_all(BusError::ConnectionDropped);
        assert_eq!(queued.await.unwrap(), Err(BusError::ConnectionDropped));
        assert_eq!(sent.await.unwrap(), Err(BusError::ConnectionDropped));
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn test_unknown_ack_and_cancel() {
        let tracker = AckTracker::new();
        assert!(!tracker.acknowledge(42));
        tracker.assign(3);

        let _rx = tracker.enqueue();
        tracker.cancel_last();
        assert_eq!(tracker.pending(), 0);
    }
}
