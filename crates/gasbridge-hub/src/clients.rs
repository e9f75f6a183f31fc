//! Live client set.
//!
//! Each client has a bounded outbound queue drained by its own socket task.
//! Sends never wait: a full or closed queue removes the client.

use crate::event::ClientId;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Connected dashboard clients.
#[derive(Debug, Default)]
pub struct LiveClientSet {
    clients: HashMap<ClientId, mpsc::Sender<String>>,
}

impl LiveClientSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ClientId, outbound: mpsc::Sender<String>) {
        self.clients.insert(id, outbound);
    }

    /// Returns true if the client was present.
    pub fn remove(&mut self, id: ClientId) -> bool {
        self.clients.remove(&id).is_some()
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Queue `frame` for every client.
    ///
    /// Returns the clients removed because their queue was full or closed.
    pub fn broadcast(&mut self, frame: &str) -> Vec<ClientId> {
        let mut dropped = Vec::new();
        self.clients.retain(|id, outbound| {
            let ok = outbound.try_send(frame.to_string()).is_ok();
            if !ok {
                dropped.push(*id);
            }
            ok
        });
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_reaches_all() {
        let mut set = LiveClientSet::new();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        set.insert(ClientId(1), tx1);
        set.insert(ClientId(2), tx2);

        assert!(set.broadcast("hello").is_empty());
        assert_eq!(rx1.try_recv().unwrap(), "hello");
        assert_eq!(rx2.try_recv().unwrap(), "hello");
    }

    #[test]
    fn test_full_queue_drops_client() {
        let mut set = LiveClientSet::new();
        let (slow, _slow_rx) = mpsc::channel(1);
        let (fast, mut fast_rx) = mpsc::channel(4);
        set.insert(ClientId(1), slow);
        set.insert(ClientId(2), fast);

        assert!(set.broadcast("a").is_empty());
        assert_eq!(set.broadcast("b"), vec![ClientId(1)]);
        assert!(!set.contains(ClientId(1)));
        assert_eq!(set.len(), 1);
        assert_eq!(fast_rx.try_recv().unwrap(), "a");
        assert_eq!(fast_rx.try_recv().unwrap(), "b");
    }

    #[test]
    fn test_closed_queue_drops_client() {
        let mut set = LiveClientSet::new();
        let (tx, rx) = mpsc::channel(4);
        set.insert(ClientId(9), tx);
        drop(rx);

        assert_eq!(set.broadcast("x"), vec![ClientId(9)]);
        assert!(set.is_empty());
        assert!(!set.remove(ClientId(9)));
    }
}
