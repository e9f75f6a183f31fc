//! Control hooks the reconnection supervisor drives.

use crate::connection::Shared;
use crate::error::BusResult;
use rumqttc::{AsyncClient, QoS};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Operations the hub performs on the bus connection.
///
/// Both calls are non-blocking; they only queue work for the driver.
pub trait BusLink: Send + Sync {
    /// Subscribe to `filters` at QoS 1.
    fn subscribe(&self, filters: &[String]) -> BusResult<()>;

    /// Let the driver attempt the next connect.
    fn reconnect(&self);
}

/// Arc wrapper for BusLink trait objects.
pub type DynBusLink = Arc<dyn BusLink>;

/// Link backed by the rumqttc client and driver.
pub struct MqttLink {
    client: AsyncClient,
    shared: Arc<Shared>,
}

impl MqttLink {
    pub(crate) fn new(client: AsyncClient, shared: Arc<Shared>) -> Self {
        Self { client, shared }
    }
}

impl BusLink for MqttLink {
    fn subscribe(&self, filters: &[String]) -> BusResult<()> {
        for filter in filters {
            self.client.try_subscribe(filter.as_str(), QoS::AtLeastOnce)?;
            debug!(%filter, "Subscribe queued");
        }
        Ok(())
    }

    fn reconnect(&self) {
        self.shared.resume.notify_one();
    }
}

/// Mock link for testing.
#[derive(Debug, Default)]
pub struct MockLink {
    subscriptions: parking_lot::Mutex<Vec<Vec<String>>>,
    reconnects: AtomicUsize,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter sets passed to each `subscribe` call.
    pub fn subscriptions(&self) -> Vec<Vec<String>> {
        self.subscriptions.lock().clone()
    }

    /// Number of `reconnect` calls.
    pub fn reconnects(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }
}

impl BusLink for MockLink {
    fn subscribe(&self, filters: &[String]) -> BusResult<()> {
        self.subscriptions.lock().push(filters.to_vec());
        Ok(())
    }

    fn reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_link_records() {
        let link = MockLink::new();
        link.subscribe(&["gas/sensor/#".to_string()]).unwrap();
        link.reconnect();
        link.reconnect();
        assert_eq!(link.subscriptions(), vec![vec!["gas/sensor/#".to_string()]]);
        assert_eq!(link.reconnects(), 2);
    }
}
