//! Acknowledged publishing to the broker.
//!
//! `BusPublisher` is the seam between the command gateway and the transport.
//! `MqttPublisher` is the real implementation; `MockPublisher` records calls
//! for tests.

use crate::connection::Shared;
use crate::error::{BusError, BusResult};
use rumqttc::{AsyncClient, QoS};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as TokioMutex;
use tracing::debug;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Publishes a payload and waits for delivery confirmation.
pub trait BusPublisher: Send + Sync {
    /// Publish `payload` on `topic` at QoS 1.
    ///
    /// Resolves once the broker acknowledged, or with the failure.
    fn publish(&self, topic: String, payload: String) -> BoxFuture<'_, BusResult<()>>;

    /// Whether a broker connection is currently up.
    fn is_connected(&self) -> bool;
}

/// Arc wrapper for BusPublisher trait objects.
pub type DynBusPublisher = Arc<dyn BusPublisher>;

/// Publisher backed by the rumqttc client.
pub struct MqttPublisher {
    client: AsyncClient,
    shared: Arc<Shared>,
    ack_timeout: Duration,
    /// Keeps waiter order identical to request order.
    order: TokioMutex<()>,
}

impl MqttPublisher {
    pub(crate) fn new(client: AsyncClient, shared: Arc<Shared>, ack_timeout: Duration) -> Self {
        Self {
            client,
            shared,
            ack_timeout,
            order: TokioMutex::new(()),
        }
    }
}

impl BusPublisher for MqttPublisher {
    fn publish(&self, topic: String, payload: String) -> BoxFuture<'_, BusResult<()>> {
        Box::pin(async move {
            if !self.is_connected() {
                return Err(BusError::NotConnected);
            }

            let ack = {
                let _order = self.order.lock().await;
                let ack = self.shared.acks.enqueue();
                if let Err(e) = self
                    .client
                    .publish(topic.as_str(), QoS::AtLeastOnce, false, payload)
                    .await
                {
                    self.shared.acks.cancel_last();
                    return Err(e.into());
                }
                ack
            };

            match tokio::time::timeout(self.ack_timeout, ack).await {
                Ok(Ok(result)) => {
                    debug!(%topic, ok = result.is_ok(), "Publish settled");
                    result
                }
                Ok(Err(_)) => Err(BusError::ConnectionDropped),
                Err(_) => Err(BusError::AckTimeout(self.ack_timeout)),
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }
}

/// Mock publisher for testing.
#[derive(Debug)]
pub struct MockPublisher {
    /// Recorded (topic, payload) pairs.
    published: parking_lot::Mutex<Vec<(String, String)>>,
    /// Next result to return.
    next_result: parking_lot::Mutex<BusResult<()>>,
    connected: AtomicBool,
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPublisher {
    /// Create a connected mock that acknowledges everything.
    pub fn new() -> Self {
        Self {
            published: parking_lot::Mutex::new(Vec::new()),
            next_result: parking_lot::Mutex::new(Ok(())),
            connected: AtomicBool::new(true),
        }
    }

    /// Set the result returned by subsequent publishes.
    pub fn set_next_result(&self, result: BusResult<()>) {
        *self.next_result.lock() = result;
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Get recorded publishes.
    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().clone()
    }
}

impl BusPublisher for MockPublisher {
    fn publish(&self, topic: String, payload: String) -> BoxFuture<'_, BusResult<()>> {
        Box::pin(async move {
            if !self.is_connected() {
                return Err(BusError::NotConnected);
            }
            self.published.lock().push((topic, payload));
            self.next_result.lock().clone()
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BusConfig;
    use crate::connection::MqttConnection;

    #[tokio::test]
    async fn test_mock_records_and_fails() {
        let mock = MockPublisher::new();
        mock.publish("gas/control/relay1".into(), "1".into())
            .await
            .unwrap();
        assert_eq!(
            mock.published(),
            vec![("gas/control/relay1".to_string(), "1".to_string())]
        );

        mock.set_next_result(Err(BusError::AckTimeout(Duration::from_secs(5))));
        assert!(mock.publish("t".into(), "0".into()).await.is_err());

        mock.set_connected(false);
        assert_eq!(
            mock.publish("t".into(), "0".into()).await,
            Err(BusError::NotConnected)
        );
        assert_eq!(mock.published().len(), 2);
    }

    #[tokio::test]
    async fn test_mqtt_publisher_refuses_when_disconnected() {
        let connection = MqttConnection::new(&BusConfig::default());
        let publisher = connection.publisher();

        assert!(!publisher.is_connected());
        let result = publisher
            .publish("gas/control/relay1".into(), "1".into())
            .await;
        assert_eq!(result, Err(BusError::NotConnected));
    }
}
