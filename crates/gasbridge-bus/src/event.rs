//! Events emitted by the connection driver.

/// Something that happened on the broker connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// CONNACK received.
    Connected,
    /// Connection lost or a connect attempt failed.
    Disconnected { reason: String },
    /// Application message on a subscribed topic.
    Message { topic: String, payload: String },
}
