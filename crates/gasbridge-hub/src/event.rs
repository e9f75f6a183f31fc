//! Events processed by the hub task.

use gasbridge_bus::BusEvent;
use gasbridge_core::{DeviceState, NotificationEntry};
use tokio::sync::{mpsc, oneshot};

/// Opaque identifier of a live client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Connectivity summary for the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubHealth {
    pub bus_connected: bool,
    pub clients: usize,
}

/// Read requests answered by the hub.
#[derive(Debug)]
pub enum Query {
    /// Current device state.
    Snapshot(oneshot::Sender<DeviceState>),
    /// Newest `limit` notifications.
    Notifications {
        limit: usize,
        reply: oneshot::Sender<Vec<NotificationEntry>>,
    },
    /// Connectivity summary.
    Health(oneshot::Sender<HubHealth>),
}

/// Messages for the hub actor.
#[derive(Debug)]
pub enum HubEvent {
    /// Something happened on the broker connection.
    Bus(BusEvent),

    /// A live client attached. Frames for it go to `outbound`.
    ClientConnected {
        id: ClientId,
        outbound: mpsc::Sender<String>,
    },

    /// A live client went away.
    ClientDisconnected(ClientId),

    /// Reconnect timer of the given generation fired.
    ReconnectDue(u64),

    /// Read request.
    Query(Query),
}

impl From<BusEvent> for HubEvent {
    fn from(event: BusEvent) -> Self {
        Self::Bus(event)
    }
}
