//! Cloneable handle to the hub task.

use crate::error::{HubError, HubResult};
use crate::event::{ClientId, HubEvent, HubHealth, Query};
use gasbridge_core::{DeviceState, NotificationEntry};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Smallest client queue: the two greeting frames must fit.
const MIN_CLIENT_BUFFER: usize = 2;

/// A registered live client.
#[derive(Debug)]
pub struct ClientSession {
    pub id: ClientId,
    /// Frames to write to the socket, in order.
    pub outbound: mpsc::Receiver<String>,
}

/// Handle for interacting with the hub actor.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubEvent>,
    next_client_id: Arc<AtomicU64>,
}

impl HubHandle {
    pub(crate) fn new(tx: mpsc::Sender<HubEvent>) -> Self {
        Self {
            tx,
            next_client_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Sender for producers that post events directly (the bus driver).
    pub fn events(&self) -> mpsc::Sender<HubEvent> {
        self.tx.clone()
    }

    /// Post an event.
    pub async fn send(&self, event: HubEvent) -> HubResult<()> {
        self.tx.send(event).await.map_err(|_| HubError::Closed)
    }

    async fn query<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Query) -> HubResult<T> {
        let (reply, rx) = oneshot::channel();
        self.send(HubEvent::Query(build(reply))).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Current device state.
    pub async fn snapshot(&self) -> HubResult<DeviceState> {
        self.query(Query::Snapshot).await
    }

    /// Newest `limit` notifications, newest first.
    pub async fn notifications(&self, limit: usize) -> HubResult<Vec<NotificationEntry>> {
        self.query(|reply| Query::Notifications { limit, reply })
            .await
    }

    /// Connectivity summary.
    pub async fn health(&self) -> HubResult<HubHealth> {
        self.query(Query::Health).await
    }

    /// Register a live client with a queue of `buffer` frames.
    ///
    /// The greeting (state, then recent history) is already queued when the
    /// hub adds the client, so it precedes any live update.
    pub async fn connect_client(&self, buffer: usize) -> HubResult<ClientSession> {
        let id = ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed));
        let (outbound, rx) = mpsc::channel(buffer.max(MIN_CLIENT_BUFFER));
        self.send(HubEvent::ClientConnected { id, outbound }).await?;
        Ok(ClientSession { id, outbound: rx })
    }

    /// Remove a live client. Ignored if the hub is gone.
    pub async fn disconnect_client(&self, id: ClientId) {
        let _ = self.tx.send(HubEvent::ClientDisconnected(id)).await;
    }
}
