//! Hub actor task.
//!
//! Processes `HubEvent`s one at a time. Handlers never await: client sends
//! are `try_send`, the reconnect timer is a spawned sleep that posts back
//! `ReconnectDue`, and bus link calls only queue requests.

use crate::clients::LiveClientSet;
use crate::envelope::Envelope;
use crate::event::{ClientId, HubEvent, HubHealth, Query};
use crate::handle::HubHandle;
use chrono::Utc;
use gasbridge_bus::{BusEvent, DynBusLink, ReconnectSupervisor, SupervisorAction};
use gasbridge_core::{
    classify, decode, Ingested, NotificationEntry, NotificationRing, StateStore, TopicTable,
    DEFAULT_HISTORY_CAPACITY,
};
use gasbridge_telemetry::Metrics;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

// ============================================================================
// HubConfig
// ============================================================================

/// Hub settings.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Topic names under the configured prefix.
    pub topics: TopicTable,
    /// Notification history capacity.
    pub history_capacity: usize,
    /// Notifications sent to a client at connect.
    pub notifications_on_connect: usize,
    /// Fixed reconnect delay.
    pub reconnect_delay: Duration,
    /// Capacity of the hub event queue.
    pub queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            topics: TopicTable::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            notifications_on_connect: 10,
            reconnect_delay: Duration::from_millis(1000),
            queue_capacity: 1024,
        }
    }
}

// ============================================================================
// HubTask
// ============================================================================

/// Hub actor. Sole owner of all mutable bridge state.
pub struct HubTask {
    rx: mpsc::Receiver<HubEvent>,
    /// Used by the reconnect timer; weak so handles alone keep the queue open.
    self_tx: mpsc::WeakSender<HubEvent>,
    config: HubConfig,
    store: StateStore,
    ring: NotificationRing,
    clients: LiveClientSet,
    supervisor: ReconnectSupervisor,
    link: DynBusLink,
    timer: Option<JoinHandle<()>>,
}

impl HubTask {
    /// Create the task and its handle without spawning.
    pub fn new(config: HubConfig, link: DynBusLink) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let task = Self {
            rx,
            self_tx: tx.downgrade(),
            store: StateStore::new(),
            ring: NotificationRing::new(config.history_capacity),
            clients: LiveClientSet::new(),
            supervisor: ReconnectSupervisor::new(config.reconnect_delay),
            link,
            timer: None,
            config,
        };
        (task, HubHandle::new(tx))
    }

    /// Run until `shutdown` fires or every handle is dropped.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(prefix = self.config.topics.prefix(), "Hub started");
        let actions = self.supervisor.start();
        self.execute(actions);

        loop {
            let event = tokio::select! {
                () = shutdown.cancelled() => break,
                event = self.rx.recv() => event,
            };
            match event {
                Some(event) => self.handle_event(event),
                None => break,
            }
        }

        self.cancel_timer();
        info!(clients = self.clients.len(), "Hub stopped");
    }

    /// Handle a single event to completion.
    pub fn handle_event(&mut self, event: HubEvent) {
        match event {
            HubEvent::Bus(BusEvent::Connected) => {
                let actions = self.supervisor.on_connected();
                self.execute(actions);
            }
            HubEvent::Bus(BusEvent::Disconnected { reason }) => {
                warn!(%reason, "Broker connection lost");
                let actions = self.supervisor.on_disconnected();
                self.execute(actions);
            }
            HubEvent::Bus(BusEvent::Message { topic, payload }) => self.ingest(&topic, &payload),
            HubEvent::ClientConnected { id, outbound } => self.on_client_connected(id, outbound),
            HubEvent::ClientDisconnected(id) => {
                if self.clients.remove(id) {
                    debug!(client = %id, remaining = self.clients.len(), "Client disconnected");
                    Metrics::live_clients(self.clients.len());
                }
            }
            HubEvent::ReconnectDue(generation) => {
                let actions = self.supervisor.on_timer_fired(generation);
                if actions.is_empty() {
                    trace!(generation, "Stale reconnect timer");
                }
                self.execute(actions);
            }
            HubEvent::Query(query) => self.answer(query),
        }
    }

    // === Ingestion ===

    fn ingest(&mut self, topic: &str, payload: &str) {
        let Some(route) = self.config.topics.route(topic) else {
            trace!(%topic, "Ignoring unrouted topic");
            return;
        };

        match decode(route, payload, Utc::now()) {
            Ok(Ingested::Patch(patch)) => {
                Metrics::ingested(patch.field_name());
                trace!(%topic, field = patch.field_name(), "Applying field update");
                let snapshot = self.store.apply_patch(&patch);
                self.broadcast(&Envelope::Data(snapshot));
            }
            Ok(Ingested::Notification(entry)) => self.on_notification(entry),
            Err(e) => {
                warn!(%topic, error = %e, "Dropping malformed payload");
                Metrics::decode_error(e.kind());
            }
        }
    }

    fn on_notification(&mut self, entry: NotificationEntry) {
        let class = classify(&entry);
        Metrics::notification(class.category.as_str(), class.severity.as_str());
        if class.is_escalated() {
            warn!(
                category = class.category.as_str(),
                severity = class.severity.as_str(),
                sensor_value = class.sensor_value.as_deref().unwrap_or("N/A"),
                message = %entry.message,
                "Device alert"
            );
        } else {
            info!(kind = %entry.kind, message = %entry.message, "Device notification");
        }

        self.ring.push(entry.clone());
        self.broadcast(&Envelope::Notification(entry));
    }

    // === Fan-out ===

    fn on_client_connected(&mut self, id: ClientId, outbound: mpsc::Sender<String>) {
        let greeting = [
            Envelope::Data(self.store.snapshot()),
            Envelope::Notifications(self.ring.recent(self.config.notifications_on_connect)),
        ];

        for envelope in &greeting {
            let Some(frame) = envelope.to_json() else {
                return;
            };
            if outbound.try_send(frame).is_err() {
                debug!(client = %id, "Client gone before greeting");
                Metrics::client_dropped();
                return;
            }
        }

        self.clients.insert(id, outbound);
        Metrics::live_clients(self.clients.len());
        info!(client = %id, clients = self.clients.len(), "Client connected");
    }

    fn broadcast(&mut self, envelope: &Envelope) {
        let Some(frame) = envelope.to_json() else {
            return;
        };
        Metrics::broadcast(envelope.kind());

        let dropped = self.clients.broadcast(&frame);
        if !dropped.is_empty() {
            for id in &dropped {
                warn!(client = %id, "Dropping client with full or closed queue");
                Metrics::client_dropped();
            }
            Metrics::live_clients(self.clients.len());
        }
    }

    // === Supervisor actions ===

    fn execute(&mut self, actions: Vec<SupervisorAction>) {
        for action in actions {
            match action {
                SupervisorAction::SetBusConnected(connected) => {
                    Metrics::bus_connected(connected);
                    if self.store.set_bus_connected(connected) {
                        let snapshot = self.store.snapshot();
                        self.broadcast(&Envelope::Data(snapshot));
                    }
                }
                SupervisorAction::Subscribe => {
                    let filters = self.config.topics.subscriptions();
                    match self.link.subscribe(&filters) {
                        Ok(()) => info!(?filters, "Subscribed"),
                        Err(e) => warn!(error = %e, "Subscribe failed"),
                    }
                }
                SupervisorAction::ArmTimer { generation, delay } => self.arm_timer(generation, delay),
                SupervisorAction::CancelTimer => self.cancel_timer(),
                SupervisorAction::Resume => {
                    info!("Reconnecting to broker");
                    self.link.reconnect();
                }
            }
        }
        Metrics::supervisor_state_set(self.supervisor.state().as_str());
    }

    fn arm_timer(&mut self, generation: u64, delay: Duration) {
        self.cancel_timer();
        Metrics::bus_reconnect();
        info!(generation, delay_ms = delay.as_millis() as u64, "Reconnect scheduled");

        let tx = self.self_tx.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(HubEvent::ReconnectDue(generation)).await;
            }
        }));
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    // === Queries ===

    fn answer(&self, query: Query) {
        match query {
            Query::Snapshot(reply) => {
                let _ = reply.send(self.store.snapshot());
            }
            Query::Notifications { limit, reply } => {
                let _ = reply.send(self.ring.recent(limit));
            }
            Query::Health(reply) => {
                let _ = reply.send(HubHealth {
                    bus_connected: self.store.snapshot().bus_connected,
                    clients: self.clients.len(),
                });
            }
        }
    }
}

// ============================================================================
// Spawn function
// ============================================================================

/// Spawn the hub actor.
///
/// Returns a handle for interaction and a join handle for the task.
#[must_use]
pub fn spawn_hub(
    config: HubConfig,
    link: DynBusLink,
    shutdown: CancellationToken,
) -> (HubHandle, JoinHandle<()>) {
    let (task, handle) = HubTask::new(config, link);
    let join_handle = tokio::spawn(task.run(shutdown));
    (handle, join_handle)
}

// ============================================================================
// Tests
// ============================================================================
