//! MQTT connection driver.
//!
//! Owns the rumqttc event loop. Emits `BusEvent`s to the hub and parks after
//! every connection failure until the reconnection supervisor calls
//! `BusLink::reconnect`. The driver never retries on its own.

use crate::ack::AckTracker;
use crate::config::BusConfig;
use crate::error::BusError;
use crate::event::BusEvent;
use crate::link::MqttLink;
use crate::publisher::MqttPublisher;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

const DISCONNECT_GRACE: Duration = Duration::from_secs(1);

/// State shared between the driver, publisher and link.
#[derive(Default)]
pub(crate) struct Shared {
    pub(crate) connected: AtomicBool,
    pub(crate) resume: Notify,
    pub(crate) acks: AckTracker,
}

/// Broker connection driver.
pub struct MqttConnection {
    client: AsyncClient,
    eventloop: EventLoop,
    shared: Arc<Shared>,
    ack_timeout: Duration,
}

impl MqttConnection {
    /// Build the client. No I/O happens until `run`.
    pub fn new(config: &BusConfig) -> Self {
        let client_id = config.session_client_id();
        let mut options = MqttOptions::new(client_id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(config.keep_alive());
        options.set_clean_session(true);
        if let Some(username) = &config.username {
            options.set_credentials(username.clone(), config.password.clone().unwrap_or_default());
        }

        let (client, eventloop) = AsyncClient::new(options, config.request_capacity.max(1));
        debug!(%client_id, host = %config.host, port = config.port, "MQTT client created");

        Self {
            client,
            eventloop,
            shared: Arc::new(Shared::default()),
            ack_timeout: config.ack_timeout(),
        }
    }

    /// Publisher sharing this connection.
    pub fn publisher(&self) -> MqttPublisher {
        MqttPublisher::new(self.client.clone(), self.shared.clone(), self.ack_timeout)
    }

    /// Link sharing this connection.
    pub fn link(&self) -> MqttLink {
        MqttLink::new(self.client.clone(), self.shared.clone())
    }

    /// Whether CONNACK has been received and the connection is still up.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Drive the event loop until `shutdown` fires or `events` closes.
    pub async fn run<E>(mut self, events: mpsc::Sender<E>, shutdown: CancellationToken)
    where
        E: From<BusEvent> + Send,
    {
        info!("MQTT driver started");

        loop {
            let polled = tokio::select! {
                () = shutdown.cancelled() => {
                    self.disconnect().await;
                    break;
                }
                polled = self.eventloop.poll() => polled,
            };

            let event = match polled {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    self.shared.connected.store(true, Ordering::Release);
                    info!(code = ?ack.code, "MQTT connected");
                    Some(BusEvent::Connected)
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    trace!(topic = %publish.topic, bytes = publish.payload.len(), "MQTT message");
                    Some(BusEvent::Message {
                        topic: publish.topic,
                        payload: String::from_utf8_lossy(&publish.payload).into_owned(),
                    })
                }
                Ok(Event::Incoming(Packet::PubAck(ack))) => {
                    self.shared.acks.acknowledge(ack.pkid);
                    None
                }
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    debug!(pkid = ack.pkid, "Subscription acknowledged");
                    None
                }
                Ok(Event::Outgoing(Outgoing::Publish(pkid))) => {
                    self.shared.acks.assign(pkid);
                    None
                }
                Ok(_) => None,
                Err(e) => {
                    self.mark_down();
                    warn!(error = %e, "MQTT connection error");
                    if events
                        .send(E::from(BusEvent::Disconnected {
                            reason: e.to_string(),
                        }))
                        .await
                        .is_err()
                    {
                        break;
                    }

                    // Parked until the supervisor's timer fires.
                    tokio::select! {
                        () = shutdown.cancelled() => break,
                        () = self.shared.resume.notified() => {
                            debug!("Resuming MQTT connect");
                        }
                    }
                    None
                }
            };

            if let Some(event) = event {
                if events.send(E::from(event)).await.is_err() {
                    debug!("Event receiver closed");
                    break;
                }
            }
        }

        self.mark_down();
        info!("MQTT driver stopped");
    }

    fn mark_down(&self) {
        self.shared.connected.store(false, Ordering::Release);
        self.shared.acks.fail_all(BusError::ConnectionDropped);
    }

    /// Send DISCONNECT if connected, giving the event loop a moment to flush it.
    async fn disconnect(&mut self) {
        if !self.is_connected() || self.client.try_disconnect().is_err() {
            return;
        }

        let eventloop = &mut self.eventloop;
        let flushed = tokio::time::timeout(DISCONNECT_GRACE, async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        })
        .await;
        debug!(flushed = flushed.is_ok(), "MQTT disconnect sent");
    }
}
