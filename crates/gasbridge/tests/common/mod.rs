//! Shared harness: a hub with mock bus seams behind a real listener.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use futures_util::StreamExt;
use gasbridge_bus::{BusEvent, MockLink, MockPublisher};
use gasbridge_core::TopicTable;
use gasbridge_dashboard::{create_router, serve, AppState, CommandGateway, DashboardConfig};
use gasbridge_hub::{spawn_hub, HubConfig, HubEvent, HubHandle};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Bridge {
    pub addr: SocketAddr,
    pub hub: HubHandle,
    pub link: Arc<MockLink>,
    pub publisher: Arc<MockPublisher>,
    router: Router,
    shutdown: CancellationToken,
}

impl Bridge {
    pub async fn start() -> Self {
        Self::with_max_connections(DashboardConfig::default().max_connections).await
    }

    pub async fn with_max_connections(max_connections: usize) -> Self {
        let shutdown = CancellationToken::new();
        let link = Arc::new(MockLink::new());
        let publisher = Arc::new(MockPublisher::new());

        let hub_config = HubConfig {
            reconnect_delay: Duration::from_millis(50),
            ..Default::default()
        };
        let (hub, _hub_task) = spawn_hub(hub_config, link.clone(), shutdown.clone());

        let dashboard = DashboardConfig {
            bind_address: "127.0.0.1".to_string(),
            port: 0,
            max_connections,
            ..Default::default()
        };
        let gateway = CommandGateway::new(publisher.clone(), TopicTable::default());
        let state = AppState::new(hub.clone(), gateway, dashboard);
        let router = create_router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, state, shutdown.clone()));

        Self {
            addr,
            hub,
            link,
            publisher,
            router,
            shutdown,
        }
    }

    /// Inject a broker event as if the driver had produced it.
    pub async fn bus(&self, event: BusEvent) {
        self.hub.send(HubEvent::Bus(event)).await.unwrap();
    }

    pub async fn publish(&self, topic: &str, payload: &str) {
        self.bus(BusEvent::Message {
            topic: topic.to_string(),
            payload: payload.to_string(),
        })
        .await;
    }

    pub async fn ws_connect(&self) -> WsClient {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", self.addr))
            .await
            .unwrap();
        ws
    }

    /// Connect and consume the two greeting frames.
    pub async fn ws_connect_greeted(&self) -> WsClient {
        let mut ws = self.ws_connect().await;
        assert_eq!(next_envelope(&mut ws).await["type"], "data");
        assert_eq!(next_envelope(&mut ws).await["type"], "notifications");
        ws
    }

    pub async fn call(&self, method: Method, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    /// Poll `/api/health` until the hub reports `clients` live clients.
    pub async fn wait_for_clients(&self, clients: usize) {
        let deadline = tokio::time::Instant::now() + FRAME_TIMEOUT;
        loop {
            if self.hub.health().await.unwrap().clients == clients {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "hub never reached {clients} clients"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Next text frame, parsed as JSON.
pub async fn next_envelope(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let message = tokio::time::timeout(FRAME_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        match message {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Assert that no frame arrives within a short window.
pub async fn assert_silent(ws: &mut WsClient) {
    let result = tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(result.is_err(), "unexpected frame: {result:?}");
}
