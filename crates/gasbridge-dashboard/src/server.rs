//! HTTP server implementation using axum.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures_util::stream::StreamExt;
use futures_util::SinkExt;
use gasbridge_hub::{ClientSession, HubHandle};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::api;
use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::gateway::CommandGateway;

/// Connection limiter to prevent too many concurrent WebSocket connections.
pub struct ConnectionLimiter {
    current: AtomicUsize,
    max: usize,
}

impl ConnectionLimiter {
    pub fn new(max: usize) -> Self {
        Self {
            current: AtomicUsize::new(0),
            max,
        }
    }

    /// Take a slot. The slot is released when the guard drops.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ConnectionGuard> {
        loop {
            let current = self.current.load(Ordering::Acquire);
            if current >= self.max {
                return None;
            }
            if self
                .current
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(ConnectionGuard {
                    limiter: Arc::clone(self),
                });
            }
        }
    }

    pub fn current_count(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }
}

/// Owned connection slot; moves into the socket task.
pub struct ConnectionGuard {
    limiter: Arc<ConnectionLimiter>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.limiter.current.fetch_sub(1, Ordering::Release);
    }
}

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub(crate) hub: HubHandle,
    pub(crate) gateway: CommandGateway,
    connection_limiter: Arc<ConnectionLimiter>,
    pub(crate) config: DashboardConfig,
    pub(crate) started_at: Instant,
}

impl AppState {
    pub fn new(hub: HubHandle, gateway: CommandGateway, config: DashboardConfig) -> Self {
        Self {
            hub,
            gateway,
            connection_limiter: Arc::new(ConnectionLimiter::new(config.max_connections)),
            config,
            started_at: Instant::now(),
        }
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/data", get(api::get_data))
        .route("/api/notifications", get(api::get_notifications))
        .route("/api/health", get(api::health))
        .route("/api/control/relay1", post(api::set_relay1))
        .route("/api/control/relay2", post(api::set_relay2))
        .route("/api/control/window", post(api::set_window))
        .route("/api/control/buzzer", post(api::set_buzzer))
        .route("/api/control/mode", post(api::set_mode))
        .route("/api/control/threshold", post(api::set_threshold))
        .route("/metrics", get(api::metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// WebSocket upgrade handler.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    // Check connection limit
    let guard = match state.connection_limiter.try_acquire() {
        Some(guard) => guard,
        None => {
            warn!(
                current = state.connection_limiter.current_count(),
                max = state.config.max_connections,
                "WebSocket connection limit reached"
            );
            return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
        }
    };

    info!(
        connections = state.connection_limiter.current_count(),
        "New WebSocket connection"
    );

    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, guard))
}

/// Handle a WebSocket connection.
async fn handle_ws_connection(socket: WebSocket, state: AppState, _guard: ConnectionGuard) {
    let ClientSession { id, mut outbound } =
        match state.hub.connect_client(state.config.client_buffer).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Hub unavailable, closing WebSocket");
                return;
            }
        };

    let (mut sender, mut receiver) = socket.split();

    // Spawn task to handle incoming messages (for ping/pong and close)
    let mut incoming_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "WebSocket receive error");
                    break;
                }
                // Pings are answered by axum; clients have nothing to say.
                _ => {}
            }
        }
    });

    // Main loop: forward queued frames to the socket
    loop {
        tokio::select! {
            frame = outbound.recv() => {
                match frame {
                    Some(frame) => {
                        if sender.send(Message::Text(frame.into())).await.is_err() {
                            debug!(client = %id, "Failed to send message, client disconnected");
                            break;
                        }
                    }
                    None => {
                        debug!(client = %id, "Hub released client");
                        break;
                    }
                }
            }
            _ = &mut incoming_task => {
                debug!(client = %id, "Incoming task completed, closing connection");
                break;
            }
        }
    }

    incoming_task.abort();
    state.hub.disconnect_client(id).await;
    let _ = sender.close().await;

    info!(
        client = %id,
        connections = state.connection_limiter.current_count().saturating_sub(1),
        "WebSocket connection closed"
    );
}

/// Serve on an already bound listener until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> DashboardResult<()> {
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

/// Run the dashboard HTTP server.
pub async fn run_server(state: AppState, shutdown: CancellationToken) -> DashboardResult<()> {
    let config = &state.config;
    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .map_err(|_| {
            DashboardError::InvalidAddress(format!("{}:{}", config.bind_address, config.port))
        })?;

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Starting dashboard server");

    serve(listener, state, shutdown).await
}
