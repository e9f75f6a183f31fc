//! REST handlers: control commands, state and history reads, health.
//!
//! Every JSON response is `{"success": true, ...}` or
//! `{"success": false, "error": "..."}`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use gasbridge_core::{Actuator, Command, DeviceState, Mode, NotificationEntry};
use gasbridge_hub::HubError;
use gasbridge_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gateway::GatewayError;
use crate::server::AppState;

// ============================================================================
// Request / response types
// ============================================================================

/// Body of actuator commands.
#[derive(Debug, Deserialize)]
pub struct StateRequest {
    pub state: bool,
}

/// Body of `set-mode`.
#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: Mode,
}

/// Body of `set-threshold`.
#[derive(Debug, Deserialize)]
pub struct ThresholdRequest {
    pub threshold: i64,
}

/// Query of the history endpoint. Unparseable or zero limits fall back to the default.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<String>,
}

/// Successful response: `success: true` plus the flattened body.
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(body: T) -> Json<Self> {
        Json(Self {
            success: true,
            body,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DataBody<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct StateEcho {
    pub state: bool,
}

#[derive(Debug, Serialize)]
pub struct ModeEcho {
    pub mode: Mode,
}

#[derive(Debug, Serialize)]
pub struct ThresholdEcho {
    pub threshold: u32,
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    /// Broker connection up.
    pub mqtt: bool,
    /// Live WebSocket clients.
    pub websocket: usize,
    /// Seconds since the server started.
    pub uptime: u64,
}

#[derive(Debug, Serialize)]
struct ApiFailure {
    success: bool,
    error: String,
}

// ============================================================================
// Errors
// ============================================================================

/// Handler failure mapped to a status code.
#[derive(Debug)]
pub enum ApiError {
    /// Invalid input (400).
    BadRequest(String),
    /// Bus transport failure (500).
    Transport(String),
    /// Hub is shutting down (503).
    Unavailable(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Validation(_) => Self::BadRequest(e.to_string()),
            GatewayError::Transport(_) => Self::Transport(e.to_string()),
        }
    }
}

impl From<HubError> for ApiError {
    fn from(e: HubError) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            Self::BadRequest(m) | Self::Transport(m) | Self::Unavailable(m) => m,
        };
        debug!(%status, %error, "Request failed");
        (
            status,
            Json(ApiFailure {
                success: false,
                error,
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<ApiSuccess<T>>, ApiError>;

// ============================================================================
// Control handlers
// ============================================================================

async fn set_actuator(
    state: &AppState,
    actuator: Actuator,
    body: Result<Json<StateRequest>, JsonRejection>,
) -> ApiResult<StateEcho> {
    let Json(request) = body?;
    state
        .gateway
        .execute(Command::set_actuator(actuator, request.state))
        .await?;
    Ok(ApiSuccess::new(StateEcho {
        state: request.state,
    }))
}

pub async fn set_relay1(
    State(state): State<AppState>,
    body: Result<Json<StateRequest>, JsonRejection>,
) -> ApiResult<StateEcho> {
    set_actuator(&state, Actuator::Relay1, body).await
}

pub async fn set_relay2(
    State(state): State<AppState>,
    body: Result<Json<StateRequest>, JsonRejection>,
) -> ApiResult<StateEcho> {
    set_actuator(&state, Actuator::Relay2, body).await
}

pub async fn set_window(
    State(state): State<AppState>,
    body: Result<Json<StateRequest>, JsonRejection>,
) -> ApiResult<StateEcho> {
    set_actuator(&state, Actuator::Window, body).await
}

pub async fn set_buzzer(
    State(state): State<AppState>,
    body: Result<Json<StateRequest>, JsonRejection>,
) -> ApiResult<StateEcho> {
    set_actuator(&state, Actuator::Buzzer, body).await
}

pub async fn set_mode(
    State(state): State<AppState>,
    body: Result<Json<ModeRequest>, JsonRejection>,
) -> ApiResult<ModeEcho> {
    let Json(request) = body?;
    state
        .gateway
        .execute(Command::set_mode(request.mode))
        .await?;
    Ok(ApiSuccess::new(ModeEcho { mode: request.mode }))
}

pub async fn set_threshold(
    State(state): State<AppState>,
    body: Result<Json<ThresholdRequest>, JsonRejection>,
) -> ApiResult<ThresholdEcho> {
    let Json(request) = body?;
    let threshold = state.gateway.set_threshold(request.threshold).await?;
    Ok(ApiSuccess::new(ThresholdEcho { threshold }))
}

// ============================================================================
// Read handlers
// ============================================================================

pub async fn get_data(State(state): State<AppState>) -> ApiResult<DataBody<DeviceState>> {
    let data = state.hub.snapshot().await?;
    Ok(ApiSuccess::new(DataBody { data }))
}

pub async fn get_notifications(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<DataBody<Vec<NotificationEntry>>> {
    let Query(query) = query?;
    let limit = query
        .limit
        .and_then(|l| l.trim().parse::<usize>().ok())
        .filter(|l| *l > 0)
        .unwrap_or(state.config.default_history_limit);
    let data = state.hub.notifications(limit).await?;
    Ok(ApiSuccess::new(DataBody { data }))
}

pub async fn health(State(state): State<AppState>) -> ApiResult<HealthBody> {
    let health = state.hub.health().await?;
    Ok(ApiSuccess::new(HealthBody {
        mqtt: health.bus_connected,
        websocket: health.clients,
        uptime: state.started_at.elapsed().as_secs(),
    }))
}

/// Prometheus text exposition.
pub async fn metrics() -> Response {
    match Metrics::render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
