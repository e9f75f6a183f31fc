//! End-to-end flows through the hub, the HTTP API and the live channel.

mod common;

use axum::http::{Method, StatusCode};
use common::{assert_silent, next_envelope, Bridge};
use futures_util::SinkExt;
use gasbridge_bus::BusEvent;
use serde_json::json;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

#[tokio::test]
async fn test_greeting_then_live_update() {
    let bridge = Bridge::start().await;
    let mut ws = bridge.ws_connect().await;

    let data = next_envelope(&mut ws).await;
    assert_eq!(data["type"], "data");
    assert_eq!(data["data"]["gasLevel"], 0);
    assert_eq!(data["data"]["threshold"], 4000);
    assert_eq!(data["data"]["mode"], "AUTO");
    assert_eq!(data["data"]["lastUpdate"], serde_json::Value::Null);

    let history = next_envelope(&mut ws).await;
    assert_eq!(history, json!({"type": "notifications", "data": []}));

    bridge.publish("gas/sensor/gasLevel", "1234").await;
    let update = next_envelope(&mut ws).await;
    assert_eq!(update["type"], "data");
    assert_eq!(update["data"]["gasLevel"], 1234);
    assert!(update["data"]["lastUpdate"].is_string());
}

#[tokio::test]
async fn test_relay_command_closes_loop_through_status_echo() {
    let bridge = Bridge::start().await;
    let mut ws = bridge.ws_connect_greeted().await;

    let (status, body) = bridge
        .call(Method::POST, "/api/control/relay1", r#"{"state":true}"#)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "state": true}));
    assert_eq!(
        bridge.publisher.published(),
        vec![("gas/control/relay1".to_string(), "1".to_string())]
    );

    // The command alone does not touch state.
    assert_silent(&mut ws).await;
    let (_, data) = bridge.call(Method::GET, "/api/data", "").await;
    assert_eq!(data["data"]["relay1"], false);

    bridge.publish("gas/status/relay1", "1").await;
    let update = next_envelope(&mut ws).await;
    assert_eq!(update["type"], "data");
    assert_eq!(update["data"]["relay1"], true);

    let (status, data) = bridge.call(Method::GET, "/api/data", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["success"], true);
    assert_eq!(data["data"]["relay1"], true);
}

#[tokio::test]
async fn test_threshold_out_of_range_is_not_published() {
    let bridge = Bridge::start().await;

    let (status, body) = bridge
        .call(Method::POST, "/api/control/threshold", r#"{"threshold":10000}"#)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Threshold must be between 200 and 9999");
    assert!(bridge.publisher.published().is_empty());
}

#[tokio::test]
async fn test_connection_limit_rejects_extra_client() {
    let bridge = Bridge::with_max_connections(1).await;
    let _first = bridge.ws_connect_greeted().await;

    let url = format!("ws://{}/ws", bridge.addr);
    match tokio_tungstenite::connect_async(url).await {
        Err(WsError::Http(response)) => {
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE)
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("second client should be rejected"),
    }
}

#[tokio::test]
async fn test_connectivity_changes_are_broadcast() {
    let bridge = Bridge::start().await;
    let mut ws = bridge.ws_connect_greeted().await;

    bridge.bus(BusEvent::Connected).await;
    let up = next_envelope(&mut ws).await;
    assert_eq!(up["data"]["busConnected"], true);
    assert_eq!(bridge.link.subscriptions().len(), 1);

    bridge
        .bus(BusEvent::Disconnected {
            reason: "broker closed".to_string(),
        })
        .await;
    let down = next_envelope(&mut ws).await;
    assert_eq!(down["data"]["busConnected"], false);

    let (_, health) = bridge.call(Method::GET, "/api/health", "").await;
    assert_eq!(health["success"], true);
    assert_eq!(health["mqtt"], false);
    assert_eq!(health["websocket"], 1);

    // Repeated drops do not produce repeated frames.
    bridge
        .bus(BusEvent::Disconnected {
            reason: "broker closed".to_string(),
        })
        .await;
    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn test_client_close_releases_slot() {
    let bridge = Bridge::start().await;
    let mut ws = bridge.ws_connect_greeted().await;
    bridge.wait_for_clients(1).await;

    ws.send(Message::Close(None)).await.unwrap();
    bridge.wait_for_clients(0).await;

    let (_, health) = bridge.call(Method::GET, "/api/health", "").await;
    assert_eq!(health["websocket"], 0);
}

#[tokio::test]
async fn test_notification_fans_out_and_lands_in_history() {
    let bridge = Bridge::start().await;
    let mut a = bridge.ws_connect_greeted().await;
    let mut b = bridge.ws_connect_greeted().await;

    bridge
        .publish(
            "gas/notification",
            r#"{"type":"danger","message":"Gas leak detected","level":"critical"}"#,
        )
        .await;

    for ws in [&mut a, &mut b] {
        let frame = next_envelope(ws).await;
        assert_eq!(frame["type"], "notification");
        assert_eq!(frame["data"]["message"], "Gas leak detected");
        assert_eq!(frame["data"]["level"], "critical");
    }

    let (status, body) = bridge.call(Method::GET, "/api/notifications?limit=5", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    // Late joiners get the history in their greeting.
    let mut late = bridge.ws_connect().await;
    assert_eq!(next_envelope(&mut late).await["type"], "data");
    let history = next_envelope(&mut late).await;
    assert_eq!(history["type"], "notifications");
    assert_eq!(history["data"][0]["message"], "Gas leak detected");
}
