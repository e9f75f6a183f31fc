//! Prometheus metrics for the bridge.
//!
//! # Panics
//!
//! Registration panics on a duplicate metric name. This can only happen on
//! first access of a static, never while recording.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_histogram_vec,
    register_int_counter, register_int_gauge, CounterVec, Encoder, Gauge, GaugeVec, HistogramVec,
    IntCounter, IntGauge, TextEncoder,
};

/// Broker connection state (1 = connected, 0 = disconnected).
pub static BUS_CONNECTED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "gasbridge_bus_connected",
        "Broker connection state (1=connected)"
    )
    .unwrap()
});

/// Reconnect supervisor current state.
/// Labels: state (idle/connecting/connected/armed)
pub static SUPERVISOR_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "gasbridge_supervisor_state",
        "Reconnect supervisor current state (1=active, 0=inactive)",
        &["state"]
    )
    .unwrap()
});

/// Reconnect timers armed.
pub static BUS_RECONNECT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "gasbridge_bus_reconnect_total",
        "Total reconnect timers armed after a broker disconnect"
    )
    .unwrap()
});

/// Bus messages applied to the device state.
pub static INGESTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "gasbridge_ingested_total",
        "Bus messages applied to device state",
        &["field"]
    )
    .unwrap()
});

/// Bus payloads dropped as malformed.
pub static DECODE_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "gasbridge_decode_errors_total",
        "Bus payloads dropped as malformed",
        &["kind"]
    )
    .unwrap()
});

/// Device notifications received.
pub static NOTIFICATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "gasbridge_notifications_total",
        "Device notifications received",
        &["category", "severity"]
    )
    .unwrap()
});

/// Live dashboard clients.
pub static LIVE_CLIENTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("gasbridge_live_clients", "Connected dashboard clients").unwrap()
});

/// Clients removed because their queue was full or closed.
pub static CLIENTS_DROPPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "gasbridge_clients_dropped_total",
        "Dashboard clients dropped on send failure"
    )
    .unwrap()
});

/// Envelopes broadcast.
pub static BROADCAST_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "gasbridge_broadcast_total",
        "Envelopes broadcast to live clients",
        &["envelope"]
    )
    .unwrap()
});

/// Control commands by outcome.
pub static COMMANDS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "gasbridge_commands_total",
        "Control commands handled",
        &["command", "outcome"]
    )
    .unwrap()
});

/// Time from command receipt to PUBACK in milliseconds.
pub static COMMAND_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "gasbridge_command_latency_ms",
        "Command publish latency until PUBACK in milliseconds",
        &["command"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record broker connectivity.
    pub fn bus_connected(connected: bool) {
        BUS_CONNECTED.set(if connected { 1.0 } else { 0.0 });
    }

    /// Set supervisor state. Only the active state is 1.
    pub fn supervisor_state_set(state: &str) {
        for s in ["idle", "connecting", "connected", "armed"] {
            SUPERVISOR_STATE.with_label_values(&[s]).set(0.0);
        }
        SUPERVISOR_STATE.with_label_values(&[state]).set(1.0);
    }

    /// Record an armed reconnect timer.
    pub fn bus_reconnect() {
        BUS_RECONNECT_TOTAL.inc();
    }

    /// Record an applied field update.
    pub fn ingested(field: &str) {
        INGESTED_TOTAL.with_label_values(&[field]).inc();
    }

    /// Record a dropped payload.
    pub fn decode_error(kind: &str) {
        DECODE_ERRORS_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record a device notification.
    pub fn notification(category: &str, severity: &str) {
        NOTIFICATIONS_TOTAL
            .with_label_values(&[category, severity])
            .inc();
    }

    /// Set live client count.
    pub fn live_clients(count: usize) {
        LIVE_CLIENTS.set(count as i64);
    }

    /// Record a client dropped on send failure.
    pub fn client_dropped() {
        CLIENTS_DROPPED_TOTAL.inc();
    }

    /// Record a broadcast envelope.
    pub fn broadcast(envelope: &str) {
        BROADCAST_TOTAL.with_label_values(&[envelope]).inc();
    }

    /// Record a command outcome ("ok", "invalid", or a transport error kind).
    pub fn command(command: &str, outcome: &str) {
        COMMANDS_TOTAL.with_label_values(&[command, outcome]).inc();
    }

    /// Record command latency.
    pub fn command_latency(command: &str, latency_ms: f64) {
        COMMAND_LATENCY_MS
            .with_label_values(&[command])
            .observe(latency_ms);
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_recorded_metrics() {
        Metrics::bus_connected(true);
        Metrics::command("set-relay1", "ok");
        Metrics::supervisor_state_set("connected");

        let text = Metrics::render().unwrap();
        assert!(text.contains("gasbridge_bus_connected 1"));
        assert!(text.contains("gasbridge_commands_total"));
        assert!(text.contains("state=\"connected\""));
    }
}
