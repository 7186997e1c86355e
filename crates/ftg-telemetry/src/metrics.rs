//! Prometheus metrics for the gateway client runtime.
//!
//! Covers the runtime's observable spine:
//! - Channel connectivity and session state
//! - Event-loop throughput and callback latency
//! - Tick/bar production
//! - Outstanding queries and order status changes
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, register_int_counter,
    register_int_gauge_vec, CounterVec, GaugeVec, HistogramVec, IntCounter, IntGaugeVec,
    TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Channel connectivity (1 = connected, 0 = disconnected).
/// Labels: channel (md/td)
pub static FRONT_CONNECTED: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "ftg_front_connected",
        "Front connectivity per channel (1=connected)",
        &["channel"]
    )
    .unwrap()
});

/// Session state machine current state.
/// Labels: channel, state (disconnected/connecting/authenticating/ready)
pub static SESSION_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "ftg_session_state",
        "Session state per channel (1=active, 0=inactive)",
        &["channel", "state"]
    )
    .unwrap()
});

/// Total front reconnections observed.
pub static RECONNECT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ftg_reconnect_total",
        "Total front reconnections per channel",
        &["channel"]
    )
    .unwrap()
});

/// Raw events drained by the event loop.
pub static EVENTS_DRAINED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ftg_events_drained_total",
        "Raw transport events drained by the event loop",
        &["kind"]
    )
    .unwrap()
});

/// Time spent inside application callbacks per raw event.
pub static CALLBACK_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "ftg_callback_latency_ms",
        "Application callback latency in milliseconds",
        &["kind"],
        vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 50.0, 100.0, 500.0]
    )
    .unwrap()
});

/// Ticks processed per instrument.
pub static TICKS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ftg_ticks_total",
        "Market data ticks processed",
        &["instrument"]
    )
    .unwrap()
});

/// Minute bars closed per instrument.
pub static BARS_CLOSED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ftg_bars_closed_total",
        "Minute bars closed",
        &["instrument"]
    )
    .unwrap()
});

/// Queries currently outstanding per channel.
pub static QUERIES_OUTSTANDING: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "ftg_queries_outstanding",
        "Outstanding correlated queries per channel",
        &["channel"]
    )
    .unwrap()
});

/// Order status-change callbacks emitted.
pub static ORDER_STATUS_CHANGES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ftg_order_status_changes_total",
        "Order callbacks emitted after a status or submit-status change",
        &["status"]
    )
    .unwrap()
});

/// Idle callbacks delivered.
pub static IDLE_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("ftg_idle_total", "Idle callbacks delivered").unwrap()
});

/// Convenience facade over the metric statics.
pub struct Metrics;

impl Metrics {
    /// Set channel connectivity.
    pub fn front_connected(channel: &str, connected: bool) {
        FRONT_CONNECTED
            .with_label_values(&[channel])
            .set(if connected { 1.0 } else { 0.0 });
    }

    /// Mark the active session state for a channel, clearing the others.
    pub fn session_state_set(channel: &str, state: &str) {
        for s in ["disconnected", "connecting", "authenticating", "ready"] {
            SESSION_STATE
                .with_label_values(&[channel, s])
                .set(if s == state { 1.0 } else { 0.0 });
        }
    }

    /// Record a front reconnection.
    pub fn reconnect(channel: &str) {
        RECONNECT_TOTAL.with_label_values(&[channel]).inc();
    }

    /// Record one drained raw event.
    pub fn event_drained(kind: &str) {
        EVENTS_DRAINED_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record callback time for one raw event.
    pub fn callback_latency(kind: &str, latency_ms: f64) {
        CALLBACK_LATENCY_MS
            .with_label_values(&[kind])
            .observe(latency_ms);
    }

    /// Record a processed tick.
    pub fn tick(instrument: &str) {
        TICKS_TOTAL.with_label_values(&[instrument]).inc();
    }

    /// Record a closed bar.
    pub fn bar_closed(instrument: &str) {
        BARS_CLOSED_TOTAL.with_label_values(&[instrument]).inc();
    }

    /// Track outstanding query count.
    pub fn queries_outstanding(channel: &str, count: i64) {
        QUERIES_OUTSTANDING.with_label_values(&[channel]).set(count);
    }

    /// Record an emitted order status-change callback.
    pub fn order_status_change(status: &str) {
        ORDER_STATUS_CHANGES_TOTAL.with_label_values(&[status]).inc();
    }

    /// Record an idle callback.
    pub fn idle() {
        IDLE_TOTAL.inc();
    }
}

/// Render all registered metrics in the Prometheus text format.
pub fn gather_text() -> TelemetryResult<String> {
    let encoder = TextEncoder::new();
    encoder
        .encode_to_string(&prometheus::gather())
        .map_err(|e| TelemetryError::Metrics(e.to_string()))
}
