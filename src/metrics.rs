//! Prometheus metrics for the trading loop.
//!
//! This module provides metrics for:
//! - Tick outcomes and market-resolution skips
//! - Order acceptance and rejection
//! - Relative-value opens, closes and unreconciled legs
//! - Momentum trades
//! - Quote and order submission latency

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Completed ticks, labelled by outcome.
pub const METRIC_TICKS: &str = "ticks_total";
/// Ticks skipped because the 15-minute market was unresolved.
pub const METRIC_MARKET_SKIPS: &str = "market_skips_total";
/// Ticks that returned an error.
pub const METRIC_TICK_ERRORS: &str = "tick_errors_total";
/// Orders accepted by the gateway.
pub const METRIC_ORDERS_ACCEPTED: &str = "orders_accepted_total";
/// Orders rejected by the gateway.
pub const METRIC_ORDERS_REJECTED: &str = "orders_rejected_total";
/// Paired positions opened.
pub const METRIC_RV_OPENS: &str = "rv_opens_total";
/// Paired positions closed.
pub const METRIC_RV_CLOSES: &str = "rv_closes_total";
/// Two-leg attempts where exactly one leg was accepted.
pub const METRIC_RV_UNRECONCILED_LEGS: &str = "rv_unreconciled_legs_total";
/// Momentum orders accepted.
pub const METRIC_MOMENTUM_TRADES: &str = "momentum_trades_total";
/// Price request latency.
pub const METRIC_QUOTE_FETCH_LATENCY: &str = "quote_fetch_latency_ms";
/// Order submission latency.
pub const METRIC_ORDER_SUBMIT_LATENCY: &str = "order_submit_latency_ms";

/// Initialize all metric descriptions.
/// Call this once at startup, after installing a recorder.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_QUOTE_FETCH_LATENCY,
        "Price request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_ORDER_SUBMIT_LATENCY,
        "Order submission latency in milliseconds"
    );

    describe_counter!(METRIC_TICKS, "Total number of completed ticks by outcome");
    describe_counter!(
        METRIC_MARKET_SKIPS,
        "Ticks skipped because the 15-minute market was not found"
    );
    describe_counter!(METRIC_TICK_ERRORS, "Ticks that failed with an error");
    describe_counter!(METRIC_ORDERS_ACCEPTED, "Total number of orders accepted");
    describe_counter!(METRIC_ORDERS_REJECTED, "Total number of orders rejected");
    describe_counter!(METRIC_RV_OPENS, "Relative-value positions opened");
    describe_counter!(METRIC_RV_CLOSES, "Relative-value positions closed");
    describe_counter!(
        METRIC_RV_UNRECONCILED_LEGS,
        "Two-leg attempts that left a single accepted leg"
    );
    describe_counter!(METRIC_MOMENTUM_TRADES, "Momentum orders accepted");

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder and return its render handle.
pub fn install_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("failed to install metrics recorder: {}", e))
}

/// Record quote fetch latency.
pub fn record_quote_fetch_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_QUOTE_FETCH_LATENCY).record(latency_ms);
}

/// Increment the tick counter for an outcome label.
pub fn inc_ticks(outcome: impl Into<String>) {
    counter!(METRIC_TICKS, "outcome" => outcome.into()).increment(1);
}

/// Increment market skip counter.
pub fn inc_market_skips() {
    counter!(METRIC_MARKET_SKIPS).increment(1);
}

/// Increment tick error counter.
pub fn inc_tick_errors() {
    counter!(METRIC_TICK_ERRORS).increment(1);
}

/// Increment orders accepted counter.
pub fn inc_orders_accepted() {
    counter!(METRIC_ORDERS_ACCEPTED).increment(1);
}

/// Increment orders rejected counter.
pub fn inc_orders_rejected() {
    counter!(METRIC_ORDERS_REJECTED).increment(1);
}

/// Increment RV opens counter.
pub fn inc_rv_opens() {
    counter!(METRIC_RV_OPENS).increment(1);
}

/// Increment RV closes counter.
pub fn inc_rv_closes() {
    counter!(METRIC_RV_CLOSES).increment(1);
}

/// Increment unreconciled leg counter.
pub fn inc_rv_unreconciled_legs() {
    counter!(METRIC_RV_UNRECONCILED_LEGS).increment(1);
}

/// Increment momentum trades counter.
pub fn inc_momentum_trades() {
    counter!(METRIC_MOMENTUM_TRADES).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for order submission.
pub fn timer_order_submit() -> LatencyTimer {
    LatencyTimer::new(METRIC_ORDER_SUBMIT_LATENCY)
}
