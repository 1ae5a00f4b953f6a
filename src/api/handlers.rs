//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::strategy::{MomentumTradeState, RvSnapshot};

/// Loop state published after every tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    /// "live" or "dry_run".
    pub mode: &'static str,
    /// Time of the last completed tick.
    pub last_tick: Option<DateTime<Utc>>,
    /// Classification of the last tick.
    pub last_outcome: Option<String>,
    /// Current 15-minute market slug.
    pub short_slug: Option<String>,
    /// Current 1-hour market slug.
    pub long_slug: Option<String>,
    /// Relative-value position.
    pub rv: RvSnapshot,
    /// Momentum guard.
    pub momentum: MomentumTradeState,
    /// Counters since start.
    pub counters: TickCounters,
}

/// Tick counters since start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickCounters {
    /// Ticks that evaluated both paths.
    pub ok: u64,
    /// Ticks skipped for lack of a 15-minute market.
    pub skipped: u64,
    /// Ticks that failed.
    pub errors: u64,
}

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Whether the loop has completed a tick.
    pub ready: Arc<AtomicBool>,
    /// Latest loop snapshot.
    pub status: Arc<RwLock<StatusSnapshot>>,
    /// Prometheus render handle, if a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            status: Arc::new(RwLock::new(StatusSnapshot::default())),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Replace the published snapshot.
    pub async fn publish(&self, snapshot: StatusSnapshot) {
        *self.status.write().await = snapshot;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether service is ready.
    pub ready: bool,
    /// Current 15-minute market slug if available.
    pub market: Option<String>,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service status.
    pub status: &'static str,
    /// Loop snapshot.
    #[serde(flatten)]
    pub snapshot: StatusSnapshot,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if ready, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let market = state.status.read().await.short_slug.clone();

    let response = ReadyResponse {
        ready: is_ready,
        market,
    };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Status handler - returns the latest loop snapshot.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.status.read().await.clone();
    let status = if state.is_ready() { "running" } else { "starting" };

    Json(StatusResponse { status, snapshot })
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_state_ready_toggle() {
        let state = AppState::new();
        assert!(!state.is_ready());

        state.set_ready(true);
        assert!(state.is_ready());

        state.set_ready(false);
        assert!(!state.is_ready());
    }

    #[tokio::test]
    async fn publish_replaces_snapshot() {
        let state = AppState::new();
        state
            .publish(StatusSnapshot {
                mode: "dry_run",
                short_slug: Some("btc-updown-15m-1760900400".to_string()),
                ..StatusSnapshot::default()
            })
            .await;

        let snapshot = state.status.read().await.clone();
        assert_eq!(snapshot.mode, "dry_run");
        assert_eq!(snapshot.short_slug.as_deref(), Some("btc-updown-15m-1760900400"));
    }
}
