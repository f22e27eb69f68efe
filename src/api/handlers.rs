//! API route handlers
//!
//! Request handling logic for the dyno dashboard endpoints: the latest
//! reading, system status, the WebSocket reading stream, and the liveness
//! probe.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::pipeline::{AppState, ReadingStore};
use crate::types::Reading;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct DashboardState {
    /// Lock-free snapshot of the latest published reading
    pub reading: Arc<ReadingStore>,
    /// Dashboard counters from the pipeline
    pub app_state: Arc<RwLock<AppState>>,
}

impl DashboardState {
    pub fn new(reading: Arc<ReadingStore>, app_state: Arc<RwLock<AppState>>) -> Self {
        Self { reading, app_state }
    }
}

// ============================================================================
// Reading Endpoint
// ============================================================================

/// Latest reading, rounded to display precision.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReadingResponse {
    /// Roller speed (rev/min)
    pub rpm: f64,
    /// Linear speed (km/h)
    pub speed_kmh: f64,
    /// Torque (Nm); negative under braking
    pub torque_nm: f64,
    /// Power (W); sign follows torque
    pub power_w: f64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

impl From<Reading> for ReadingResponse {
    fn from(r: Reading) -> Self {
        Self {
            rpm: round_to(r.rpm, 1),
            speed_kmh: round_to(r.speed_kmh, 2),
            torque_nm: round_to(r.torque_nm, 2),
            power_w: round_to(r.power_w, 1),
        }
    }
}

/// GET /api/v1/reading - the latest computed reading.
///
/// Polled by the frontend every ~200 ms. Always returns immediately with the
/// most recently published snapshot (all-zero before any sample or while the
/// sensor link is stalled).
pub async fn get_reading(State(state): State<DashboardState>) -> Json<ReadingResponse> {
    Json(ReadingResponse::from(state.reading.get()))
}

// ============================================================================
// Status Endpoint
// ============================================================================

/// System status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Sensor link state ("Live" or "Stalled")
    pub link_state: String,
    /// Active sample source name
    pub source: String,
    /// Uptime in seconds
    pub uptime_secs: u64,
    /// Valid samples processed
    pub samples_processed: u64,
    /// Samples discarded as absent/invalid
    pub samples_discarded: u64,
    /// Torque/power candidates rejected by the outlier filter
    pub outliers_rejected: u64,
    /// Live→Stalled transitions
    pub stalls: u64,
    /// Wall-clock time of the last valid sample
    pub last_sample_at: Option<DateTime<Utc>>,

    // === Configuration echo ===
    /// Roller circumference (m)
    pub roller_circumference_m: f64,
    /// Acceleration window (s)
    pub window_s: f64,
    /// Stop timeout (s)
    pub stop_timeout_s: f64,
}

/// GET /api/v1/status - link state, counters, and config echo.
pub async fn get_status(State(state): State<DashboardState>) -> Json<StatusResponse> {
    let app_state = state.app_state.read().await;
    let cfg = crate::config::get();

    Json(StatusResponse {
        link_state: app_state.link.to_string(),
        source: app_state.source_name.clone(),
        uptime_secs: app_state.uptime_secs(),
        samples_processed: app_state.samples_processed,
        samples_discarded: app_state.samples_discarded,
        outliers_rejected: app_state.outliers_rejected,
        stalls: app_state.stalls,
        last_sample_at: app_state.last_sample_at,
        roller_circumference_m: cfg.roller.circumference_m,
        window_s: cfg.physics.window_s,
        stop_timeout_s: cfg.pipeline.stop_timeout_s,
    })
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// Liveness probe response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
}

/// GET /health - liveness probe.
pub async fn health_check(State(state): State<DashboardState>) -> Json<HealthResponse> {
    let app_state = state.app_state.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: app_state.uptime_secs(),
    })
}

// ============================================================================
// Reading Stream (WebSocket)
// ============================================================================

/// GET /api/v1/stream - push each published reading over a WebSocket.
///
/// The push hook for transports that prefer notification over polling; each
/// message is the same JSON shape as `/api/v1/reading`.
pub async fn stream_readings(
    ws: WebSocketUpgrade,
    State(state): State<DashboardState>,
) -> Response {
    ws.on_upgrade(move |socket| stream_loop(socket, state))
}

async fn stream_loop(mut socket: WebSocket, state: DashboardState) {
    let mut rx = state.reading.subscribe();
    debug!("[stream] subscriber connected");

    loop {
        tokio::select! {
            changed = rx.changed() => {
                // Sender dropped means the pipeline ended; close the stream.
                if changed.is_err() {
                    break;
                }
                let reading = ReadingResponse::from(*rx.borrow_and_update());
                let Ok(payload) = serde_json::to_string(&reading) else {
                    break;
                };
                if socket.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                    // Pings are answered by axum; ignore anything else.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!("[stream] subscriber disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{self, DynoConfig};

    fn ensure_config() {
        if !config::is_initialized() {
            config::init(DynoConfig::default());
        }
    }

    fn create_test_state() -> DashboardState {
        DashboardState::new(
            Arc::new(ReadingStore::new()),
            Arc::new(RwLock::new(AppState::default())),
        )
    }

    #[test]
    fn test_reading_response_rounding() {
        let resp = ReadingResponse::from(Reading {
            rpm: 3216.544,
            speed_kmh: 36.4567,
            torque_nm: 0.41777,
            power_w: 125.678,
        });
        assert_eq!(resp.rpm, 3216.5);
        assert_eq!(resp.speed_kmh, 36.46);
        assert_eq!(resp.torque_nm, 0.42);
        assert_eq!(resp.power_w, 125.7);
    }

    #[tokio::test]
    async fn test_get_reading_zero_before_samples() {
        let state = create_test_state();
        let Json(response) = get_reading(State(state)).await;
        assert_eq!(response.rpm, 0.0);
        assert_eq!(response.power_w, 0.0);
    }

    #[tokio::test]
    async fn test_get_status_initial() {
        ensure_config();
        let state = create_test_state();
        let Json(response) = get_status(State(state)).await;
        assert_eq!(response.link_state, "Stalled");
        assert_eq!(response.samples_processed, 0);
        assert!(response.last_sample_at.is_none());
    }

    #[tokio::test]
    async fn test_health_check() {
        let state = create_test_state();
        let Json(response) = health_check(State(state)).await;
        assert_eq!(response.status, "ok");
    }
}
