//! API route definitions
//!
//! Organizes endpoints for the dyno dashboard:
//! - /api/v1/reading - latest computed reading
//! - /api/v1/status - link state and pipeline counters
//! - /api/v1/stream - WebSocket reading push

use axum::{routing::get, Router};

use super::handlers::{self, DashboardState};

/// Create all API routes for the dashboard
pub fn api_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/reading", get(handlers::get_reading))
        .route("/status", get(handlers::get_status))
        .route("/stream", get(handlers::stream_readings))
        .with_state(state)
}

/// Legacy health endpoint at root level
pub fn legacy_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state)
}
