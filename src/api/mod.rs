//! REST API module using Axum
//!
//! Provides HTTP endpoints for the dyno dashboard:
//! - `/api/v1/reading` - latest computed reading (polled by the frontend)
//! - `/api/v1/status` - link state, counters, and config echo
//! - `/api/v1/stream` - WebSocket push of each published reading
//! - `/health` - liveness probe
//!
//! The API is a pure sink: handlers read the atomically published reading
//! and the shared counters, and never touch pipeline state.

pub mod handlers;
mod routes;

pub use handlers::DashboardState;

use axum::http::{header, Method, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Fallback for unmatched paths — there is no embedded frontend; gauges are
/// rendered by whatever polls the API.
async fn fallback() -> impl IntoResponse {
    (
        StatusCode::OK,
        "rollerdyno is running. Poll /api/v1/reading or connect to /api/v1/stream.",
    )
}

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `ROLLERDYNO_CORS_ORIGINS` to a comma-separated list of allowed origins
/// for development (e.g., a separately served dashboard).
fn build_cors_layer() -> CorsLayer {
    match std::env::var("ROLLERDYNO_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET])
                .allow_headers([header::CONTENT_TYPE])
        }
        Err(_) => CorsLayer::new()
            .allow_methods([Method::GET])
            .allow_headers([header::CONTENT_TYPE]),
    }
}

/// Create the complete application router.
pub fn create_app(state: DashboardState) -> Router {
    let cors = build_cors_layer();

    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::legacy_routes(state))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
