//! # devicehub-api — HTTP API for the Device Registry
//!
//! Axum service exposing lifecycle-aware CRUD over the device registry
//! in [`devicehub-core`](devicehub_core).
//!
//! ## API Surface
//!
//! | Method | Path                 | Purpose                           |
//! |--------|----------------------|-----------------------------------|
//! | POST   | `/api/devices`       | Create a device                   |
//! | GET    | `/api/devices`       | List devices (brand/state filter) |
//! | GET    | `/api/devices/:id`   | Fetch one device                  |
//! | PUT    | `/api/devices/:id`   | Full update                       |
//! | PATCH  | `/api/devices/:id`   | Partial update                    |
//! | DELETE | `/api/devices/:id`   | Delete                            |
//!
//! Operational endpoints (`/health/*`, `/metrics`, `/openapi.json`) sit
//! alongside the API routes.
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```

pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::{Json, Router};

use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Maximum accepted request body size.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) and the metrics endpoint are mounted
/// outside the API middleware stack.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();

    let api = Router::new()
        .merge(routes::devices::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(axum::Extension(metrics.clone()))
        .with_state(state.clone());

    let ops = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(metrics_summary))
        .layer(axum::Extension(metrics))
        .with_state(state);

    Router::new().merge(ops).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the store answers and, when configured,
/// that the database accepts a query.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    if state.registry.list_all().await.is_err() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    if let Some(pool) = state.registry.repository().pool() {
        if sqlx::query("SELECT 1").execute(pool).await.is_err() {
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    Ok("ready")
}

/// GET /metrics — request counters as JSON.
async fn metrics_summary(
    axum::Extension(metrics): axum::Extension<ApiMetrics>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "requests": metrics.requests(),
        "errors": metrics.errors(),
    }))
}
