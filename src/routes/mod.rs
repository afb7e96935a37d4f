//! HTTP route definitions and handlers.
//!
//! This module organizes all HTTP endpoints into logical groups:
//! transactions, health checks and metrics exposition.

mod health_routes;
mod metrics_routes;
mod transaction_routes;

use crate::metrics::{track_http, Metrics};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};

/// Creates the application router with all configured routes.
///
/// Every matched route, `/metrics` included, is wrapped by the request
/// instrumentation middleware. Request bodies are unbounded unless
/// `max_body_bytes` is configured.
pub fn create_router(state: AppState) -> Router {
    let body_limit = match state.config.max_body_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .merge(transaction_routes::routes())
        .merge(health_routes::routes())
        .merge(metrics_routes::routes())
        .route_layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_http::<Metrics>,
        ))
        .layer(body_limit)
        .with_state(state)
}
