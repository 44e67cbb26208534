//! Wires the inbound HTTP surface: the Messages API translation endpoint,
//! the health check, and the authenticated admin stubs, onto an
//! [`relaygate_core::AppState`].

pub mod auth;
pub mod handlers;
pub mod health;
pub mod response;

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use relaygate_core::AppState;

pub use handlers::RouterState;

/// Builds the full `axum::Router` for the proxy. The health-check route is
/// bound to whatever `health_check_path` the config held at startup; a later
/// `/admin/config/reload` can change the value returned by the handler but
/// cannot move the route itself, since axum's route table is fixed once the
/// router is built.
pub fn build_router(app: Arc<AppState>) -> Router {
    let health_check_path = app.config.load().health_check_path.clone();
    let state = RouterState {
        app,
        started_at: Instant::now(),
    };

    Router::new()
        .route("/v1/messages", post(handlers::messages_handler))
        .route(&health_check_path, get(handlers::health_handler))
        .route("/admin/config/reload", post(handlers::reload_handler))
        .route("/admin/ping", get(handlers::ping_handler))
        .with_state(state)
}
