//! `axum` handlers for the four inbound operations: the `/v1/messages`
//! translation endpoint, the health check, and the two authenticated admin
//! stubs.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use relaygate_core::{route_request, AppState, ProxyError};
use relaygate_protocol::canonical::CanonicalRequest;
use serde_json::json;

use crate::auth::check_proxy_key;
use crate::health::build_health_body;
use crate::response::build_response;

#[derive(Clone)]
pub struct RouterState {
    pub app: Arc<AppState>,
    pub started_at: Instant,
}

pub async fn messages_handler(
    State(state): State<RouterState>,
    headers: HeaderMap,
    Json(req): Json<CanonicalRequest>,
) -> Result<Response, ProxyError> {
    let config = state.app.config.load();
    check_proxy_key(&headers, &config.proxy_access_key)?;

    let trace_id = uuid::Uuid::new_v4();
    let started = Instant::now();
    tracing::info!(
        event = "downstream_received",
        trace_id = %trace_id,
        provider = %config.current_upstream,
        op = "messages",
        model = %req.model,
        stream = req.stream,
    );
    drop(config);

    let result = route_request(&state.app, &headers, req).await;

    match result {
        Ok(response) => {
            tracing::info!(
                event = "downstream_responded",
                trace_id = %trace_id,
                elapsed_ms = started.elapsed().as_millis(),
            );
            Ok(build_response(response))
        }
        Err(err) => {
            tracing::info!(
                event = "downstream_responded",
                trace_id = %trace_id,
                elapsed_ms = started.elapsed().as_millis(),
                error = %err,
            );
            Err(err)
        }
    }
}

pub async fn health_handler(State(state): State<RouterState>) -> Json<serde_json::Value> {
    let config = state.app.config.load();
    let uptime_seconds = state.started_at.elapsed().as_secs();
    Json(build_health_body(&config, uptime_seconds))
}

pub async fn reload_handler(
    State(state): State<RouterState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ProxyError> {
    let expected = state.app.config.load().proxy_access_key.clone();
    check_proxy_key(&headers, &expected)?;
    state
        .app
        .config
        .reload()
        .map_err(|err| ProxyError::Internal(err.to_string()))?;
    Ok(Json(json!({"status": "ok"})))
}

pub async fn ping_handler(State(state): State<RouterState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ProxyError> {
    let expected = state.app.config.load().proxy_access_key.clone();
    check_proxy_key(&headers, &expected)?;
    Ok(Json(json!({"status": "ok"})))
}
