//! Request Router: the per-request failover loop described in the design —
//! try each api key of the current upstream channel in order, classify every
//! response, and either hand back a translated answer or exhaust the channel.

use std::collections::HashSet;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use http::HeaderMap;
use relaygate_provider_core::{classify, ClassifyOutcome, KeyScheduler};
use relaygate_protocol::canonical::CanonicalRequest;
use relaygate_provider_impl::{pump, PumpError};

use crate::config_store::ConfigStore;
use crate::error::{LastFailure, ProxyError};
use crate::http_client::HttpClientCache;

pub struct AppState {
    pub config: ConfigStore,
    pub scheduler: KeyScheduler,
    pub clients: HttpClientCache,
}

impl AppState {
    pub fn new(config: ConfigStore) -> Self {
        Self {
            config,
            scheduler: KeyScheduler::new(),
            clients: HttpClientCache::new(),
        }
    }
}

pub enum RouterResponse {
    Json(serde_json::Value),
    Stream(Pin<Box<dyn Stream<Item = Result<Bytes, PumpError>> + Send>>),
}

impl std::fmt::Debug for RouterResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterResponse::Json(value) => f.debug_tuple("Json").field(value).finish(),
            RouterResponse::Stream(_) => f.debug_tuple("Stream").finish(),
        }
    }
}

/// Runs the failover loop for one inbound request against the configured
/// `current_upstream` channel.
pub async fn route_request(
    state: &AppState,
    client_headers: &HeaderMap,
    canonical: CanonicalRequest,
) -> Result<RouterResponse, ProxyError> {
    let config = state.config.load();
    let channel = config
        .current_channel()
        .ok_or_else(|| ProxyError::NoUpstream(config.current_upstream.clone()))?;

    let max_attempts = channel.api_keys.read().await.len();
    if max_attempts == 0 {
        return Err(ProxyError::NoKeys(channel.name.clone()));
    }

    let adapter = relaygate_provider_impl::for_service_type(channel.service_type);

    let mut excluded: HashSet<String> = HashSet::new();
    let mut deprioritize_candidates: Vec<String> = Vec::new();
    let mut last_failure: Option<LastFailure> = None;
    let mut streaming_success: Option<Pin<Box<dyn Stream<Item = Result<Bytes, PumpError>> + Send>>> = None;

    for attempt in 0..max_attempts {
        let key = match state.scheduler.next_key(channel, &excluded).await {
            Ok(key) => key,
            Err(_) => break,
        };

        let adapted = adapter
            .build_request(&canonical, client_headers, channel, &key)
            .map_err(|err| ProxyError::Internal(err.to_string()))?;

        let client = state
            .clients
            .get(&channel.name, channel.insecure_skip_verify)
            .map_err(|err| ProxyError::Internal(err.to_string()))?;

        tracing::debug!(
            event = "upstream_attempt",
            upstream = %channel.name,
            attempt,
            "dispatching upstream attempt"
        );

        let sent = client
            .request(adapted.http.method.clone(), adapted.http.url.as_str())
            .headers(adapted.http.headers.clone())
            .body(adapted.http.body.clone())
            .send()
            .await;

        let resp = match sent {
            Ok(resp) => resp,
            Err(err) => {
                tracing::debug!(event = "upstream_attempt_failed", upstream = %channel.name, attempt, outcome = "transport_error");
                last_failure = Some(LastFailure::Transport(err.to_string()));
                excluded.insert(key.clone());
                state.scheduler.mark_key_failed(&key).await;
                continue;
            }
        };

        let status = resp.status();
        if status.is_success() && adapted.expects_stream {
            tracing::debug!(event = "upstream_attempt_succeeded", upstream = %channel.name, attempt, outcome = "success_stream");
            let byte_stream = resp
                .bytes_stream()
                .map(|item| item.map_err(|err| PumpError(err.to_string())));
            let message_id = relaygate_common::new_message_id();
            let model = canonical.model.clone();
            streaming_success = Some(Box::pin(pump(adapter.clone(), byte_stream, message_id, model)));
            break;
        }

        let headers = resp.headers().clone();
        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(event = "upstream_attempt_failed", upstream = %channel.name, attempt, outcome = "transport_error_mid_read");
                last_failure = Some(LastFailure::Transport(err.to_string()));
                excluded.insert(key.clone());
                state.scheduler.mark_key_failed(&key).await;
                continue;
            }
        };

        match classify(status.as_u16(), &body) {
            ClassifyOutcome::Success => {
                tracing::debug!(event = "upstream_attempt_succeeded", upstream = %channel.name, attempt, outcome = "success");
                for candidate in &deprioritize_candidates {
                    state.scheduler.deprioritize_key(channel, candidate).await;
                }
                let translated = adapter
                    .translate_non_stream(&body, &canonical.model)
                    .map_err(|err| ProxyError::Internal(err.to_string()))?;
                return Ok(RouterResponse::Json(translated));
            }
            ClassifyOutcome::FatalPassThrough => {
                tracing::debug!(event = "upstream_attempt_failed", upstream = %channel.name, attempt, outcome = "fatal_pass_through");
                return Err(ProxyError::FatalUpstream { status, headers, body });
            }
            ClassifyOutcome::Failover(info) => {
                tracing::debug!(
                    event = "upstream_attempt_failed",
                    upstream = %channel.name,
                    attempt,
                    outcome = "failover",
                    quota_related = info.quota_related
                );
                if info.quota_related {
                    deprioritize_candidates.push(key.clone());
                }
                last_failure = Some(LastFailure::Http {
                    status,
                    headers,
                    body: info.body,
                    html_reason: info.html_reason,
                });
                excluded.insert(key.clone());
                state.scheduler.mark_key_failed(&key).await;
            }
        }
    }

    if let Some(pumped) = streaming_success {
        for candidate in &deprioritize_candidates {
            state.scheduler.deprioritize_key(channel, candidate).await;
        }
        return Ok(RouterResponse::Stream(pumped));
    }

    match last_failure {
        Some(last) => Err(ProxyError::AllKeysExhausted {
            upstream: channel.name.clone(),
            base_url: channel.base_url.clone(),
            last,
        }),
        None => Err(ProxyError::NoKeys(channel.name.clone())),
    }
}
