//! The proxy's single error type. Every fallible path in `relaygate-core`
//! and `relaygate-router` ends in a `ProxyError`, which knows how to turn
//! itself into the exact response the client should see.

use axum::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use relaygate_provider_core::HtmlReason;
use serde_json::json;

/// What the last attempt in an exhausted failover loop looked like, so the
/// final error can decide between "forward the real upstream response" and
/// "every key failed before ever reaching an upstream".
#[derive(Debug)]
pub enum LastFailure {
    Http {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        html_reason: Option<HtmlReason>,
    },
    Transport(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("missing or invalid proxy access key")]
    Auth,

    #[error("no usable upstream configured: {0}")]
    NoUpstream(String),

    #[error("upstream {0:?} has no api keys configured")]
    NoKeys(String),

    #[error("unsupported service type: {0}")]
    UnsupportedService(String),

    #[error("every api key for upstream {upstream:?} failed")]
    AllKeysExhausted {
        upstream: String,
        base_url: String,
        last: LastFailure,
    },

    #[error("upstream returned a fatal (non-retryable) error")]
    FatalUpstream {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },

    #[error("stream to client failed after headers were sent: {0}")]
    Stream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Copies the handful of headers that describe the body itself, dropping
/// everything connection- or framing-specific. Used whenever a response's
/// status and body are forwarded to the client largely unchanged.
fn copy_content_headers(from: &HeaderMap, into: &mut HeaderMap) {
    for name in ["content-type"] {
        if let Some(value) = from.get(name) {
            into.insert(name, value.clone());
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::Auth => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "invalid or missing proxy access key", "code": "UNAUTHORIZED"})),
            )
                .into_response(),

            ProxyError::NoUpstream(name) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": format!("no usable upstream named {name:?} is configured"),
                    "code": "NO_UPSTREAM",
                })),
            )
                .into_response(),

            ProxyError::NoKeys(name) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": format!("upstream {name:?} has no api keys configured"),
                    "code": "NO_API_KEYS",
                })),
            )
                .into_response(),

            ProxyError::UnsupportedService(kind) => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": format!("unsupported service type: {kind}"), "code": "UNSUPPORTED_SERVICE"})),
            )
                .into_response(),

            ProxyError::AllKeysExhausted { upstream, base_url, last } => match last {
                LastFailure::Http { status, headers, body, html_reason: Some(reason) } => {
                    let code = match reason {
                        HtmlReason::CloudflareChallenge => "UPSTREAM_CLOUDFLARE_CHALLENGE",
                        HtmlReason::GenericHtml => "UPSTREAM_HTML_ERROR",
                    };
                    let _ = headers;
                    let _ = body;
                    (
                        status,
                        Json(json!({
                            "error": "upstream returned an HTML error page instead of a JSON response",
                            "code": code,
                            "upstream": {"name": upstream, "base_url": base_url},
                        })),
                    )
                        .into_response()
                }
                LastFailure::Http { status, headers, body, html_reason: None } => {
                    let mut response = (status, body).into_response();
                    copy_content_headers(&headers, response.headers_mut());
                    response
                }
                LastFailure::Transport(message) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({
                        "error": "all upstream keys unavailable",
                        "code": "NO_API_KEYS",
                        "upstream": {"name": upstream, "base_url": base_url},
                        "detail": message,
                    })),
                )
                    .into_response(),
            },

            ProxyError::FatalUpstream { status, headers, body } => {
                let mut response = (status, body).into_response();
                copy_content_headers(&headers, response.headers_mut());
                response
            }

            ProxyError::Stream(message) => {
                tracing::error!(event = "stream_error", error = %message, "upstream stream failed after headers were sent");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }

            ProxyError::Internal(message) => {
                tracing::error!(event = "internal_error", error = %message);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "Internal server error"}))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn auth_error_is_401_with_unauthorized_code() {
        let response = ProxyError::Auth.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn no_keys_error_is_503_with_no_api_keys_code() {
        let response = ProxyError::NoKeys("prod".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["code"], "NO_API_KEYS");
    }

    #[tokio::test]
    async fn html_failure_is_synthesized_into_json() {
        let err = ProxyError::AllKeysExhausted {
            upstream: "prod".to_string(),
            base_url: "https://example.invalid".to_string(),
            last: LastFailure::Http {
                status: StatusCode::BAD_GATEWAY,
                headers: HeaderMap::new(),
                body: Bytes::from_static(b"<html>just a moment...</html>"),
                html_reason: Some(HtmlReason::CloudflareChallenge),
            },
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["code"], "UPSTREAM_CLOUDFLARE_CHALLENGE");
    }

    #[tokio::test]
    async fn non_html_failure_is_forwarded_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        let err = ProxyError::AllKeysExhausted {
            upstream: "prod".to_string(),
            base_url: "https://example.invalid".to_string(),
            last: LastFailure::Http {
                status: StatusCode::TOO_MANY_REQUESTS,
                headers,
                body: Bytes::from_static(b"{\"error\":{\"message\":\"rate limited\"}}"),
                html_reason: None,
            },
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("content-type").unwrap(), "application/json");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"{\"error\":{\"message\":\"rate limited\"}}");
    }
}
