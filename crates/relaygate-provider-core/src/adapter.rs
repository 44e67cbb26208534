//! The seam between the Request Router and a specific upstream protocol: one
//! `ProviderAdapter` implementation per [`ServiceType`](crate::ServiceType).
//! Adapters are pure — no I/O, no locking — so they can be unit tested
//! without a network and called freely from inside the failover loop.

use bytes::Bytes;
use http::{HeaderMap, Method};
use relaygate_protocol::canonical::CanonicalRequest;

use crate::config::UpstreamChannel;
use crate::decoder::DecoderState;
use crate::errors::ProviderResult;

#[derive(Debug, Clone)]
pub struct UpstreamHttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A fully adapted HTTP request plus whether the adapter wants the Request
/// Router to read the body as a stream of SSE lines or a single JSON blob.
#[derive(Debug, Clone)]
pub struct AdaptedRequest {
    pub http: UpstreamHttpRequest,
    pub expects_stream: bool,
}

pub trait ProviderAdapter: Send + Sync {
    /// Builds the upstream HTTP request for `req` against `channel`, using
    /// `api_key` for auth and carrying over any `client_headers` the adapter
    /// chooses to forward. Implementations must strip (never forward) the
    /// client's own `x-api-key`, `authorization`, and `x-goog-api-key`
    /// headers, replacing them with the channel's own credential.
    fn build_request(
        &self,
        req: &CanonicalRequest,
        client_headers: &HeaderMap,
        channel: &UpstreamChannel,
        api_key: &str,
    ) -> ProviderResult<AdaptedRequest>;

    /// Translates a complete (non-streaming) upstream response body into a
    /// Claude Messages API JSON response. `requested_model` is the model name
    /// the client asked for, echoed back in the response since not every
    /// upstream protocol repeats it in the response body.
    fn translate_non_stream(&self, body: &[u8], requested_model: &str) -> ProviderResult<serde_json::Value>;

    /// Decodes one upstream SSE line (optional event name plus data payload)
    /// into zero or more already-SSE-framed Claude stream event bytes, ready
    /// for the Stream Pump to forward verbatim.
    fn decode_line(&self, event: Option<&str>, data: &str, state: &mut DecoderState) -> Vec<Bytes>;
}

/// Strips the inbound auth headers a client may have sent, so an adapter
/// starting from the client's header set never accidentally forwards the
/// caller's own proxy credential upstream.
pub fn strip_client_auth_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        let lower = name.as_str().to_ascii_lowercase();
        if lower == "x-api-key" || lower == "authorization" || lower == "x-goog-api-key" {
            continue;
        }
        out.insert(name.clone(), value.clone());
    }
    out
}
