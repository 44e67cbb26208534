//! Claude-native adapter: the upstream speaks the same wire format the proxy
//! accepts, so requests pass through almost unchanged and the stream decoder
//! forwards every SSE line verbatim. It still observes block boundaries so a
//! future feature (e.g. per-event logging) has somewhere to hook in.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method};
use relaygate_protocol::canonical::CanonicalRequest;
use relaygate_provider_core::adapter::{strip_client_auth_headers, AdaptedRequest, ProviderAdapter, UpstreamHttpRequest};
use relaygate_provider_core::{DecoderState, ProviderError, ProviderResult, UpstreamChannel};

#[derive(Debug, Default)]
pub struct ClaudeAdapter;

impl ProviderAdapter for ClaudeAdapter {
    fn build_request(
        &self,
        req: &CanonicalRequest,
        client_headers: &HeaderMap,
        channel: &UpstreamChannel,
        api_key: &str,
    ) -> ProviderResult<AdaptedRequest> {
        let mut body = req.clone();
        body.model = channel.resolve_model(&req.model).to_string();
        let payload = serde_json::to_vec(&body)
            .map_err(|err| ProviderError::InvalidConfig(err.to_string()))?;

        let mut headers = strip_client_auth_headers(client_headers);
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key).map_err(|err| ProviderError::InvalidConfig(err.to_string()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        Ok(AdaptedRequest {
            http: UpstreamHttpRequest {
                method: Method::POST,
                url: format!("{}/v1/messages", channel.base_url.trim_end_matches('/')),
                headers,
                body: Bytes::from(payload),
            },
            expects_stream: body.stream,
        })
    }

    fn translate_non_stream(&self, body: &[u8], _requested_model: &str) -> ProviderResult<serde_json::Value> {
        serde_json::from_slice(body).map_err(|err| ProviderError::MalformedResponse(err.to_string()))
    }

    fn decode_line(&self, event: Option<&str>, data: &str, state: &mut DecoderState) -> Vec<Bytes> {
        if data.is_empty() || data == "[DONE]" {
            return vec![];
        }
        observe(event, data, state);
        match event {
            // The Stream Pump already emitted the canonical message_start
            // before reading any upstream bytes; forwarding the upstream's
            // own one too would duplicate it.
            Some("message_start") => vec![],
            // Forward the upstream's own message_stop once; if it never
            // sends one the pump's end-of-stream fallback still fires.
            Some("message_stop") => {
                if state.take_message_stop() {
                    vec![passthrough_frame(event, data)]
                } else {
                    vec![]
                }
            }
            _ => vec![passthrough_frame(event, data)],
        }
    }
}

/// Best-effort bookkeeping so `state` stays consistent with what actually
/// crossed the wire. Never changes what gets forwarded.
fn observe(event: Option<&str>, data: &str, state: &mut DecoderState) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(data) else {
        return;
    };
    match event {
        Some("content_block_start") => {
            let is_text = value
                .get("content_block")
                .and_then(|block| block.get("type"))
                .and_then(|t| t.as_str())
                == Some("text");
            if is_text {
                let _ = state.open_text_block();
            }
        }
        Some("content_block_stop") => {
            state.close_text_block();
        }
        _ => {}
    }
}

fn passthrough_frame(event: Option<&str>, data: &str) -> Bytes {
    let mut out = String::new();
    if let Some(name) = event {
        out.push_str("event: ");
        out.push_str(name);
        out.push('\n');
    }
    out.push_str("data: ");
    out.push_str(data);
    out.push_str("\n\n");
    Bytes::from(out)
}
