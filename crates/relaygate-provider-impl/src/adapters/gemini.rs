//! Google Gemini `generateContent` adapter. Gemini's function calls arrive
//! whole in a single chunk (no incremental-argument streaming the way OpenAI
//! does it), so the decoder opens and closes a tool_use block atomically the
//! moment it sees one, instead of accumulating across multiple lines.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method};
use relaygate_common::new_message_id;
use relaygate_protocol::canonical::{CanonicalRequest, ContentBlock};
use relaygate_protocol::claude::MessagesResponse;
use relaygate_protocol::gemini::{Candidate, GenerateContentRequest, GenerateContentResponse, GenerationConfig};
use relaygate_provider_core::adapter::{strip_client_auth_headers, AdaptedRequest, ProviderAdapter, UpstreamHttpRequest};
use relaygate_provider_core::{DecoderState, ProviderError, ProviderResult, UpstreamChannel};
use relaygate_transform::gemini_messages::{to_gemini_contents, to_gemini_tools};

use crate::emitter;
use crate::stop_reason::from_gemini_finish_reason;

#[derive(Debug, Default)]
pub struct GeminiAdapter;

impl ProviderAdapter for GeminiAdapter {
    fn build_request(
        &self,
        req: &CanonicalRequest,
        client_headers: &HeaderMap,
        channel: &UpstreamChannel,
        api_key: &str,
    ) -> ProviderResult<AdaptedRequest> {
        let model = channel.resolve_model(&req.model).to_string();
        let (contents, system_instruction) = to_gemini_contents(req);
        let payload = GenerateContentRequest {
            contents,
            system_instruction,
            tools: to_gemini_tools(&req.tools),
            generation_config: Some(GenerationConfig {
                temperature: req.temperature,
                top_p: req.top_p,
                max_output_tokens: Some(req.max_tokens),
                stop_sequences: (!req.stop_sequences.is_empty()).then(|| req.stop_sequences.clone()),
            }),
        };
        let body = serde_json::to_vec(&payload)
            .map_err(|err| ProviderError::InvalidConfig(err.to_string()))?;

        let mut headers = strip_client_auth_headers(client_headers);
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key).map_err(|err| ProviderError::InvalidConfig(err.to_string()))?,
        );

        let method_name = if req.stream {
            "streamGenerateContent"
        } else {
            "generateContent"
        };
        let url = format!(
            "{}/v1beta/models/{}:{}?alt=sse",
            channel.base_url.trim_end_matches('/'),
            model,
            method_name,
        );

        Ok(AdaptedRequest {
            http: UpstreamHttpRequest {
                method: Method::POST,
                url,
                headers,
                body: Bytes::from(body),
            },
            expects_stream: req.stream,
        })
    }

    fn translate_non_stream(&self, body: &[u8], requested_model: &str) -> ProviderResult<serde_json::Value> {
        let parsed: GenerateContentResponse =
            serde_json::from_slice(body).map_err(|err| ProviderError::MalformedResponse(err.to_string()))?;
        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("no candidates in response".to_string()))?;

        let content = candidate_to_blocks(&candidate);
        let stop_reason = candidate
            .finish_reason
            .as_deref()
            .map(from_gemini_finish_reason)
            .unwrap_or("end_turn");
        let response = MessagesResponse::new(new_message_id(), requested_model.to_string(), content, stop_reason);
        Ok(serde_json::to_value(response).expect("MessagesResponse always serializes"))
    }

    fn decode_line(&self, _event: Option<&str>, data: &str, state: &mut DecoderState) -> Vec<Bytes> {
        if data.is_empty() {
            return vec![];
        }
        let Ok(parsed) = serde_json::from_str::<GenerateContentResponse>(data) else {
            return vec![];
        };
        let Some(candidate) = parsed.candidates.into_iter().next() else {
            return vec![];
        };

        let mut out = Vec::new();

        for part in &candidate.content.parts {
            if let Some(text) = part.text.as_ref().filter(|t| !t.is_empty()) {
                let (index, opened) = state.open_text_block();
                if opened {
                    out.push(emitter::content_block_start_text(index));
                }
                out.push(emitter::content_block_delta_text(index, text));
            }
            if let Some(call) = part.function_call.as_ref() {
                if let Some(text_index) = state.close_text_block() {
                    out.push(emitter::content_block_stop(text_index));
                }
                let index = state.take_next_index();
                let id = relaygate_common::new_block_id();
                out.push(emitter::content_block_start_tool(index, &id, &call.name));
                out.push(emitter::content_block_delta_partial_json(
                    index,
                    &call.args.to_string(),
                ));
                out.push(emitter::content_block_stop(index));
            }
        }

        if let Some(finish_reason) = candidate.finish_reason.as_deref() {
            if let Some(text_index) = state.close_text_block() {
                out.push(emitter::content_block_stop(text_index));
            }
            out.push(emitter::message_delta(Some(from_gemini_finish_reason(
                finish_reason,
            ))));
            if state.take_message_stop() {
                out.push(emitter::message_stop());
            }
        }

        out
    }
}

fn candidate_to_blocks(candidate: &Candidate) -> Vec<ContentBlock> {
    let mut content = Vec::new();
    for part in &candidate.content.parts {
        if let Some(text) = part.text.as_ref().filter(|t| !t.is_empty()) {
            content.push(ContentBlock::Text {
                text: text.clone(),
            });
        }
        if let Some(call) = part.function_call.as_ref() {
            content.push(ContentBlock::ToolUse {
                id: relaygate_common::new_block_id(),
                name: call.name.clone(),
                input: call.args.clone(),
            });
        }
    }
    content
}
