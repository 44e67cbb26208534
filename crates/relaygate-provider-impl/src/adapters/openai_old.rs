//! Legacy OpenAI `/v1/completions` adapter: no message list, no tool-calling
//! support, just a flattened prompt string. Streaming chunks carry a single
//! `text` delta instead of the chat-style `delta.content` field, so this
//! adapter has its own small wire shape rather than reusing `ChatCompletionChunk`.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method};
use relaygate_common::new_message_id;
use relaygate_protocol::canonical::{CanonicalRequest, ContentBlock};
use relaygate_protocol::claude::MessagesResponse;
use relaygate_protocol::openai::ChatCompletionRequest;
use relaygate_provider_core::adapter::{strip_client_auth_headers, AdaptedRequest, ProviderAdapter, UpstreamHttpRequest};
use relaygate_provider_core::{DecoderState, ProviderError, ProviderResult, UpstreamChannel};
use relaygate_transform::openai_messages::flatten_to_prompt;
use serde::Deserialize;

use crate::emitter;
use crate::stop_reason::from_openai_finish_reason;

#[derive(Debug, Default)]
pub struct OpenAiLegacyAdapter;

impl ProviderAdapter for OpenAiLegacyAdapter {
    fn build_request(
        &self,
        req: &CanonicalRequest,
        client_headers: &HeaderMap,
        channel: &UpstreamChannel,
        api_key: &str,
    ) -> ProviderResult<AdaptedRequest> {
        let model = channel.resolve_model(&req.model).to_string();
        let payload = ChatCompletionRequest {
            model,
            messages: Vec::new(),
            tools: None,
            stream: req.stream,
            temperature: req.temperature,
            top_p: req.top_p,
            stop: (!req.stop_sequences.is_empty()).then(|| req.stop_sequences.clone()),
            max_tokens: Some(req.max_tokens),
            prompt: Some(flatten_to_prompt(req)),
        };
        let body = serde_json::to_vec(&payload)
            .map_err(|err| ProviderError::InvalidConfig(err.to_string()))?;

        let mut headers = strip_client_auth_headers(client_headers);
        let bearer = format!("Bearer {api_key}");
        headers.insert(
            "authorization",
            HeaderValue::from_str(&bearer).map_err(|err| ProviderError::InvalidConfig(err.to_string()))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        Ok(AdaptedRequest {
            http: UpstreamHttpRequest {
                method: Method::POST,
                url: format!("{}/v1/completions", channel.base_url.trim_end_matches('/')),
                headers,
                body: Bytes::from(body),
            },
            expects_stream: req.stream,
        })
    }

    fn translate_non_stream(&self, body: &[u8], requested_model: &str) -> ProviderResult<serde_json::Value> {
        let parsed: LegacyCompletionResponse =
            serde_json::from_slice(body).map_err(|err| ProviderError::MalformedResponse(err.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("no choices in response".to_string()))?;

        let content = if choice.text.is_empty() {
            vec![]
        } else {
            vec![ContentBlock::Text { text: choice.text }]
        };
        let stop_reason = choice
            .finish_reason
            .as_deref()
            .map(from_openai_finish_reason)
            .unwrap_or("end_turn");
        let response = MessagesResponse::new(new_message_id(), requested_model.to_string(), content, stop_reason);
        Ok(serde_json::to_value(response).expect("MessagesResponse always serializes"))
    }

    fn decode_line(&self, _event: Option<&str>, data: &str, state: &mut DecoderState) -> Vec<Bytes> {
        if data.is_empty() || data == "[DONE]" {
            return vec![];
        }
        let Ok(chunk) = serde_json::from_str::<LegacyCompletionChunk>(data) else {
            return vec![];
        };
        let Some(choice) = chunk.choices.into_iter().next() else {
            return vec![];
        };

        let mut out = Vec::new();

        if !choice.text.is_empty() {
            let (index, opened) = state.open_text_block();
            if opened {
                out.push(emitter::content_block_start_text(index));
            }
            out.push(emitter::content_block_delta_text(index, &choice.text));
        }

        if let Some(finish_reason) = choice.finish_reason.as_deref() {
            if let Some(text_index) = state.close_text_block() {
                out.push(emitter::content_block_stop(text_index));
            }
            out.push(emitter::message_delta(Some(from_openai_finish_reason(
                finish_reason,
            ))));
            if state.take_message_stop() {
                out.push(emitter::message_stop());
            }
        }

        out
    }
}

#[derive(Debug, Deserialize)]
struct LegacyCompletionResponse {
    choices: Vec<LegacyChoice>,
}

#[derive(Debug, Deserialize)]
struct LegacyCompletionChunk {
    #[serde(default)]
    choices: Vec<LegacyChoice>,
}

#[derive(Debug, Deserialize)]
struct LegacyChoice {
    #[serde(default)]
    text: String,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaygate_protocol::canonical::{CanonicalMessage, Role};

    fn request() -> CanonicalRequest {
        CanonicalRequest {
            model: "gpt-3.5-turbo-instruct".to_string(),
            messages: vec![CanonicalMessage {
                role: Role::User,
                content: vec![ContentBlock::Text {
                    text: "hi".to_string(),
                }],
            }],
            system: Some("be terse".to_string()),
            tools: vec![],
            stream: false,
            max_tokens: 50,
            temperature: None,
            top_p: None,
            stop_sequences: vec![],
        }
    }

    #[test]
    fn build_request_flattens_messages_into_a_prompt() {
        let adapter = OpenAiLegacyAdapter;
        let channel = test_channel();
        let adapted = adapter
            .build_request(&request(), &HeaderMap::new(), &channel, "sk-x")
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&adapted.http.body).unwrap();
        assert!(body["prompt"].as_str().unwrap().contains("Human: hi"));
        assert!(body["messages"].as_array().unwrap().is_empty());
    }

    #[test]
    fn decode_line_streams_text_and_closes_on_finish() {
        let adapter = OpenAiLegacyAdapter;
        let mut state = DecoderState::with_message("msg_1".to_string(), "gpt-3.5-turbo-instruct".to_string());
        adapter.decode_line(None, "{\"choices\":[{\"text\":\"hi\"}]}", &mut state);
        let frames = adapter.decode_line(
            None,
            "{\"choices\":[{\"text\":\"\",\"finish_reason\":\"stop\"}]}",
            &mut state,
        );
        let joined: String = frames.iter().map(|b| String::from_utf8_lossy(b).to_string()).collect();
        assert!(joined.contains("content_block_stop"));
        assert!(joined.contains("message_stop"));
    }

    fn test_channel() -> UpstreamChannel {
        UpstreamChannel {
            name: "c".to_string(),
            service_type: relaygate_provider_core::ServiceType::OpenaiOld,
            base_url: "https://api.openai.com".to_string(),
            api_keys: tokio::sync::RwLock::new(vec!["sk-x".to_string()]),
            insecure_skip_verify: false,
            model_map: std::collections::HashMap::new(),
        }
    }
}
