//! OpenAI chat-completions adapter: translates to/from `/v1/chat/completions`
//! and accumulates streamed `tool_calls` deltas into whole Claude tool_use
//! blocks, since OpenAI streams a tool call's arguments one fragment at a
//! time while Claude's `input_json_delta` events carry the same fragments
//! under a block index the client tracks itself.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method};
use relaygate_common::new_message_id;
use relaygate_protocol::canonical::{CanonicalRequest, ContentBlock};
use relaygate_protocol::claude::MessagesResponse;
use relaygate_protocol::openai::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};
use relaygate_provider_core::adapter::{strip_client_auth_headers, AdaptedRequest, ProviderAdapter, UpstreamHttpRequest};
use relaygate_provider_core::{DecoderState, ProviderError, ProviderResult, UpstreamChannel};
use relaygate_transform::openai_messages::{to_openai_messages, to_openai_tools};

use crate::emitter;
use crate::stop_reason::from_openai_finish_reason;

#[derive(Debug, Default)]
pub struct OpenAiAdapter;

impl ProviderAdapter for OpenAiAdapter {
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
            messages: to_openai_messages(req),
            tools: to_openai_tools(&req.tools),
            stream: req.stream,
            temperature: req.temperature,
            top_p: req.top_p,
            stop: (!req.stop_sequences.is_empty()).then(|| req.stop_sequences.clone()),
            max_tokens: Some(req.max_tokens),
            prompt: None,
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
                url: format!(
                    "{}/v1/chat/completions",
                    channel.base_url.trim_end_matches('/')
                ),
                headers,
                body: Bytes::from(body),
            },
            expects_stream: req.stream,
        })
    }

    fn translate_non_stream(&self, body: &[u8], requested_model: &str) -> ProviderResult<serde_json::Value> {
        let parsed: ChatCompletionResponse =
            serde_json::from_slice(body).map_err(|err| ProviderError::MalformedResponse(err.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("no choices in response".to_string()))?;

        let mut content = Vec::new();
        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            content.push(ContentBlock::Text { text });
        }
        for call in choice.message.tool_calls.unwrap_or_default() {
            let input = serde_json::from_str::<serde_json::Value>(&call.function.arguments)
                .unwrap_or(serde_json::Value::Object(Default::default()));
            content.push(ContentBlock::ToolUse {
                id: call.id.unwrap_or_else(relaygate_common::new_block_id),
                name: call.function.name.unwrap_or_default(),
                input,
            });
        }

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
        let Ok(chunk) = serde_json::from_str::<ChatCompletionChunk>(data) else {
            return vec![];
        };

        let mut out = Vec::new();

        let Some(choice) = chunk.choices.into_iter().next() else {
            return out;
        };

        if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
            let (index, opened) = state.open_text_block();
            if opened {
                out.push(emitter::content_block_start_text(index));
            }
            out.push(emitter::content_block_delta_text(index, &text));
        }

        let tool_deltas = choice.delta.tool_calls.unwrap_or_default();
        if !tool_deltas.is_empty() {
            if let Some(text_index) = state.close_text_block() {
                out.push(emitter::content_block_stop(text_index));
            }
        }

        for tool_delta in tool_deltas {
            let (block_index, opened) = state.tool_block_index(tool_delta.index);
            if opened {
                let id = tool_delta
                    .id
                    .clone()
                    .unwrap_or_else(relaygate_common::new_block_id);
                let name = tool_delta
                    .function
                    .as_ref()
                    .and_then(|f| f.name.clone())
                    .unwrap_or_default();
                if let Some(block) = state.tool_block_mut(tool_delta.index) {
                    block.id = id.clone();
                    block.name = name.clone();
                }
                out.push(emitter::content_block_start_tool(block_index, &id, &name));
            }
            if let Some(arguments) = tool_delta
                .function
                .as_ref()
                .and_then(|f| f.arguments.as_deref())
                .filter(|a| !a.is_empty())
            {
                if let Some(block) = state.tool_block_mut(tool_delta.index) {
                    block.arguments.push_str(arguments);
                }
                out.push(emitter::content_block_delta_partial_json(block_index, arguments));
            }
        }

        if let Some(finish_reason) = choice.finish_reason.as_deref() {
            if let Some(text_index) = state.close_text_block() {
                out.push(emitter::content_block_stop(text_index));
            }
            for index in state.open_tool_indices().collect::<Vec<_>>() {
                out.push(emitter::content_block_stop(index));
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

#[cfg(test)]
mod tests {
    use super::*;
    use relaygate_protocol::openai::{ChunkChoice, Delta};

    fn chunk_json(delta: Delta, finish_reason: Option<&str>) -> String {
        let chunk = ChatCompletionChunk {
            choices: vec![ChunkChoice {
                delta,
                finish_reason: finish_reason.map(str::to_string),
            }],
        };
        serde_json::to_string(&chunk).unwrap()
    }

    #[test]
    fn decode_line_never_emits_message_start_itself() {
        // message_start is the Stream Pump's responsibility now, emitted
        // once before any adapter frame; a lone decode_line call must not
        // produce one on its own.
        let adapter = OpenAiAdapter;
        let mut state = DecoderState::with_message("msg_1".to_string(), "gpt-4o".to_string());
        let delta = Delta {
            role: Some("assistant".to_string()),
            content: Some("hi".to_string()),
            tool_calls: None,
        };
        let frames = adapter.decode_line(None, &chunk_json(delta, None), &mut state);
        let joined: String = frames.iter().map(|b| String::from_utf8_lossy(b).to_string()).collect();
        assert!(!joined.contains("message_start"));
    }

    #[test]
    fn text_delta_opens_block_once_and_stays_open_across_chunks() {
        let adapter = OpenAiAdapter;
        let mut state = DecoderState::with_message("msg_1".to_string(), "gpt-4o".to_string());
        let first = adapter.decode_line(
            None,
            &chunk_json(
                Delta {
                    role: None,
                    content: Some("hel".to_string()),
                    tool_calls: None,
                },
                None,
            ),
            &mut state,
        );
        let second = adapter.decode_line(
            None,
            &chunk_json(
                Delta {
                    role: None,
                    content: Some("lo".to_string()),
                    tool_calls: None,
                },
                None,
            ),
            &mut state,
        );
        let first_text: String = first.iter().map(|b| String::from_utf8_lossy(b).to_string()).collect();
        let second_text: String = second.iter().map(|b| String::from_utf8_lossy(b).to_string()).collect();
        assert!(first_text.contains("content_block_start"));
        assert!(first_text.contains("hel"));
        assert!(!second_text.contains("content_block_start"));
        assert!(second_text.contains("lo"));
    }

    #[test]
    fn finish_reason_closes_the_still_open_text_block() {
        let adapter = OpenAiAdapter;
        let mut state = DecoderState::with_message("msg_1".to_string(), "gpt-4o".to_string());
        adapter.decode_line(
            None,
            &chunk_json(
                Delta {
                    role: None,
                    content: Some("hi".to_string()),
                    tool_calls: None,
                },
                None,
            ),
            &mut state,
        );
        let frames = adapter.decode_line(None, &chunk_json(Delta::default(), Some("stop")), &mut state);
        let joined: String = frames.iter().map(|b| String::from_utf8_lossy(b).to_string()).collect();
        assert!(joined.contains("content_block_stop"));
        assert!(joined.contains("message_delta"));
        assert!(joined.contains("message_stop"));
    }

    #[test]
    fn finish_reason_emits_message_delta_and_stop() {
        let adapter = OpenAiAdapter;
        let mut state = DecoderState::with_message("msg_1".to_string(), "gpt-4o".to_string());
        let delta = Delta::default();
        let frames = adapter.decode_line(None, &chunk_json(delta, Some("stop")), &mut state);
        let joined: String = frames
            .iter()
            .map(|b| String::from_utf8_lossy(b).to_string())
            .collect();
        assert!(joined.contains("message_delta"));
        assert!(joined.contains("message_stop"));
        assert!(joined.contains("end_turn"));
    }

    #[test]
    fn done_sentinel_produces_no_frames() {
        let adapter = OpenAiAdapter;
        let mut state = DecoderState::new();
        assert!(adapter.decode_line(None, "[DONE]", &mut state).is_empty());
    }
}
