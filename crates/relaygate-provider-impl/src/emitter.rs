//! Event Emitter: builds well-formed Claude Messages API stream events and
//! frames them as SSE bytes. Every adapter routes its synthesized events
//! through here so the wire shape is defined in exactly one place.

use bytes::Bytes;
use relaygate_protocol::claude::{
    ContentBlockDelta, ContentBlockStart, ErrorPayload, MessageDeltaPayload, MessageStartPayload,
    StreamEvent, Usage,
};
use relaygate_protocol::sse::encode_frame;
use serde_json::json;

fn frame(name: &str, event: &StreamEvent) -> Bytes {
    let value = serde_json::to_value(event).expect("StreamEvent always serializes");
    encode_frame(name, &value)
}

pub fn message_start(id: &str, model: &str) -> Bytes {
    let event = StreamEvent::MessageStart {
        message: MessageStartPayload {
            id: id.to_string(),
            kind: "message".to_string(),
            role: "assistant".to_string(),
            content: vec![],
            model: model.to_string(),
            usage: Usage {
                input_tokens: 0,
                output_tokens: 0,
            },
        },
    };
    frame("message_start", &event)
}

pub fn content_block_start_text(index: u32) -> Bytes {
    let event = StreamEvent::ContentBlockStart {
        index,
        content_block: ContentBlockStart::Text {
            text: String::new(),
        },
    };
    frame("content_block_start", &event)
}

pub fn content_block_start_tool(index: u32, id: &str, name: &str) -> Bytes {
    let event = StreamEvent::ContentBlockStart {
        index,
        content_block: ContentBlockStart::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input: json!({}),
        },
    };
    frame("content_block_start", &event)
}

pub fn content_block_delta_text(index: u32, text: &str) -> Bytes {
    let event = StreamEvent::ContentBlockDelta {
        index,
        delta: ContentBlockDelta::TextDelta {
            text: text.to_string(),
        },
    };
    frame("content_block_delta", &event)
}

pub fn content_block_delta_partial_json(index: u32, partial_json: &str) -> Bytes {
    let event = StreamEvent::ContentBlockDelta {
        index,
        delta: ContentBlockDelta::InputJsonDelta {
            partial_json: partial_json.to_string(),
        },
    };
    frame("content_block_delta", &event)
}

pub fn content_block_stop(index: u32) -> Bytes {
    frame("content_block_stop", &StreamEvent::ContentBlockStop { index })
}

/// `stop_reason` is `None` when the upstream hasn't told us yet (some
/// providers only send it on the final chunk). Usage is reported as zero:
/// none of the adapters re-derive token counts from streamed text.
pub fn message_delta(stop_reason: Option<&str>) -> Bytes {
    let event = StreamEvent::MessageDelta {
        delta: MessageDeltaPayload {
            stop_reason: stop_reason.map(str::to_string),
            stop_sequence: None,
        },
        usage: Usage {
            input_tokens: 0,
            output_tokens: 0,
        },
    };
    frame("message_delta", &event)
}

pub fn message_stop() -> Bytes {
    frame("message_stop", &StreamEvent::MessageStop)
}

pub fn ping() -> Bytes {
    frame("ping", &StreamEvent::Ping)
}

pub fn error(kind: &str, message: &str) -> Bytes {
    let event = StreamEvent::Error {
        error: ErrorPayload {
            kind: kind.to_string(),
            message: message.to_string(),
        },
    };
    frame("error", &event)
}
