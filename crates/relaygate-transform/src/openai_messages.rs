//! Claude canonical messages → OpenAI chat/completions message list.

use relaygate_protocol::canonical::{CanonicalRequest, ContentBlock, Role};
use relaygate_protocol::openai::{ChatMessage, FunctionCall, FunctionDef, ToolCall, ToolDef};

use crate::schema::clean_schema;

pub fn to_openai_messages(req: &CanonicalRequest) -> Vec<ChatMessage> {
    let mut out = Vec::new();

    if let Some(system) = req.system.as_ref().filter(|s| !s.is_empty()) {
        out.push(plain_message("system", system.clone()));
    }

    for message in &req.messages {
        match message.role {
            Role::Tool => {
                for block in &message.content {
                    if let ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                        ..
                    } = block
                    {
                        out.push(tool_result_message(tool_use_id, content.flatten_text()));
                    }
                }
            }
            Role::User => {
                let mut text_parts = Vec::new();
                for block in &message.content {
                    match block {
                        ContentBlock::Text { text } => text_parts.push(text.clone()),
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            ..
                        } => out.push(tool_result_message(tool_use_id, content.flatten_text())),
                        ContentBlock::Image { .. } | ContentBlock::ToolUse { .. } => {}
                    }
                }
                if !text_parts.is_empty() {
                    out.push(plain_message("user", text_parts.concat()));
                }
            }
            Role::Assistant => {
                let mut text_parts = Vec::new();
                let mut tool_calls = Vec::new();
                for block in &message.content {
                    match block {
                        ContentBlock::Text { text } => text_parts.push(text.clone()),
                        ContentBlock::ToolUse { id, name, input } => {
                            tool_calls.push(ToolCall {
                                id: Some(id.clone()),
                                kind: "function".to_string(),
                                function: FunctionCall {
                                    name: Some(name.clone()),
                                    arguments: input.to_string(),
                                },
                            });
                        }
                        ContentBlock::ToolResult { .. } | ContentBlock::Image { .. } => {}
                    }
                }
                out.push(ChatMessage {
                    role: "assistant".to_string(),
                    content: (!text_parts.is_empty()).then(|| text_parts.concat()),
                    tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                    tool_call_id: None,
                    name: None,
                });
            }
            Role::System => out.push(plain_message("system", message.text_only())),
        }
    }

    out
}

pub fn to_openai_tools(tools: &[relaygate_protocol::canonical::ToolSpec]) -> Option<Vec<ToolDef>> {
    if tools.is_empty() {
        return None;
    }
    Some(
        tools
            .iter()
            .map(|tool| ToolDef {
                kind: "function".to_string(),
                function: FunctionDef {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: clean_schema(&tool.input_schema),
                },
            })
            .collect(),
    )
}

/// Flattens a canonical request into a single prompt string for the legacy
/// completions variant, which has no structured message list.
pub fn flatten_to_prompt(req: &CanonicalRequest) -> String {
    let mut buf = String::new();
    if let Some(system) = req.system.as_ref().filter(|s| !s.is_empty()) {
        buf.push_str("System: ");
        buf.push_str(system);
        buf.push_str("\n\n");
    }
    for message in &req.messages {
        let label = match message.role {
            Role::User => "Human",
            Role::Assistant => "Assistant",
            Role::System => "System",
            Role::Tool => "Tool",
        };
        buf.push_str(label);
        buf.push_str(": ");
        buf.push_str(&message.text_only());
        buf.push_str("\n\n");
    }
    buf.push_str("Assistant:");
    buf
}

fn plain_message(role: &str, content: String) -> ChatMessage {
    ChatMessage {
        role: role.to_string(),
        content: Some(content),
        tool_calls: None,
        tool_call_id: None,
        name: None,
    }
}

fn tool_result_message(tool_use_id: &str, content: String) -> ChatMessage {
    ChatMessage {
        role: "tool".to_string(),
        content: Some(content),
        tool_calls: None,
        tool_call_id: Some(tool_use_id.to_string()),
        name: None,
    }
}
