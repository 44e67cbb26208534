//! Claude canonical messages → Gemini `contents` / `systemInstruction`.

use relaygate_protocol::canonical::{CanonicalRequest, ContentBlock, Role, ToolSpec};
use relaygate_protocol::gemini::{Content, FunctionDeclaration, GeminiTool, Part};
use serde_json::json;

use crate::schema::clean_schema;

/// Returns `(contents, system_instruction)`.
pub fn to_gemini_contents(req: &CanonicalRequest) -> (Vec<Content>, Option<Content>) {
    let mut system_parts = Vec::new();
    if let Some(system) = req.system.as_ref().filter(|s| !s.is_empty()) {
        system_parts.push(Part::text(system.clone()));
    }

    let mut contents = Vec::new();
    for message in &req.messages {
        if matches!(message.role, Role::System) {
            system_parts.push(Part::text(message.text_only()));
            continue;
        }

        let role = match message.role {
            Role::Assistant => "model",
            Role::Tool => "function",
            _ => "user",
        };

        let mut parts = Vec::new();
        for block in &message.content {
            match block {
                ContentBlock::Text { text } => parts.push(Part::text(text.clone())),
                ContentBlock::ToolUse { name, input, .. } => {
                    parts.push(Part::function_call(name.clone(), input.clone()))
                }
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    ..
                } => {
                    // Claude's tool_result only carries the id of the matching
                    // tool_use, not its name; Gemini's functionResponse wants a
                    // name, so the id stands in for it. Declared in DESIGN.md.
                    parts.push(Part::function_response(
                        tool_use_id.clone(),
                        json!({ "result": content.flatten_text() }),
                    ));
                }
                ContentBlock::Image { .. } => {}
            }
        }

        if !parts.is_empty() {
            contents.push(Content {
                role: Some(role.to_string()),
                parts,
            });
        }
    }

    let system_instruction = if system_parts.is_empty() {
        None
    } else {
        Some(Content {
            role: None,
            parts: system_parts,
        })
    };

    (contents, system_instruction)
}

pub fn to_gemini_tools(tools: &[ToolSpec]) -> Option<Vec<GeminiTool>> {
    if tools.is_empty() {
        return None;
    }
    Some(vec![GeminiTool {
        function_declarations: tools
            .iter()
            .map(|tool| FunctionDeclaration {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: clean_schema(&tool.input_schema),
            })
            .collect(),
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaygate_protocol::canonical::CanonicalMessage;

    fn base_request(messages: Vec<CanonicalMessage>) -> CanonicalRequest {
        CanonicalRequest {
            model: "gemini-pro".to_string(),
            messages,
            system: Some("be terse".to_string()),
            tools: vec![],
            stream: false,
            max_tokens: 100,
            temperature: None,
            top_p: None,
            stop_sequences: vec![],
        }
    }

    #[test]
    fn system_text_collects_into_system_instruction() {
        let (_, system) = to_gemini_contents(&base_request(vec![]));
        let system = system.unwrap();
        assert_eq!(system.parts[0].text.as_deref(), Some("be terse"));
    }

    #[test]
    fn assistant_role_maps_to_model() {
        let (contents, _) = to_gemini_contents(&base_request(vec![CanonicalMessage {
            role: Role::Assistant,
            content: vec![ContentBlock::Text {
                text: "hi".to_string(),
            }],
        }]));
        assert_eq!(contents[0].role.as_deref(), Some("model"));
    }

    #[test]
    fn tool_use_becomes_function_call_part() {
        let (contents, _) = to_gemini_contents(&base_request(vec![CanonicalMessage {
            role: Role::Assistant,
            content: vec![ContentBlock::ToolUse {
                id: "t1".to_string(),
                name: "g".to_string(),
                input: json!({"x": 2}),
            }],
        }]));
        let call = contents[0].parts[0].function_call.as_ref().unwrap();
        assert_eq!(call.name, "g");
        assert_eq!(call.args, json!({"x": 2}));
    }
}
