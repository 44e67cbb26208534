//! The canonical intermediate representation that flows between an inbound
//! Claude Messages request and each provider adapter. Because Claude is the
//! proxy's native inbound shape, this closely mirrors the Claude wire types
//! in [`crate::claude`]; adapters translate *out of* this shape, not into it.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// Deserializes leniently through [`normalize_role`] instead of rejecting
/// anything outside the exact four lowercase spellings, so a client sending
/// `"human"` or `"model"` is normalized rather than bounced with a 400.
/// Serialization stays strict (derived, lowercase) since that's this
/// proxy's own wire shape going out to a Claude-native upstream.
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Err(D::Error::custom("role must not be empty"));
        }
        Ok(normalize_role(&raw))
    }
}

/// Total, deterministic role mapping. `model` maps to `assistant` (Gemini's
/// spelling), `human` maps to `user` (a common alternate spelling), anything
/// else unrecognized defaults to `user`. Idempotent: `normalize_role(r.as_str()) == r`.
pub fn normalize_role(raw: &str) -> Role {
    match raw.to_ascii_lowercase().as_str() {
        "system" => Role::System,
        "assistant" | "model" => Role::Assistant,
        "tool" => Role::Tool,
        _ => Role::User,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl ToolResultContent {
    /// Flatten to a single string the way non-Claude wire formats require.
    pub fn flatten_text(&self) -> String {
        match self {
            ToolResultContent::Text(text) => text.clone(),
            ToolResultContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: Option<String>,
    pub data: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: ToolResultContent,
        #[serde(default)]
        is_error: bool,
    },
    Image {
        source: ImageSource,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalMessage {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRequest {
    pub model: String,
    pub messages: Vec<CanonicalMessage>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
    #[serde(default)]
    pub stream: bool,
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub stop_sequences: Vec<String>,
}

impl CanonicalMessage {
    pub fn text_only(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_mapping_is_total_and_deterministic() {
        assert_eq!(normalize_role("model"), Role::Assistant);
        assert_eq!(normalize_role("MODEL"), Role::Assistant);
        assert_eq!(normalize_role("human"), Role::User);
        assert_eq!(normalize_role("assistant"), Role::Assistant);
        assert_eq!(normalize_role("system"), Role::System);
        assert_eq!(normalize_role("tool"), Role::Tool);
        assert_eq!(normalize_role("whatever-unknown"), Role::User);
    }

    #[test]
    fn role_mapping_is_idempotent_through_as_str() {
        for role in [Role::System, Role::User, Role::Assistant, Role::Tool] {
            assert_eq!(normalize_role(role.as_str()), role);
        }
    }

    #[test]
    fn deserializing_a_message_normalizes_an_alternate_role_spelling() {
        let message: CanonicalMessage = serde_json::from_str(
            r#"{"role":"human","content":[{"type":"text","text":"hi"}]}"#,
        )
        .unwrap();
        assert_eq!(message.role, Role::User);

        let message: CanonicalMessage = serde_json::from_str(
            r#"{"role":"model","content":[{"type":"text","text":"hi"}]}"#,
        )
        .unwrap();
        assert_eq!(message.role, Role::Assistant);
    }

    #[test]
    fn role_still_serializes_to_the_strict_lowercase_spelling() {
        let value = serde_json::to_value(Role::Assistant).unwrap();
        assert_eq!(value, serde_json::json!("assistant"));
    }
}
