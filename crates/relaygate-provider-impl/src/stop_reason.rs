//! Maps each upstream protocol's own notion of "why generation stopped"
//! onto Claude's `stop_reason` vocabulary (`end_turn`, `max_tokens`,
//! `stop_sequence`, `tool_use`).

pub fn from_openai_finish_reason(reason: &str) -> &'static str {
    match reason {
        "tool_calls" => "tool_use",
        "length" => "max_tokens",
        "content_filter" => "end_turn",
        "stop" => "end_turn",
        _ => "end_turn",
    }
}

pub fn from_gemini_finish_reason(reason: &str) -> &'static str {
    match reason {
        "MAX_TOKENS" => "max_tokens",
        "STOP" => "end_turn",
        "SAFETY" | "RECITATION" | "OTHER" => "end_turn",
        _ => "end_turn",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_tool_calls_maps_to_tool_use() {
        assert_eq!(from_openai_finish_reason("tool_calls"), "tool_use");
    }

    #[test]
    fn openai_length_maps_to_max_tokens() {
        assert_eq!(from_openai_finish_reason("length"), "max_tokens");
    }

    #[test]
    fn unknown_openai_reason_falls_back_to_end_turn() {
        assert_eq!(from_openai_finish_reason("whatever"), "end_turn");
    }

    #[test]
    fn gemini_max_tokens_maps_correctly() {
        assert_eq!(from_gemini_finish_reason("MAX_TOKENS"), "max_tokens");
    }
}
