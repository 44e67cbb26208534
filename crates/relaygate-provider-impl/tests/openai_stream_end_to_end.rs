use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use relaygate_provider_impl::{adapters::openai::OpenAiAdapter, pump, PumpError};

/// Feeds a realistic OpenAI streaming response (text, then a tool call split
/// across several chunks, then `[DONE]`) through the Stream Pump and checks
/// the resulting Claude SSE frames are well-formed and ordered.
#[tokio::test]
async fn openai_stream_translates_to_well_ordered_claude_events() {
    let lines = [
        r#"data: {"choices":[{"delta":{"role":"assistant","content":"Sure"}}]}"#,
        r#"data: {"choices":[{"delta":{"content":", "}}]}"#,
        r#"data: {"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"lookup","arguments":""}}]}}]}"#,
        r#"data: {"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"q\":"}}]}}]}"#,
        r#"data: {"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\"weather\"}"}}]}}]}"#,
        r#"data: {"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#,
        "data: [DONE]",
    ];
    let chunks: Vec<Result<Bytes, PumpError>> = lines
        .iter()
        .map(|line| Ok(Bytes::from(format!("{line}\n\n"))))
        .collect();
    let upstream = futures_util::stream::iter(chunks);

    let adapter: Arc<dyn relaygate_provider_core::ProviderAdapter> = Arc::new(OpenAiAdapter);
    let frames: Vec<Bytes> = pump(adapter, upstream, "msg_test".to_string(), "gpt-4o".to_string())
        .map(|r| r.unwrap())
        .collect()
        .await;

    let joined: String = frames
        .iter()
        .map(|b| String::from_utf8_lossy(b).to_string())
        .collect();

    // message_start must come first, message_stop last.
    let start_pos = joined.find("message_start").unwrap();
    let stop_pos = joined.rfind("message_stop").unwrap();
    assert!(start_pos < stop_pos);

    // The text block must fully close before the tool block's frames begin.
    let text_stop_pos = joined.find("content_block_stop").unwrap();
    let tool_start_pos = joined.find("\"name\":\"lookup\"").unwrap();
    assert!(text_stop_pos < tool_start_pos);

    // The tool arguments were accumulated in order.
    assert!(joined.contains("{\\\"q\\\":"));
    assert!(joined.contains("\\\"weather\\\"}"));

    assert!(joined.contains("\"stop_reason\":\"tool_use\""));
}

/// An upstream that streams content then drops the connection without ever
/// sending a `finish_reason` must still yield a client stream bracketed by
/// exactly one `message_start` and one `message_stop`.
#[tokio::test]
async fn a_dropped_connection_without_finish_reason_still_gets_a_terminal_message_stop() {
    let lines = [r#"data: {"choices":[{"delta":{"role":"assistant","content":"partial answer"}}]}"#];
    let chunks: Vec<Result<Bytes, PumpError>> = lines
        .iter()
        .map(|line| Ok(Bytes::from(format!("{line}\n\n"))))
        .collect();
    let upstream = futures_util::stream::iter(chunks);

    let adapter: Arc<dyn relaygate_provider_core::ProviderAdapter> = Arc::new(OpenAiAdapter);
    let frames: Vec<Bytes> = pump(adapter, upstream, "msg_test".to_string(), "gpt-4o".to_string())
        .map(|r| r.unwrap())
        .collect()
        .await;

    let joined: String = frames.iter().map(|b| String::from_utf8_lossy(b).to_string()).collect();
    assert_eq!(joined.matches("message_start").count(), 1);
    assert_eq!(joined.matches("message_stop").count(), 1);
    assert!(joined.find("message_start").unwrap() < joined.find("message_stop").unwrap());
}
