//! Failure Classifier: turns a raw upstream HTTP status + body into a
//! decision about whether the Request Router should accept the response,
//! fail over to the next key/channel, or pass the failure straight through
//! to the client.

use bytes::Bytes;
use serde::Deserialize;

/// Message substrings that mark a 400 response as a (likely recoverable)
/// account-level problem rather than a genuine bad request from the client.
const MESSAGE_KEYWORDS: &[&str] = &[
    "积分不足",
    "insufficient",
    "invalid",
    "unauthorized",
    "quota",
    "rate limit",
    "credit",
    "balance",
];

/// `error.type` values that mark the same thing.
const TYPE_KEYWORDS: &[&str] = &["permission", "insufficient", "over_quota", "billing"];

/// The subset of keywords specifically about spend/quota, as opposed to auth
/// or malformed-request language. Used only to set the `quota_related` flag
/// the scheduler can use to decide whether a key is worth retrying later.
const QUOTA_SUBSET: &[&str] = &["quota", "credit", "balance", "billing"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlReason {
    CloudflareChallenge,
    GenericHtml,
}

#[derive(Debug, Clone)]
pub struct FailoverInfo {
    pub status: u16,
    pub body: Bytes,
    pub quota_related: bool,
    pub html_reason: Option<HtmlReason>,
}

#[derive(Debug, Clone)]
pub enum ClassifyOutcome {
    Success,
    Failover(FailoverInfo),
    FatalPassThrough,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Classifies one upstream attempt. `status` is the HTTP status code;
/// `body` is the raw response body read so far (for streaming responses,
/// whatever arrived before the first byte was written downstream).
pub fn classify(status: u16, body: &Bytes) -> ClassifyOutcome {
    if (200..300).contains(&status) {
        return ClassifyOutcome::Success;
    }

    if status == 401 || status == 403 {
        return ClassifyOutcome::Failover(FailoverInfo {
            status,
            body: body.clone(),
            quota_related: false,
            html_reason: None,
        });
    }

    if status >= 500 {
        return ClassifyOutcome::Failover(FailoverInfo {
            status,
            body: body.clone(),
            quota_related: false,
            html_reason: detect_html_reason(body),
        });
    }

    if status == 400 {
        if let Some(quota_related) = classify_400_body(body) {
            return ClassifyOutcome::Failover(FailoverInfo {
                status,
                body: body.clone(),
                quota_related,
                html_reason: None,
            });
        }
        return ClassifyOutcome::FatalPassThrough;
    }

    ClassifyOutcome::FatalPassThrough
}

/// Returns `Some(quota_related)` if the 400 body matches the account-error
/// keyword table, `None` if it looks like a genuine client error.
fn classify_400_body(body: &Bytes) -> Option<bool> {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).ok()?;
    let error = envelope.error?;
    let message = error.message.unwrap_or_default().to_lowercase();
    let kind = error.kind.unwrap_or_default().to_lowercase();

    for keyword in MESSAGE_KEYWORDS {
        if message.contains(keyword) {
            return Some(QUOTA_SUBSET.contains(keyword));
        }
    }
    for keyword in TYPE_KEYWORDS {
        if kind.contains(keyword) {
            return Some(QUOTA_SUBSET.contains(keyword));
        }
    }
    None
}

fn detect_html_reason(body: &Bytes) -> Option<HtmlReason> {
    let text = String::from_utf8_lossy(body).to_lowercase();
    if text.contains("cloudflare") && (text.contains("just a moment") || text.contains("__cf_chl_opt")) {
        return Some(HtmlReason::CloudflareChallenge);
    }
    let trimmed = text.trim_start();
    if trimmed.starts_with("<!doctype") || trimmed.starts_with("<html") {
        return Some(HtmlReason::GenericHtml);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Bytes {
        Bytes::from(value.to_string())
    }

    #[test]
    fn success_range_is_accepted() {
        assert!(matches!(
            classify(200, &Bytes::new()),
            ClassifyOutcome::Success
        ));
        assert!(matches!(
            classify(204, &Bytes::new()),
            ClassifyOutcome::Success
        ));
    }

    #[test]
    fn auth_failures_always_fail_over() {
        let outcome = classify(401, &body(json!({"error": {"message": "nope"}})));
        assert!(matches!(outcome, ClassifyOutcome::Failover(_)));
    }

    #[test]
    fn server_errors_fail_over_and_detect_cloudflare() {
        let html = Bytes::from_static(
            b"<!doctype html><html><body>cloudflare just a moment...</body></html>",
        );
        let outcome = classify(503, &html);
        match outcome {
            ClassifyOutcome::Failover(info) => {
                assert_eq!(info.html_reason, Some(HtmlReason::CloudflareChallenge));
            }
            _ => panic!("expected failover"),
        }
    }

    #[test]
    fn generic_html_error_page_is_flagged_but_not_cloudflare() {
        let html = Bytes::from_static(b"<html><body>502 Bad Gateway</body></html>");
        let outcome = classify(502, &html);
        match outcome {
            ClassifyOutcome::Failover(info) => {
                assert_eq!(info.html_reason, Some(HtmlReason::GenericHtml));
            }
            _ => panic!("expected failover"),
        }
    }

    #[test]
    fn bad_request_with_quota_message_fails_over_and_is_quota_related() {
        let outcome = classify(
            400,
            &body(json!({"error": {"message": "credit balance too low", "type": "billing"}})),
        );
        match outcome {
            ClassifyOutcome::Failover(info) => assert!(info.quota_related),
            _ => panic!("expected failover"),
        }
    }

    #[test]
    fn bad_request_with_unrelated_message_passes_through() {
        let outcome = classify(
            400,
            &body(json!({"error": {"message": "messages: field required", "type": "invalid_request_error"}})),
        );
        assert!(matches!(outcome, ClassifyOutcome::FatalPassThrough));
    }

    #[test]
    fn bad_request_with_unparseable_body_passes_through() {
        let outcome = classify(400, &Bytes::from_static(b"not json"));
        assert!(matches!(outcome, ClassifyOutcome::FatalPassThrough));
    }

    #[test]
    fn other_client_errors_pass_through() {
        assert!(matches!(
            classify(404, &Bytes::new()),
            ClassifyOutcome::FatalPassThrough
        ));
        assert!(matches!(
            classify(422, &Bytes::new()),
            ClassifyOutcome::FatalPassThrough
        ));
    }
}
