//! Classification of Gemini responses into a closed set of outcomes.
//!
//! ## Precedence
//!
//! Several markers can appear in the same body (a truncated candidate still carries a `text`
//! part), so checks run in a fixed order and the first hit decides:
//!
//! | Step | Condition | Outcome |
//! |------|-----------|---------|
//! | 0 | HTTP status != 200 | [`StatusFailure`] (see [`classify_status`]) |
//! | 1 | blank body | `Malformed(Empty)` |
//! | 2 | `finishReason` = `MAX_TOKENS` | `Truncated` |
//! | 3 | `finishReason` = `SAFETY` | `SafetyBlocked` |
//! | 4 | `finishReason` = `RECITATION` | `RecitationBlocked` |
//! | 5 | `"error"` present | `ApiError` |
//! | 6 | first `text` field | `Success` / `EmptyContent` / `Malformed` |
//!
//! New outcomes go in at the step matching their priority, not at the end.

use crate::error::{MalformedReason, ScanError};
use crate::scanner::{extract_field, has_empty_array, has_string_value};

const SNIPPET_CHARS: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedBody {
    Empty,
    /// No `text` field; carries the first 300 characters of the body.
    UnexpectedFormat(String),
    /// A `text` field was found but its value could not be read.
    Scan(MalformedReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyContent {
    /// `"parts": []`
    NoParts,
    /// The text part was blank.
    BlankText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamOutcome {
    Success(String),
    Truncated,
    SafetyBlocked,
    RecitationBlocked,
    /// Explicit `error` object; `None` when it had no readable `message`.
    ApiError(Option<String>),
    Malformed(MalformedBody),
    EmptyContent(EmptyContent),
}

impl UpstreamOutcome {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamOutcome::Success(_) => "success",
            UpstreamOutcome::Truncated => "truncated",
            UpstreamOutcome::SafetyBlocked => "safety_blocked",
            UpstreamOutcome::RecitationBlocked => "recitation_blocked",
            UpstreamOutcome::ApiError(_) => "api_error",
            UpstreamOutcome::Malformed(_) => "malformed",
            UpstreamOutcome::EmptyContent(_) => "empty_content",
        }
    }

    /// Text for the reply envelope: the generated answer or a diagnostic.
    pub fn into_reply(self) -> String {
        match self {
            UpstreamOutcome::Success(text) => text,
            UpstreamOutcome::Truncated => {
                "⚠️ Response was too long and got cut off. Please ask a more specific question."
                    .to_string()
            }
            UpstreamOutcome::SafetyBlocked => {
                "⚠️ Response blocked due to safety filters. Please rephrase your question."
                    .to_string()
            }
            UpstreamOutcome::RecitationBlocked => {
                "⚠️ Response blocked due to recitation concerns. Please rephrase your question."
                    .to_string()
            }
            UpstreamOutcome::ApiError(Some(message)) => format!("⚠️ API Error: {}", message),
            UpstreamOutcome::ApiError(None) => {
                "⚠️ API returned an error. Check server logs for details.".to_string()
            }
            UpstreamOutcome::EmptyContent(EmptyContent::NoParts) => {
                "⚠️ API returned empty content. The response may have been filtered or truncated."
                    .to_string()
            }
            UpstreamOutcome::EmptyContent(EmptyContent::BlankText) => {
                "⚠️ API returned empty text content".to_string()
            }
            UpstreamOutcome::Malformed(MalformedBody::Empty) => {
                "⚠️ Received empty response from API".to_string()
            }
            UpstreamOutcome::Malformed(MalformedBody::UnexpectedFormat(snippet)) => {
                format!("⚠️ Unexpected response format: {}", snippet)
            }
            UpstreamOutcome::Malformed(MalformedBody::Scan(MalformedReason::Incomplete)) => {
                "⚠️ Incomplete JSON response - no closing quote found".to_string()
            }
            UpstreamOutcome::Malformed(MalformedBody::Scan(_)) => {
                "⚠️ Malformed JSON response".to_string()
            }
        }
    }
}

/// Interprets a 200 response body. See the module docs for the order of checks.
pub fn interpret(body: &str) -> UpstreamOutcome {
    if body.trim().is_empty() {
        return UpstreamOutcome::Malformed(MalformedBody::Empty);
    }
    if has_string_value(body, "finishReason", "MAX_TOKENS") {
        return UpstreamOutcome::Truncated;
    }
    if has_string_value(body, "finishReason", "SAFETY") {
        return UpstreamOutcome::SafetyBlocked;
    }
    if has_string_value(body, "finishReason", "RECITATION") {
        return UpstreamOutcome::RecitationBlocked;
    }
    if let Some(pos) = body.find("\"error\"") {
        return UpstreamOutcome::ApiError(extract_field(&body[pos..], "message").ok());
    }

    match extract_field(body, "text") {
        Ok(text) if text.trim().is_empty() => UpstreamOutcome::EmptyContent(EmptyContent::BlankText),
        Ok(text) => UpstreamOutcome::Success(text),
        Err(ScanError::NotFound) if has_empty_array(body, "parts") => {
            UpstreamOutcome::EmptyContent(EmptyContent::NoParts)
        }
        Err(ScanError::NotFound) => {
            UpstreamOutcome::Malformed(MalformedBody::UnexpectedFormat(preview(body, SNIPPET_CHARS)))
        }
        Err(ScanError::Malformed(reason)) => UpstreamOutcome::Malformed(MalformedBody::Scan(reason)),
    }
}

/// First `n` characters of `s`, with an ellipsis when cut.
pub(crate) fn preview(s: &str, n: usize) -> String {
    let mut chars = s.chars();
    let head: String = chars.by_ref().take(n).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Non-200 responses, checked before the body is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFailure {
    RateLimited,
    /// 400; carries the error body.
    BadRequest(String),
    InvalidCredential,
    /// 404; carries the error body.
    ModelNotFound(String),
    Other(u16),
}

impl StatusFailure {
    pub fn diagnostic(&self) -> String {
        match self {
            StatusFailure::RateLimited => {
                "⚠️ Rate limit exceeded. Please wait a moment and try again.".to_string()
            }
            StatusFailure::BadRequest(detail) => format!("⚠️ Invalid request format. Error: {}", detail),
            StatusFailure::InvalidCredential => {
                "⚠️ API key invalid. Get a new key at https://aistudio.google.com/app/apikey"
                    .to_string()
            }
            StatusFailure::ModelNotFound(detail) => format!("⚠️ Model not found. Error: {}", detail),
            StatusFailure::Other(code) => format!("⚠️ API Error: {}", code),
        }
    }
}

/// `None` for 200; otherwise the matching failure.
pub fn classify_status(status: u16, body: &str) -> Option<StatusFailure> {
    match status {
        200 => None,
        429 => Some(StatusFailure::RateLimited),
        400 => Some(StatusFailure::BadRequest(body.trim().to_string())),
        403 => Some(StatusFailure::InvalidCredential),
        404 => Some(StatusFailure::ModelNotFound(body.trim().to_string())),
        other => Some(StatusFailure::Other(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_extracts_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hello"}]}}]}"#;
        assert_eq!(interpret(body), UpstreamOutcome::Success("Hello".into()));
    }

    #[test]
    fn success_decodes_escapes() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Line 1\nLine \"2\" <ok>"}],"role":"model"},"finishReason":"STOP"}]}"#;
        assert_eq!(
            interpret(body),
            UpstreamOutcome::Success("Line 1\nLine \"2\" <ok>".into())
        );
    }

    #[test]
    fn pretty_printed_success() {
        let body = "{\n  \"candidates\": [\n    {\n      \"content\": {\n        \"parts\": [\n          {\n            \"text\": \"A stack is LIFO.\"\n          }\n        ]\n      },\n      \"finishReason\": \"STOP\"\n    }\n  ]\n}";
        assert_eq!(interpret(body), UpstreamOutcome::Success("A stack is LIFO.".into()));
    }

    #[test]
    fn blank_body_is_malformed() {
        assert_eq!(interpret(""), UpstreamOutcome::Malformed(MalformedBody::Empty));
        assert_eq!(interpret(" \n "), UpstreamOutcome::Malformed(MalformedBody::Empty));
    }

    #[test]
    fn max_tokens_beats_earlier_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"partial"}]},"finishReason":"MAX_TOKENS"}]}"#;
        assert_eq!(interpret(body), UpstreamOutcome::Truncated);
        let spaced = r#"{"candidates": [{"content": {"parts": [{"text": "partial"}]}, "finishReason": "MAX_TOKENS"}]}"#;
        assert_eq!(interpret(spaced), UpstreamOutcome::Truncated);
    }

    #[test]
    fn safety_and_recitation() {
        assert_eq!(
            interpret(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#),
            UpstreamOutcome::SafetyBlocked
        );
        assert_eq!(
            interpret(r#"{"candidates":[{"finishReason": "RECITATION"}]}"#),
            UpstreamOutcome::RecitationBlocked
        );
    }

    #[test]
    fn truncation_outranks_safety() {
        let body = r#"[{"finishReason":"SAFETY"},{"finishReason":"MAX_TOKENS"}]"#;
        assert_eq!(interpret(body), UpstreamOutcome::Truncated);
    }

    #[test]
    fn api_error_with_and_without_message() {
        assert_eq!(
            interpret(r#"{"error":{"message":"bad key"}}"#),
            UpstreamOutcome::ApiError(Some("bad key".into()))
        );
        assert_eq!(
            interpret(r#"{"error":{"code":500,"status":"INTERNAL"}}"#),
            UpstreamOutcome::ApiError(None)
        );
    }

    #[test]
    fn api_error_message_is_read_after_error_key() {
        let body = r#"{"message":"outer","error":{"code":400,"message":"inner"}}"#;
        assert_eq!(interpret(body), UpstreamOutcome::ApiError(Some("inner".into())));
    }

    #[test]
    fn empty_parts_is_empty_content() {
        let body = r#"{"candidates":[{"content":{"parts": []}}]}"#;
        assert_eq!(interpret(body), UpstreamOutcome::EmptyContent(EmptyContent::NoParts));
    }

    #[test]
    fn blank_text_is_empty_content() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":" \n "}]}}]}"#;
        assert_eq!(interpret(body), UpstreamOutcome::EmptyContent(EmptyContent::BlankText));
    }

    #[test]
    fn unknown_shape_carries_bounded_snippet() {
        let short = r#"{"candidates":[]}"#;
        assert_eq!(
            interpret(short),
            UpstreamOutcome::Malformed(MalformedBody::UnexpectedFormat(short.into()))
        );

        let long = format!("{{\"usage\":\"{}\"}}", "x".repeat(400));
        match interpret(&long) {
            UpstreamOutcome::Malformed(MalformedBody::UnexpectedFormat(s)) => {
                assert_eq!(s.chars().count(), SNIPPET_CHARS + 3);
                assert!(s.ends_with("..."));
                assert!(long.starts_with(s.trim_end_matches("...")));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn unterminated_text_is_incomplete() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"cut off"#;
        let outcome = interpret(body);
        assert_eq!(
            outcome,
            UpstreamOutcome::Malformed(MalformedBody::Scan(MalformedReason::Incomplete))
        );
        assert_eq!(
            outcome.into_reply(),
            "⚠️ Incomplete JSON response - no closing quote found"
        );
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("héllo", 2), "hé...");
        assert_eq!(preview("hi", 5), "hi");
    }

    #[test]
    fn status_mapping() {
        assert_eq!(classify_status(200, "{}"), None);
        assert_eq!(classify_status(429, ""), Some(StatusFailure::RateLimited));
        assert_eq!(classify_status(403, ""), Some(StatusFailure::InvalidCredential));
        assert_eq!(
            classify_status(404, " model gone \n"),
            Some(StatusFailure::ModelNotFound("model gone".into()))
        );
        assert_eq!(
            classify_status(400, "bad"),
            Some(StatusFailure::BadRequest("bad".into()))
        );
        assert_eq!(classify_status(503, ""), Some(StatusFailure::Other(503)));
    }

    #[test]
    fn diagnostics_are_distinct() {
        let replies = [
            UpstreamOutcome::Truncated.into_reply(),
            UpstreamOutcome::SafetyBlocked.into_reply(),
            UpstreamOutcome::RecitationBlocked.into_reply(),
            UpstreamOutcome::EmptyContent(EmptyContent::NoParts).into_reply(),
            UpstreamOutcome::EmptyContent(EmptyContent::BlankText).into_reply(),
            UpstreamOutcome::Malformed(MalformedBody::Empty).into_reply(),
            UpstreamOutcome::ApiError(None).into_reply(),
        ];
        for (i, a) in replies.iter().enumerate() {
            for b in &replies[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(StatusFailure::Other(502).diagnostic(), "⚠️ API Error: 502");
        assert!(StatusFailure::ModelNotFound("x".into()).diagnostic().ends_with("Error: x"));
    }
}
