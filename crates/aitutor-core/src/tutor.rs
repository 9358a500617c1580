//! Per-request orchestration: extract, classify, call upstream, interpret, wrap.
//!
//! Every path ends in a [`Reply`]; nothing here fails the request with an error type. Input and
//! classification misses are answered before any upstream call is made.

use std::sync::Arc;

use crate::error::{ScanError, UpstreamError};
use crate::interpret::{classify_status, interpret, preview, UpstreamOutcome};
use crate::payload::UpstreamRequest;
use crate::scanner::{escape, extract_field};
use crate::subjects::SubjectRegistry;
use crate::upstream::Upstream;

pub const EMPTY_MESSAGE_REPLY: &str = "ERROR: Empty message";
pub const METHOD_NOT_ALLOWED_REPLY: &str = "ERROR: Only POST method supported";

/// The single-field body returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEnvelope {
    reply: String,
}

impl ReplyEnvelope {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }

    pub fn reply(&self) -> &str {
        &self.reply
    }

    /// `{"reply":"<escaped>"}`
    pub fn to_json(&self) -> String {
        format!("{{\"reply\":\"{}\"}}", escape(&self.reply))
    }
}

/// HTTP status plus envelope for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub envelope: ReplyEnvelope,
}

impl Reply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            status: 200,
            envelope: ReplyEnvelope::new(text),
        }
    }

    pub fn bad_request(text: impl Into<String>) -> Self {
        Self {
            status: 400,
            envelope: ReplyEnvelope::new(text),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self {
            status: 405,
            envelope: ReplyEnvelope::new(METHOD_NOT_ALLOWED_REPLY),
        }
    }
}

/// Shared, read-only tutor pipeline. Clone freely; both fields are `Arc`s.
#[derive(Clone)]
pub struct TutorService {
    registry: Arc<SubjectRegistry>,
    upstream: Arc<dyn Upstream>,
}

impl TutorService {
    pub fn new(registry: Arc<SubjectRegistry>, upstream: Arc<dyn Upstream>) -> Self {
        Self { registry, upstream }
    }

    pub fn registry(&self) -> &SubjectRegistry {
        &self.registry
    }

    /// Answers one inbound body (expected to hold a `"message"` string).
    pub async fn answer(&self, body: &str) -> Reply {
        tracing::debug!(target: "aitutor::tutor", body = %preview(body, 500), "request body");

        // Only "" is an input error. Whitespace-only text is refused by the classifier.
        let message = match extract_field(body, "message") {
            Ok(m) => m,
            Err(ScanError::NotFound) => String::new(),
            Err(e) => {
                tracing::warn!(target: "aitutor::tutor", error = %e, "could not read message field");
                String::new()
            }
        };
        if message.is_empty() {
            tracing::info!(target: "aitutor::tutor", "empty message rejected");
            return Reply::bad_request(EMPTY_MESSAGE_REPLY);
        }
        tracing::info!(target: "aitutor::tutor", message = %preview(&message, 80), "question received");

        let Some(subject) = self.registry.classify(&message) else {
            tracing::info!(target: "aitutor::tutor", "question outside allowed subjects");
            return Reply::ok(self.registry.rejection_message());
        };
        tracing::info!(target: "aitutor::tutor", subject = %subject.name(), "allowed subject detected");

        let reply = self.ask_upstream(&message, subject.name()).await;
        tracing::info!(
            target: "aitutor::tutor",
            chars = reply.chars().count(),
            preview = %preview(&reply, 50),
            "reply ready"
        );
        Reply::ok(reply)
    }

    async fn ask_upstream(&self, question: &str, subject: &str) -> String {
        let request = UpstreamRequest::build(question, subject);

        let outcome = match self.upstream.generate(&request).await {
            Ok(res) => {
                if let Some(failure) = classify_status(res.status, &res.body) {
                    tracing::warn!(
                        target: "aitutor::tutor",
                        status = res.status,
                        failure = ?failure,
                        "upstream returned non-200"
                    );
                    return failure.diagnostic();
                }
                interpret(&res.body)
            }
            Err(UpstreamError::Timeout(secs)) => {
                UpstreamOutcome::ApiError(Some(format!("request timed out after {}s", secs)))
            }
            Err(e) => {
                tracing::error!(target: "aitutor::tutor", error = %e, "upstream call failed");
                return format!("⚠️ Error: {}", e);
            }
        };

        match &outcome {
            UpstreamOutcome::Success(_) => {
                tracing::info!(target: "aitutor::tutor", outcome = outcome.kind(), "upstream answered")
            }
            _ => tracing::warn!(target: "aitutor::tutor", outcome = outcome.kind(), "upstream content problem"),
        }
        outcome.into_reply()
    }
}
