//! Error types for the tutor pipeline.

use thiserror::Error;

/// Why a field value could not be read out of a JSON-like blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// No `:` between the field name and its value.
    MissingSeparator,
    /// Input ended before the value's opening quote.
    MissingOpeningQuote,
    /// Something other than whitespace sat before the opening quote (e.g. a number or object).
    UnexpectedChar(char),
    /// Input ended inside the string value.
    Incomplete,
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedReason::MissingSeparator => write!(f, "missing ':' after field name"),
            MalformedReason::MissingOpeningQuote => write!(f, "no opening quote"),
            MalformedReason::UnexpectedChar(c) => write!(f, "expected quote but found {:?}", c),
            MalformedReason::Incomplete => write!(f, "no closing quote found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("field not found")]
    NotFound,
    #[error("malformed field: {0}")]
    Malformed(MalformedReason),
}

/// Invariant violations when building a [`crate::SubjectRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("subject {0:?} is registered more than once")]
    DuplicateSubject(String),
    #[error("subject name must not be blank")]
    BlankSubject,
    #[error("subject {0:?} has no keywords")]
    EmptyKeywords(String),
    #[error("subject {0:?} has a blank keyword")]
    BlankKeyword(String),
}

/// Failures talking to the generative API before a status code is available.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("{}", with_causes(.0))]
    Transport(#[from] reqwest::Error),
}

/// reqwest's `Display` stops at the outer layer ("error sending request for url ..."), so the
/// `source()` chain is appended (e.g. "... : tcp connect error: Connection refused").
fn with_causes(e: &reqwest::Error) -> String {
    let mut out = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config: {0}")]
    Load(#[from] config::ConfigError),
    #[error("GEMINI_API_KEY not found. Add GEMINI_API_KEY=your-api-key-here to .env or the environment (free key: https://aistudio.google.com/app/apikey)")]
    MissingApiKey,
    #[error("subjects: {0}")]
    Registry(#[from] RegistryError),
    #[error("no ports configured")]
    NoPorts,
}
