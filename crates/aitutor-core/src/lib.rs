//! aitutor-core: subject-gated tutoring over the Gemini `generateContent` API.
//!
//! The pipeline is deliberately schema-free: the inbound `message` field and the upstream
//! `text` field are pulled out with the [`scanner`] primitives, and the upstream request body is
//! assembled by hand in [`payload`]. [`tutor::TutorService`] ties the pieces together per request.

pub mod config;
pub mod error;
pub mod interpret;
pub mod payload;
pub mod scanner;
pub mod subjects;
pub mod tutor;
pub mod upstream;

pub use config::{load_api_key, SubjectEntry, TutorConfig, API_KEY_ENV};
pub use error::{ConfigError, MalformedReason, RegistryError, ScanError, UpstreamError};
pub use interpret::{classify_status, interpret, EmptyContent, MalformedBody, StatusFailure, UpstreamOutcome};
pub use payload::{GenerationConfig, UpstreamRequest, GENERATION_CONFIG};
pub use scanner::{decode, escape, extract_field};
pub use subjects::{Subject, SubjectRegistry};
pub use tutor::{Reply, ReplyEnvelope, TutorService, EMPTY_MESSAGE_REPLY, METHOD_NOT_ALLOWED_REPLY};
pub use upstream::{GeminiClient, Upstream, UpstreamReply};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
