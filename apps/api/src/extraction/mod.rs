//! Structured extraction: the out-of-process service that turns cleaned resume
//! text into a loosely-typed candidate object.
//!
//! Two backends implement [`StructuredExtractor`]:
//! - `FunctionClient`: POSTs the request to a hosted extraction function.
//! - `LlmExtractor`: prompts the model through `LlmClient` directly.
//!
//! Neither retries. Retrying is a user action owned by the import session.

pub mod function_client;
pub mod llm;
pub mod prompts;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use function_client::FunctionClient;
pub use llm::LlmExtractor;

/// Request body sent to the extraction service.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub content: String,
    /// Always `"text"`: the service receives cleaned text, never the binary file.
    pub content_type: &'static str,
    pub file_name: String,
    pub user_id: Option<String>,
    pub is_example: bool,
    pub is_development: bool,
    pub extracted_email: Option<String>,
    pub extracted_phone: Option<String>,
}

impl ExtractionRequest {
    pub fn new(content: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: "text",
            file_name: file_name.into(),
            user_id: None,
            is_example: false,
            is_development: false,
            extracted_email: None,
            extracted_phone: None,
        }
    }
}

/// Untrusted service output. Any key may be missing, null, or the wrong shape;
/// `import::builder` is the only consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateResume(pub Value);

impl CandidateResume {
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Extraction function not found: {0}")]
    NotFound(String),

    #[error("Service returned no data")]
    EmptyResponse,

    #[error("Service returned malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Service reported an error: {0}")]
    Reported(String),

    #[error("LLM error: {0}")]
    Llm(#[from] crate::llm_client::LlmError),
}

impl ServiceError {
    /// True when the failure means the service itself is missing or down,
    /// as opposed to a failed analysis of this particular document.
    pub fn is_unavailable(&self) -> bool {
        match self {
            ServiceError::NotFound(_) => true,
            ServiceError::Status { status, message } => {
                *status == 503 || message.contains("Function not found")
            }
            ServiceError::Reported(message) => message.contains("Function not found"),
            _ => false,
        }
    }

    /// What the service said about this document, when it said anything.
    /// Transport and status failures carry no user-facing message.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            ServiceError::Reported(message) if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}

/// A backend able to turn cleaned resume text into a candidate object.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    async fn extract(&self, request: &ExtractionRequest) -> Result<CandidateResume, ServiceError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}
