use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::prompts::{render_extract_prompt, RESUME_EXTRACT_SYSTEM};
use super::{CandidateResume, ExtractionRequest, ServiceError, StructuredExtractor};
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};
use crate::llm_client::LlmClient;

/// Extraction backend that prompts the model directly.
#[derive(Clone)]
pub struct LlmExtractor {
    llm: LlmClient,
}

impl LlmExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl StructuredExtractor for LlmExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<CandidateResume, ServiceError> {
        let system = format!("{RESUME_EXTRACT_SYSTEM} {NO_INVENTION_INSTRUCTION} {JSON_ONLY_SYSTEM}");
        let prompt = render_extract_prompt(
            &request.content,
            &request.file_name,
            request.extracted_email.as_deref(),
            request.extracted_phone.as_deref(),
        );

        debug!(prompt_chars = prompt.len(), "Requesting resume extraction from LLM");

        let value: Value = self.llm.call_json(&prompt, &system).await?;
        if value.is_null() {
            return Err(ServiceError::EmptyResponse);
        }
        Ok(CandidateResume(value))
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}
