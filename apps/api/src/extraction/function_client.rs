//! HTTP client for a hosted resume-extraction function.
//!
//! One POST per parse, no retries. The response body is interpreted by a pure
//! function so every failure shape maps to a `ServiceError` deterministically.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{CandidateResume, ExtractionRequest, ServiceError, StructuredExtractor};

#[derive(Clone)]
pub struct FunctionClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl FunctionClient {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl StructuredExtractor for FunctionClient {
    async fn extract(&self, request: &ExtractionRequest) -> Result<CandidateResume, ServiceError> {
        let mut call = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key).header("apikey", key);
        }

        let response = call.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(
            status,
            body_len = body.len(),
            "Extraction function responded"
        );

        interpret_response(status, &body, &self.endpoint)
    }

    fn backend(&self) -> &'static str {
        "function"
    }
}

/// Maps a raw function response onto the candidate or a typed failure.
fn interpret_response(
    status: u16,
    body: &str,
    endpoint: &str,
) -> Result<CandidateResume, ServiceError> {
    if status == 404 {
        return Err(ServiceError::NotFound(endpoint.to_string()));
    }

    if !(200..300).contains(&status) {
        let message = error_message(body).unwrap_or_else(|| body.trim().to_string());
        return Err(ServiceError::Status { status, message });
    }

    if body.trim().is_empty() {
        return Err(ServiceError::EmptyResponse);
    }

    let value: Value = serde_json::from_str(body)?;
    if value.is_null() {
        return Err(ServiceError::EmptyResponse);
    }
    if let Some(message) = reported_error(&value) {
        return Err(ServiceError::Reported(message));
    }

    Ok(CandidateResume(value))
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    reported_error(&value).or_else(|| {
        value
            .get("message")
            .and_then(Value::as_str)
            .map(String::from)
    })
}

/// `{"error": "..."}` or `{"error": {"message": "..."}}`. A null error is not one.
fn reported_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) => Some(message.clone()),
        Value::Object(obj) => Some(
            obj.get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        ),
        other => Some(other.to_string()),
    }
}
