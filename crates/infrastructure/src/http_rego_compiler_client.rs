//! HTTP client for a delegated Rego syntactic/semantic compile check.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use qryvanta_application::RegoCompilerClient;
use qryvanta_core::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct CompileResponse {
    #[serde(default)]
    errors: Vec<String>,
}

/// Submits policy content to a remote Rego compile endpoint, returning the
/// semantic errors it reports (empty means the content compiled cleanly).
#[derive(Clone)]
pub struct HttpRegoCompilerClient {
    http_client: reqwest::Client,
    compile_url: String,
}

impl HttpRegoCompilerClient {
    /// Creates a client against the given compile endpoint URL.
    #[must_use]
    pub fn new(http_client: reqwest::Client, compile_url: impl Into<String>) -> Self {
        Self {
            http_client,
            compile_url: compile_url.into(),
        }
    }
}

#[async_trait]
impl RegoCompilerClient for HttpRegoCompilerClient {
    async fn compile(&self, content: &str) -> AppResult<Vec<String>> {
        let response = self
            .http_client
            .post(&self.compile_url)
            .json(&json!({ "content": content }))
            .send()
            .await
            .map_err(|error| AppError::DegradedDependency(format!("rego compiler request failed: {error}")))?;

        if !response.status().is_success() {
            return Err(AppError::DegradedDependency(format!(
                "rego compiler returned status {}",
                response.status()
            )));
        }

        let payload: CompileResponse = response
            .json()
            .await
            .map_err(|error| AppError::DegradedDependency(format!("rego compiler returned malformed JSON: {error}")))?;

        Ok(payload.errors)
    }
}
