//! HTTP client for an external OPA-compatible policy decision endpoint.

use async_trait::async_trait;
use serde_json::json;

use qryvanta_application::{PolicyEngineClient, PolicyEngineRequest, PolicyEngineResponse};
use qryvanta_core::{AppError, AppResult};

/// Calls an OPA-style `POST {base_url}{policy_path}` decision endpoint with
/// `{"input": {...}}`, expecting `{"result": bool}` back.
#[derive(Clone)]
pub struct OpaPolicyEngineClient {
    http_client: reqwest::Client,
    decision_url: String,
}

impl OpaPolicyEngineClient {
    /// Creates a client against `base_url` + `policy_path` (e.g.
    /// `http://opa:8181` + `/v1/data/qryvanta/allow`).
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: &str, policy_path: &str) -> Self {
        Self {
            http_client,
            decision_url: format!("{}{policy_path}", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl PolicyEngineClient for OpaPolicyEngineClient {
    async fn evaluate(&self, request: &PolicyEngineRequest) -> AppResult<PolicyEngineResponse> {
        let body = json!({
            "input": {
                "tenant_id": request.tenant_id.to_string(),
                "principal": request.principal.to_string(),
                "action": request.action,
                "resource_type": request.resource_type,
                "resource_id": request.resource_id,
                "context": request.context,
                "rbac_decision": request.rbac_decision,
            }
        });

        let response = self
            .http_client
            .post(&self.decision_url)
            .json(&body)
            .send()
            .await
            .map_err(|error| AppError::DegradedDependency(format!("policy engine request failed: {error}")))?;

        if !response.status().is_success() {
            return Err(AppError::DegradedDependency(format!(
                "policy engine returned status {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|error| AppError::DegradedDependency(format!("policy engine returned malformed JSON: {error}")))?;

        let result = payload.get("result").and_then(serde_json::Value::as_bool);
        Ok(PolicyEngineResponse { result })
    }
}
