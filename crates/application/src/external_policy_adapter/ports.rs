use async_trait::async_trait;
use qryvanta_core::{AppResult, PrincipalId, TenantId};
use serde_json::Value;

/// The structured document sent to the external decision endpoint.
#[derive(Debug, Clone)]
pub struct PolicyEngineRequest {
    /// Tenant the decision is scoped to.
    pub tenant_id: TenantId,
    /// External principal id of the subject.
    pub principal: PrincipalId,
    /// Action being evaluated.
    pub action: String,
    /// Resource type being evaluated.
    pub resource_type: String,
    /// Resource id being evaluated.
    pub resource_id: String,
    /// Caller-supplied context, passed through opaquely.
    pub context: Value,
    /// The RBAC evaluator's candidate decision, included so the remote
    /// policy can see and/or override it.
    pub rbac_decision: bool,
}

/// The engine's answer. `result = None` must be treated as deny (§6).
#[derive(Debug, Clone)]
pub struct PolicyEngineResponse {
    /// The boolean decision, if the engine returned one.
    pub result: Option<bool>,
}

/// A single call to the external policy engine. Implementations perform
/// exactly one attempt; retry/backoff orchestration lives in
/// [`super::service::ExternalPolicyAdapter`] so that only transport errors
/// (this trait's `Err` case) are retried, never decision-bearing responses.
#[async_trait]
pub trait PolicyEngineClient: Send + Sync {
    /// Sends `request` to the configured decision endpoint.
    async fn evaluate(&self, request: &PolicyEngineRequest) -> AppResult<PolicyEngineResponse>;
}
