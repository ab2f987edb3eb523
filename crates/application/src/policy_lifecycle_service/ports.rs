use async_trait::async_trait;
use qryvanta_core::{AppResult, TenantId};
use qryvanta_domain::{Policy, PolicyId, PolicyVersion};

/// Storage for policy metadata and the state-machine-governed lifecycle.
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Finds a policy by id within its owning tenant.
    async fn find(&self, tenant_id: TenantId, policy_id: PolicyId) -> AppResult<Option<Policy>>;

    /// Lists all policies for a tenant.
    async fn list(&self, tenant_id: TenantId) -> AppResult<Vec<Policy>>;

    /// Inserts a newly created policy.
    async fn insert(&self, policy: Policy) -> AppResult<Policy>;

    /// Persists a mutated policy (version advance, publish, archive).
    async fn update(&self, policy: Policy) -> AppResult<Policy>;
}

/// Storage for immutable, content-addressed policy versions.
#[async_trait]
pub trait PolicyVersionRepository: Send + Sync {
    /// Inserts a newly created version.
    async fn insert(&self, version: PolicyVersion) -> AppResult<PolicyVersion>;

    /// Persists a mutated version (validation outcome, publish timestamp).
    async fn update(&self, version: PolicyVersion) -> AppResult<PolicyVersion>;

    /// Finds the version a policy's `current_version` points at.
    async fn find_current(&self, policy_id: PolicyId, version: u32) -> AppResult<Option<PolicyVersion>>;

    /// Lists every version recorded for a policy, oldest first.
    async fn list(&self, policy_id: PolicyId) -> AppResult<Vec<PolicyVersion>>;
}

/// Delegated syntactic/semantic Rego check against an external compiler
/// endpoint (§4.5 step 3). Transport failure is the caller's cue to fall
/// back to [`super::validator::local_structural_check`].
#[async_trait]
pub trait RegoCompilerClient: Send + Sync {
    /// Submits `content` for compilation; `Ok(errors)` carries zero or
    /// more semantic error messages (empty means it compiled cleanly).
    async fn compile(&self, content: &str) -> AppResult<Vec<String>>;
}
