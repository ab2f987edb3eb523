use qryvanta_core::{PrincipalId, TenantId};
use serde_json::Value;

/// A single authorization question, as received from the Identity &
/// Tenancy Gate.
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    /// Tenant the request is scoped to.
    pub tenant_id: TenantId,
    /// Stable external id of the requesting principal.
    pub principal: PrincipalId,
    /// Action being evaluated.
    pub action: String,
    /// Resource type being evaluated.
    pub resource_type: String,
    /// Resource id being evaluated.
    pub resource_id: String,
    /// Caller-supplied context passed through opaquely to the policy
    /// engine; does not contribute to the cache key (§4.4).
    pub context: Value,
}

/// The response handed back to callers, mirroring what is cached in
/// [`crate::two_tier_cache::CachedDecision`] plus the `degraded` flag.
#[derive(Debug, Clone)]
pub struct DecisionResponse {
    /// `"allow"`, `"deny"`, or `"error"` (§6, §7). An `"error"` decision
    /// still carries HTTP 200 at the API layer; only rate-limiting is a
    /// pre-evaluation hard reject.
    pub decision: String,
    /// Deterministic, human-readable reason string.
    pub reason: String,
    /// Roles that contributed to the decision.
    pub contributing_roles: Vec<String>,
    /// Permissions that contributed to the decision.
    pub contributing_permissions: Vec<String>,
    /// Set when the external policy engine was unreachable and the
    /// decision fell back to RBAC alone.
    pub degraded: bool,
    /// Whether this response was served from cache.
    pub from_cache: bool,
    /// Wall-clock time spent evaluating this request, in milliseconds.
    pub evaluation_time_ms: u64,
}

impl DecisionResponse {
    /// Whether access is granted. `false` for both `"deny"` and `"error"`.
    #[must_use]
    pub fn allowed(&self) -> bool {
        self.decision == "allow"
    }
}
