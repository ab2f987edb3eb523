//! Application services and ports for the authorization platform: the
//! identity gate, RBAC evaluator, decision cache, optional policy engine,
//! policy lifecycle, audit recorder, rate limiter, mutation event bus, and
//! the admin services built on top of them.

#![forbid(unsafe_code)]

mod admin_service;
mod audit_recorder;
mod decision_service;
mod external_policy_adapter;
mod identity_gate_service;
mod mutation_event_bus;
mod policy_lifecycle_service;
mod rate_limiter_service;
mod rbac_evaluator;
mod two_tier_cache;

pub use admin_service::{
    AdminService, OrganizationRepository, PermissionRepository, RolePermissionRepository,
    RoleRepository, UserRepository, UserRoleRepository,
};
pub use audit_recorder::{
    to_csv_document, AuditLogQuery, AuditRecorder, AuditRecorderStats, AuditRepository,
    CSV_HEADER, DEFAULT_QUEUE_CAPACITY,
};
pub use decision_service::{DecisionRequest, DecisionResponse, DecisionService};
pub use external_policy_adapter::{
    ExternalPolicyAdapter, PolicyCompositionOutcome, PolicyEngineClient, PolicyEngineConfig,
    PolicyEngineRequest, PolicyEngineResponse,
};
pub use identity_gate_service::{
    BearerClaims, BearerVerifier, IdentityGateService, IdentityRepository,
    DEFAULT_CLOCK_SKEW_SECONDS, DEFAULT_JWKS_CACHE_TTL_SECONDS,
};
pub use mutation_event_bus::{MutationEvent, MutationEventBus, MutationEventSubscriber};
pub use policy_lifecycle_service::{
    denylist_violations, local_structural_check, PolicyLifecycleService, PolicyRepository,
    PolicyVersionRepository, RegoCompilerClient, DENYLISTED_IMPORTS,
};
pub use rate_limiter_service::{ConsumeOutcome, RateLimiterService, TokenBucketRule, TokenBucketStore};
pub use rbac_evaluator::{DecisionOutcome, RbacDecision, RbacEvaluator, RbacRepository};
pub use two_tier_cache::{
    fingerprint, tenant_prefix, CacheStats, CachedDecision, L1Cache, L2Cache, TwoTierDecisionCache,
};
