//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_rego_compiler_client;
mod in_memory_decision_cache;
mod in_memory_rate_limit_store;
mod jwks_bearer_verifier;
mod opa_policy_engine_client;
mod postgres_audit_repository;
mod postgres_organization_repository;
mod postgres_permission_repository;
mod postgres_policy_repository;
mod postgres_policy_version_repository;
mod postgres_rbac_repository;
mod postgres_role_permission_repository;
mod postgres_role_repository;
mod postgres_user_repository;
mod postgres_user_role_repository;
mod redis_decision_cache;
mod redis_rate_limit_repository;

pub use http_rego_compiler_client::HttpRegoCompilerClient;
pub use in_memory_decision_cache::InMemoryDecisionCache;
pub use in_memory_rate_limit_store::InMemoryRateLimitStore;
pub use jwks_bearer_verifier::JwksBearerVerifier;
pub use opa_policy_engine_client::OpaPolicyEngineClient;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_organization_repository::PostgresOrganizationRepository;
pub use postgres_permission_repository::PostgresPermissionRepository;
pub use postgres_policy_repository::PostgresPolicyRepository;
pub use postgres_policy_version_repository::PostgresPolicyVersionRepository;
pub use postgres_rbac_repository::PostgresRbacRepository;
pub use postgres_role_permission_repository::PostgresRolePermissionRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_user_repository::PostgresUserRepository;
pub use postgres_user_role_repository::PostgresUserRoleRepository;
pub use redis_decision_cache::RedisDecisionCache;
pub use redis_rate_limit_repository::RedisRateLimitRepository;
