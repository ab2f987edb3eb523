use async_trait::async_trait;
use qryvanta_core::{AppResult, TenantId};
use qryvanta_domain::{Organization, User};

/// A verified bearer token's claims, already signature- and
/// expiry-checked by [`super::jwt::BearerVerifier`]. Only the fields the
/// gate needs to make a tenancy/provisioning decision survive to this
/// layer.
#[derive(Debug, Clone)]
pub struct BearerClaims {
    /// The stable subject claim (`sub`).
    pub subject: String,
    /// The email claim, if the issuer includes one — used for the
    /// by-email JIT lookup fallback.
    pub email: Option<String>,
    /// The tenant the token asserts (mapped from `iss`/a custom claim by
    /// the caller's JWKS configuration).
    pub tenant_id: TenantId,
}

/// Storage access the gate needs: organization lookup for the
/// suspended/deleted check, and user lookup/creation for JIT provisioning.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Loads the organization owning `tenant_id`.
    async fn find_organization(&self, tenant_id: TenantId) -> AppResult<Option<Organization>>;

    /// Finds a user by bearer subject within a tenant.
    async fn find_user_by_subject(&self, tenant_id: TenantId, subject: &str) -> AppResult<Option<User>>;

    /// Finds a user by email within a tenant (JIT fallback lookup).
    async fn find_user_by_email(&self, tenant_id: TenantId, email: &str) -> AppResult<Option<User>>;

    /// Persists a newly provisioned or newly-bound user.
    async fn upsert_user(&self, user: User) -> AppResult<User>;

    /// Resolves an API key to its bound tenant, if the key is recognized.
    async fn resolve_api_key(&self, api_key: &str) -> AppResult<Option<TenantId>>;
}
