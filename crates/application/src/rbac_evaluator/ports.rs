use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qryvanta_core::{AppResult, TenantId};
use qryvanta_domain::{Permission, Role, RoleId, User, UserId, UserRole};

/// Repository port read by the RBAC evaluator. Kept read-only and narrow:
/// the evaluator never mutates the data model.
#[async_trait]
pub trait RbacRepository: Send + Sync {
    /// Resolves a user by `(tenant, external id)`, per §4.2 step 1.
    async fn find_user_by_external_id(
        &self,
        tenant_id: TenantId,
        external_id: &str,
    ) -> AppResult<Option<User>>;

    /// Lists the user-role assignments for `user_id`. Expiry is filtered by
    /// the caller against `now`; this may return already-expired rows so the
    /// evaluator can apply the boundary rule uniformly regardless of clock
    /// skew between the repository and the evaluating process.
    async fn list_user_roles(&self, user_id: UserId) -> AppResult<Vec<UserRole>>;

    /// Loads a role by id, used to walk the hierarchy toward the root.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Loads the permissions granted directly to `role_id` (not including
    /// ancestors; the evaluator performs closure itself).
    async fn list_role_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>>;
}

/// Returns the current instant; split out so tests can freeze time without
/// touching the repository trait.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
