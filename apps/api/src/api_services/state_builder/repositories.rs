use std::sync::Arc;

use qryvanta_application::{
    AuditRepository, IdentityRepository, OrganizationRepository, PermissionRepository,
    PolicyRepository, PolicyVersionRepository, RbacRepository, RolePermissionRepository,
    RoleRepository, UserRepository, UserRoleRepository,
};
use qryvanta_infrastructure::{
    PostgresAuditRepository, PostgresOrganizationRepository, PostgresPermissionRepository,
    PostgresPolicyRepository, PostgresPolicyVersionRepository, PostgresRbacRepository,
    PostgresRolePermissionRepository, PostgresRoleRepository, PostgresUserRepository,
    PostgresUserRoleRepository,
};
use sqlx::PgPool;

/// One repository per aggregate, all sharing the same pool. `user_repository`
/// and `identity_repository` wrap the same `PostgresUserRepository`: the
/// admin-mutation path and the authentication path use distinct, narrower
/// port traits over the one users table (§4.9 vs. identity gate).
pub(super) struct RepositorySet {
    pub(super) organizations: Arc<dyn OrganizationRepository>,
    pub(super) users: Arc<dyn UserRepository>,
    pub(super) identity: Arc<dyn IdentityRepository>,
    pub(super) roles: Arc<dyn RoleRepository>,
    pub(super) permissions: Arc<dyn PermissionRepository>,
    pub(super) role_permissions: Arc<dyn RolePermissionRepository>,
    pub(super) user_roles: Arc<dyn UserRoleRepository>,
    pub(super) rbac: Arc<dyn RbacRepository>,
    pub(super) policies: Arc<dyn PolicyRepository>,
    pub(super) policy_versions: Arc<dyn PolicyVersionRepository>,
    pub(super) audit: Arc<dyn AuditRepository>,
}

pub(super) fn build_repository_set(pool: &PgPool) -> RepositorySet {
    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));

    RepositorySet {
        organizations: Arc::new(PostgresOrganizationRepository::new(pool.clone())),
        users: user_repository.clone(),
        identity: user_repository,
        roles: Arc::new(PostgresRoleRepository::new(pool.clone())),
        permissions: Arc::new(PostgresPermissionRepository::new(pool.clone())),
        role_permissions: Arc::new(PostgresRolePermissionRepository::new(pool.clone())),
        user_roles: Arc::new(PostgresUserRoleRepository::new(pool.clone())),
        rbac: Arc::new(PostgresRbacRepository::new(pool.clone())),
        policies: Arc::new(PostgresPolicyRepository::new(pool.clone())),
        policy_versions: Arc::new(PostgresPolicyVersionRepository::new(pool.clone())),
        audit: Arc::new(PostgresAuditRepository::new(pool.clone())),
    }
}
