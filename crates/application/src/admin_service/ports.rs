use async_trait::async_trait;
use qryvanta_core::{AppResult, TenantId};
use qryvanta_domain::{
    Organization, Permission, Role, RoleId, RolePermission, RolePermissionId, User, UserId,
    UserRole, UserRoleId,
};

/// Storage access for the organization aggregate (§4.9).
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Persists a newly created organization.
    async fn insert(&self, organization: Organization) -> AppResult<Organization>;

    /// Loads an organization by id.
    async fn find(&self, tenant_id: TenantId) -> AppResult<Option<Organization>>;

    /// Persists a status or attribute change to an existing organization.
    async fn update(&self, organization: Organization) -> AppResult<Organization>;
}

/// Storage access for the user aggregate (§4.9), distinct from
/// [`crate::identity_gate_service::IdentityRepository`]'s narrower
/// authentication-path lookups.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persists a newly created user.
    async fn insert(&self, user: User) -> AppResult<User>;

    /// Loads a user by internal id, scoped to its owning tenant.
    async fn find(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Option<User>>;

    /// Lists all users in a tenant.
    async fn list(&self, tenant_id: TenantId) -> AppResult<Vec<User>>;

    /// Persists a status or attribute change to an existing user.
    async fn update(&self, user: User) -> AppResult<User>;
}

/// Storage access for the role aggregate (§4.9).
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Persists a newly created role.
    async fn insert(&self, role: Role) -> AppResult<Role>;

    /// Loads a role by id, scoped to its owning tenant.
    async fn find(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Lists all roles in a tenant.
    async fn list(&self, tenant_id: TenantId) -> AppResult<Vec<Role>>;

    /// Persists a rename or other attribute change to an existing role.
    async fn update(&self, role: Role) -> AppResult<Role>;

    /// Deletes a role. Callers must reject this for system roles before
    /// calling, per the "system roles immutable & undeletable" invariant.
    async fn delete(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<()>;
}

/// Storage access for the permission aggregate (§4.9).
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Persists a newly created permission.
    async fn insert(&self, permission: Permission) -> AppResult<Permission>;

    /// Lists all permissions in a tenant.
    async fn list(&self, tenant_id: TenantId) -> AppResult<Vec<Permission>>;

    /// Deletes a permission, cascading any role-permission edges that
    /// reference it.
    async fn delete(&self, tenant_id: TenantId, permission_id: qryvanta_domain::PermissionId) -> AppResult<()>;
}

/// Storage access for role-permission edges (§4.9).
#[async_trait]
pub trait RolePermissionRepository: Send + Sync {
    /// Grants a permission to a role.
    async fn insert(&self, edge: RolePermission) -> AppResult<RolePermission>;

    /// Revokes a previously granted edge.
    async fn delete(&self, edge_id: RolePermissionId) -> AppResult<()>;

    /// Lists the edges granted to a role.
    async fn list_for_role(&self, role_id: RoleId) -> AppResult<Vec<RolePermission>>;
}

/// Storage access for user-role assignments (§4.9).
#[async_trait]
pub trait UserRoleRepository: Send + Sync {
    /// Assigns a role to a user.
    async fn insert(&self, assignment: UserRole) -> AppResult<UserRole>;

    /// Revokes a previously granted assignment.
    async fn delete(&self, assignment_id: UserRoleId) -> AppResult<()>;

    /// Lists the assignments held by a user.
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<UserRole>>;
}
