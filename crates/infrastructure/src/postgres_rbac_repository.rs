use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use qryvanta_application::RbacRepository;
use qryvanta_core::{AppError, AppResult, TenantId};
use qryvanta_domain::{EmailAddress, Effect, Permission, PermissionId, Role, RoleId, User, UserId, UserRole, UserRoleId, UserStatus};
use qryvanta_domain::ResourceScope;

/// Read-only PostgreSQL repository backing the RBAC evaluator's hot path.
#[derive(Clone)]
pub struct PostgresRbacRepository {
    pool: PgPool,
}

impl PostgresRbacRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: uuid::Uuid,
    org_id: uuid::Uuid,
    email: String,
    username: Option<String>,
    external_identity_id: Option<String>,
    bearer_subject: Option<String>,
    status: String,
    last_synced_at: chrono::DateTime<chrono::Utc>,
}

fn row_to_user(row: UserRow) -> AppResult<User> {
    let email = EmailAddress::new(row.email)?;
    let status = UserStatus::parse(row.status.as_str())?;
    Ok(User::from_parts(
        UserId::from_uuid(row.id),
        TenantId::from_uuid(row.org_id),
        email,
        row.username,
        row.external_identity_id,
        row.bearer_subject,
        status,
        row.last_synced_at,
    ))
}

#[derive(Debug, FromRow)]
struct UserRoleRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    role_id: uuid::Uuid,
    resource_type: Option<String>,
    resource_id: Option<String>,
    granted_by: Option<uuid::Uuid>,
    granted_at: chrono::DateTime<chrono::Utc>,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn row_to_user_role(row: UserRoleRow) -> AppResult<UserRole> {
    let scope = ResourceScope::from_optional(row.resource_type, row.resource_id)?;
    Ok(UserRole::new(
        UserRoleId::from_uuid(row.id),
        UserId::from_uuid(row.user_id),
        RoleId::from_uuid(row.role_id),
        scope,
        row.granted_by.map(UserId::from_uuid),
        row.granted_at,
        row.expires_at,
    ))
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: uuid::Uuid,
    org_id: uuid::Uuid,
    name: String,
    display_name: String,
    parent_id: Option<uuid::Uuid>,
    level: i16,
    is_system: bool,
}

fn row_to_role(row: RoleRow) -> AppResult<Role> {
    let level = u8::try_from(row.level).map_err(|_| {
        AppError::StorageError(format!("invalid stored role level '{}' for role '{}'", row.level, row.id))
    })?;

    Ok(Role::from_parts(
        RoleId::from_uuid(row.id),
        TenantId::from_uuid(row.org_id),
        row.name,
        row.display_name,
        row.parent_id.map(RoleId::from_uuid),
        level,
        row.is_system,
    ))
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: uuid::Uuid,
    org_id: uuid::Uuid,
    name: String,
    resource_type: String,
    action: String,
    effect: String,
}

fn row_to_permission(row: PermissionRow) -> AppResult<Permission> {
    let effect = Effect::parse(row.effect.as_str())?;
    Ok(Permission::from_parts(
        PermissionId::from_uuid(row.id),
        TenantId::from_uuid(row.org_id),
        row.name,
        row.resource_type,
        row.action,
        effect,
    ))
}

#[async_trait]
impl RbacRepository for PostgresRbacRepository {
    async fn find_user_by_external_id(
        &self,
        tenant_id: TenantId,
        external_id: &str,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, org_id, email, username, external_identity_id, bearer_subject, status, last_synced_at
            FROM users
            WHERE org_id = $1 AND external_identity_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to find user by external id: {error}")))?;

        row.map(row_to_user).transpose()
    }

    async fn list_user_roles(&self, user_id: UserId) -> AppResult<Vec<UserRole>> {
        let rows = sqlx::query_as::<_, UserRoleRow>(
            r#"
            SELECT id, user_id, role_id, resource_type, resource_id, granted_by, granted_at, expires_at
            FROM user_roles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to list user roles: {error}")))?;

        rows.into_iter().map(row_to_user_role).collect()
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, org_id, name, display_name, parent_id, level, is_system
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to find role: {error}")))?;

        row.map(row_to_role).transpose()
    }

    async fn list_role_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT p.id, p.org_id, p.name, p.resource_type, p.action, p.effect
            FROM permissions p
            INNER JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to list role permissions: {error}")))?;

        rows.into_iter().map(row_to_permission).collect()
    }
}
