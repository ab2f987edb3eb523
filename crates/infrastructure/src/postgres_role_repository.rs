use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use qryvanta_application::RoleRepository;
use qryvanta_core::{AppError, AppResult, TenantId};
use qryvanta_domain::{Role, RoleId};

/// PostgreSQL-backed repository for the role aggregate.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
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

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn insert(&self, role: Role) -> AppResult<Role> {
        sqlx::query(
            r#"
            INSERT INTO roles (id, org_id, name, display_name, parent_id, level, is_system)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.org_id().as_uuid())
        .bind(role.name())
        .bind(role.display_name())
        .bind(role.parent_id().map(|id| id.as_uuid()))
        .bind(i16::from(role.level()))
        .bind(role.is_system())
        .execute(&self.pool)
        .await
        .map_err(|error| map_role_conflict(error, role.name()))?;

        Ok(role)
    }

    async fn find(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, org_id, name, display_name, parent_id, level, is_system
            FROM roles
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to find role: {error}")))?;

        row.map(row_to_role).transpose()
    }

    async fn list(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, org_id, name, display_name, parent_id, level, is_system
            FROM roles
            WHERE org_id = $1
            ORDER BY level, name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(row_to_role).collect()
    }

    async fn update(&self, role: Role) -> AppResult<Role> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE roles
            SET name = $3, display_name = $4
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(role.org_id().as_uuid())
        .bind(role.id().as_uuid())
        .bind(role.name())
        .bind(role.display_name())
        .execute(&self.pool)
        .await
        .map_err(|error| map_role_conflict(error, role.name()))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("role '{}' was not found", role.id())));
        }

        Ok(role)
    }

    async fn delete(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM roles
            WHERE org_id = $1 AND id = $2 AND is_system = false
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to delete role: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        Ok(())
    }
}

fn map_role_conflict(error: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("role '{name}' already exists"));
    }

    AppError::StorageError(format!("failed to persist role: {error}"))
}
