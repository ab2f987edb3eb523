use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use qryvanta_application::PermissionRepository;
use qryvanta_core::{AppError, AppResult, TenantId};
use qryvanta_domain::{Effect, Permission, PermissionId};

/// PostgreSQL-backed repository for the permission aggregate.
#[derive(Clone)]
pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
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
impl PermissionRepository for PostgresPermissionRepository {
    async fn insert(&self, permission: Permission) -> AppResult<Permission> {
        sqlx::query(
            r#"
            INSERT INTO permissions (id, org_id, name, resource_type, action, effect)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(permission.id().as_uuid())
        .bind(permission.org_id().as_uuid())
        .bind(permission.name())
        .bind(permission.resource_type())
        .bind(permission.action())
        .bind(permission.effect().as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| map_permission_conflict(error, permission.name()))?;

        Ok(permission)
    }

    async fn list(&self, tenant_id: TenantId) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, org_id, name, resource_type, action, effect
            FROM permissions
            WHERE org_id = $1
            ORDER BY name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to list permissions: {error}")))?;

        rows.into_iter().map(row_to_permission).collect()
    }

    async fn delete(&self, tenant_id: TenantId, permission_id: PermissionId) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM permissions
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to delete permission: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("permission '{permission_id}' was not found")));
        }

        Ok(())
    }
}

fn map_permission_conflict(error: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("permission '{name}' already exists"));
    }

    AppError::StorageError(format!("failed to persist permission: {error}"))
}
