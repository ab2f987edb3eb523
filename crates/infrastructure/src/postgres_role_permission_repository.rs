use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use qryvanta_application::RolePermissionRepository;
use qryvanta_core::{AppError, AppResult};
use qryvanta_domain::{PermissionId, RoleId, RolePermission, RolePermissionId};

/// PostgreSQL-backed repository for the role-to-permission grant join table.
#[derive(Clone)]
pub struct PostgresRolePermissionRepository {
    pool: PgPool,
}

impl PostgresRolePermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RolePermissionRow {
    id: uuid::Uuid,
    role_id: uuid::Uuid,
    permission_id: uuid::Uuid,
}

fn row_to_role_permission(row: RolePermissionRow) -> RolePermission {
    RolePermission::new(
        RolePermissionId::from_uuid(row.id),
        RoleId::from_uuid(row.role_id),
        PermissionId::from_uuid(row.permission_id),
    )
}

#[async_trait]
impl RolePermissionRepository for PostgresRolePermissionRepository {
    async fn insert(&self, role_permission: RolePermission) -> AppResult<RolePermission> {
        sqlx::query(
            r#"
            INSERT INTO role_permissions (id, role_id, permission_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(role_permission.id().as_uuid())
        .bind(role_permission.role_id().as_uuid())
        .bind(role_permission.permission_id().as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to grant permission to role: {error}")))?;

        Ok(role_permission)
    }

    async fn delete(&self, role_permission_id: RolePermissionId) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM role_permissions
            WHERE id = $1
            "#,
        )
        .bind(role_permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to revoke permission from role: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "role permission grant '{}' was not found",
                role_permission_id.as_uuid()
            )));
        }

        Ok(())
    }

    async fn list_for_role(&self, role_id: RoleId) -> AppResult<Vec<RolePermission>> {
        let rows = sqlx::query_as::<_, RolePermissionRow>(
            r#"
            SELECT id, role_id, permission_id
            FROM role_permissions
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to list role permissions: {error}")))?;

        Ok(rows.into_iter().map(row_to_role_permission).collect())
    }
}
