use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use qryvanta_application::UserRoleRepository;
use qryvanta_core::{AppError, AppResult};
use qryvanta_domain::{ResourceScope, RoleId, UserId, UserRole, UserRoleId};

/// PostgreSQL-backed repository for the user-to-role grant join table.
#[derive(Clone)]
pub struct PostgresUserRoleRepository {
    pool: PgPool,
}

impl PostgresUserRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
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

#[async_trait]
impl UserRoleRepository for PostgresUserRoleRepository {
    async fn insert(&self, user_role: UserRole) -> AppResult<UserRole> {
        let (resource_type, resource_id) = user_role.scope().clone().into_optional();

        sqlx::query(
            r#"
            INSERT INTO user_roles
                (id, user_id, role_id, resource_type, resource_id, granted_by, granted_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user_role.id().as_uuid())
        .bind(user_role.user_id().as_uuid())
        .bind(user_role.role_id().as_uuid())
        .bind(resource_type)
        .bind(resource_id)
        .bind(user_role.granted_by().map(|id| id.as_uuid()))
        .bind(user_role.granted_at())
        .bind(user_role.expires_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to grant role to user: {error}")))?;

        Ok(user_role)
    }

    async fn delete(&self, user_role_id: UserRoleId) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM user_roles
            WHERE id = $1
            "#,
        )
        .bind(user_role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to revoke role from user: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "user role grant '{}' was not found",
                user_role_id.as_uuid()
            )));
        }

        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<UserRole>> {
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
}
