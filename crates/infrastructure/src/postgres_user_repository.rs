//! PostgreSQL-backed user repository, serving both the admin surface's
//! write path and the identity gate's authentication-path lookups.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use qryvanta_application::{IdentityRepository, UserRepository};
use qryvanta_core::{AppError, AppResult, TenantId};
use qryvanta_domain::{EmailAddress, NonEmptyString, Organization, OrganizationStatus, User, UserId, UserStatus};

/// PostgreSQL-backed repository for the user aggregate. Implements both
/// [`UserRepository`] (admin CRUD) and [`IdentityRepository`] (the narrower
/// authentication-path lookups), since both read and write the same `users`
/// table.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
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
struct OrganizationRow {
    id: uuid::Uuid,
    name: String,
    status: String,
    deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn row_to_organization(row: OrganizationRow) -> AppResult<Organization> {
    Ok(Organization::from_parts(
        TenantId::from_uuid(row.id),
        NonEmptyString::new(row.name)?,
        OrganizationStatus::parse(row.status.as_str())?,
        row.deleted_at,
    ))
}

fn map_user_conflict(error: sqlx::Error, email: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("user with email '{email}' already exists"));
    }

    AppError::StorageError(format!("failed to persist user: {error}"))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: User) -> AppResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, org_id, email, username, external_identity_id, bearer_subject, status, last_synced_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.org_id().as_uuid())
        .bind(user.email())
        .bind(user.username())
        .bind(user.external_identity_id())
        .bind(user.bearer_subject())
        .bind(user.status().as_str())
        .bind(user.last_synced_at())
        .execute(&self.pool)
        .await
        .map_err(|error| map_user_conflict(error, user.email()))?;

        Ok(user)
    }

    async fn find(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, org_id, email, username, external_identity_id, bearer_subject, status, last_synced_at
            FROM users
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to find user: {error}")))?;

        row.map(row_to_user).transpose()
    }

    async fn list(&self, tenant_id: TenantId) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, org_id, email, username, external_identity_id, bearer_subject, status, last_synced_at
            FROM users
            WHERE org_id = $1
            ORDER BY email
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to list users: {error}")))?;

        rows.into_iter().map(row_to_user).collect()
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE users
            SET email = $3,
                username = $4,
                external_identity_id = $5,
                bearer_subject = $6,
                status = $7,
                last_synced_at = $8
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(user.org_id().as_uuid())
        .bind(user.id().as_uuid())
        .bind(user.email())
        .bind(user.username())
        .bind(user.external_identity_id())
        .bind(user.bearer_subject())
        .bind(user.status().as_str())
        .bind(user.last_synced_at())
        .execute(&self.pool)
        .await
        .map_err(|error| map_user_conflict(error, user.email()))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("user '{}' was not found", user.id())));
        }

        Ok(user)
    }
}

#[async_trait]
impl IdentityRepository for PostgresUserRepository {
    async fn find_organization(&self, tenant_id: TenantId) -> AppResult<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, status, deleted_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to find organization: {error}")))?;

        row.map(row_to_organization).transpose()
    }

    async fn find_user_by_subject(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, org_id, email, username, external_identity_id, bearer_subject, status, last_synced_at
            FROM users
            WHERE org_id = $1 AND bearer_subject = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to find user by subject: {error}")))?;

        row.map(row_to_user).transpose()
    }

    async fn find_user_by_email(&self, tenant_id: TenantId, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, org_id, email, username, external_identity_id, bearer_subject, status, last_synced_at
            FROM users
            WHERE org_id = $1 AND email = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to find user by email: {error}")))?;

        row.map(row_to_user).transpose()
    }

    async fn upsert_user(&self, user: User) -> AppResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, org_id, email, username, external_identity_id, bearer_subject, status, last_synced_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE
            SET external_identity_id = EXCLUDED.external_identity_id,
                bearer_subject = EXCLUDED.bearer_subject,
                last_synced_at = EXCLUDED.last_synced_at
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.org_id().as_uuid())
        .bind(user.email())
        .bind(user.username())
        .bind(user.external_identity_id())
        .bind(user.bearer_subject())
        .bind(user.status().as_str())
        .bind(user.last_synced_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to upsert user: {error}")))?;

        Ok(user)
    }

    async fn resolve_api_key(&self, api_key: &str) -> AppResult<Option<TenantId>> {
        let tenant_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT org_id
            FROM api_keys
            WHERE key = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to resolve api key: {error}")))?;

        Ok(tenant_id.map(TenantId::from_uuid))
    }
}
