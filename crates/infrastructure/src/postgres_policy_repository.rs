use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use qryvanta_application::PolicyRepository;
use qryvanta_core::{AppError, AppResult, TenantId};
use qryvanta_domain::{Policy, PolicyId, PolicyStatus, PolicyType};

/// PostgreSQL-backed repository for policy metadata and lifecycle state.
#[derive(Clone)]
pub struct PostgresPolicyRepository {
    pool: PgPool,
}

impl PostgresPolicyRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PolicyRow {
    id: uuid::Uuid,
    org_id: uuid::Uuid,
    name: String,
    display_name: String,
    policy_type: String,
    status: String,
    current_version: i64,
}

fn row_to_policy(row: PolicyRow) -> AppResult<Policy> {
    let policy_type = PolicyType::parse(row.policy_type.as_str())?;
    let status = PolicyStatus::parse(row.status.as_str())?;
    let current_version = u32::try_from(row.current_version).map_err(|_| {
        AppError::StorageError(format!("invalid stored policy version for policy '{}'", row.id))
    })?;

    Ok(Policy::from_parts(
        PolicyId::from_uuid(row.id),
        TenantId::from_uuid(row.org_id),
        row.name,
        row.display_name,
        policy_type,
        status,
        current_version,
    ))
}

#[async_trait]
impl PolicyRepository for PostgresPolicyRepository {
    async fn find(&self, tenant_id: TenantId, policy_id: PolicyId) -> AppResult<Option<Policy>> {
        let row = sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT id, org_id, name, display_name, policy_type, status, current_version
            FROM policies
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(policy_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to find policy: {error}")))?;

        row.map(row_to_policy).transpose()
    }

    async fn list(&self, tenant_id: TenantId) -> AppResult<Vec<Policy>> {
        let rows = sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT id, org_id, name, display_name, policy_type, status, current_version
            FROM policies
            WHERE org_id = $1
            ORDER BY name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to list policies: {error}")))?;

        rows.into_iter().map(row_to_policy).collect()
    }

    async fn insert(&self, policy: Policy) -> AppResult<Policy> {
        sqlx::query(
            r#"
            INSERT INTO policies (id, org_id, name, display_name, policy_type, status, current_version)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(policy.id().as_uuid())
        .bind(policy.org_id().as_uuid())
        .bind(policy.name())
        .bind(policy.display_name())
        .bind(policy.policy_type().as_str())
        .bind(policy.status().as_str())
        .bind(i64::from(policy.current_version()))
        .execute(&self.pool)
        .await
        .map_err(|error| map_policy_conflict(error, policy.name()))?;

        Ok(policy)
    }

    async fn update(&self, policy: Policy) -> AppResult<Policy> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE policies
            SET display_name = $3, status = $4, current_version = $5
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(policy.org_id().as_uuid())
        .bind(policy.id().as_uuid())
        .bind(policy.display_name())
        .bind(policy.status().as_str())
        .bind(i64::from(policy.current_version()))
        .execute(&self.pool)
        .await
        .map_err(|error| map_policy_conflict(error, policy.name()))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("policy '{}' was not found", policy.id())));
        }

        Ok(policy)
    }
}

fn map_policy_conflict(error: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("policy '{name}' already exists"));
    }

    AppError::StorageError(format!("failed to persist policy: {error}"))
}
