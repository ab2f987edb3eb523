use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use qryvanta_application::PolicyVersionRepository;
use qryvanta_core::{AppError, AppResult};
use qryvanta_domain::{PolicyId, PolicyVersion, PolicyVersionId, ValidationStatus};

/// PostgreSQL-backed repository for immutable, content-addressed policy
/// versions.
#[derive(Clone)]
pub struct PostgresPolicyVersionRepository {
    pool: PgPool,
}

impl PostgresPolicyVersionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PolicyVersionRow {
    id: uuid::Uuid,
    policy_id: uuid::Uuid,
    version: i64,
    content: String,
    checksum: String,
    validation_status: String,
    validation_errors: Option<Vec<String>>,
    published_at: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
}

fn row_to_policy_version(row: PolicyVersionRow) -> AppResult<PolicyVersion> {
    let validation_status = ValidationStatus::parse(row.validation_status.as_str())?;
    let version = u32::try_from(row.version).map_err(|_| {
        AppError::StorageError(format!("invalid stored version number for policy version '{}'", row.id))
    })?;

    Ok(PolicyVersion::from_parts(
        PolicyVersionId::from_uuid(row.id),
        PolicyId::from_uuid(row.policy_id),
        version,
        row.content,
        row.checksum,
        validation_status,
        row.validation_errors,
        row.published_at,
        row.created_at,
    ))
}

#[async_trait]
impl PolicyVersionRepository for PostgresPolicyVersionRepository {
    async fn insert(&self, version: PolicyVersion) -> AppResult<PolicyVersion> {
        sqlx::query(
            r#"
            INSERT INTO policy_versions
                (id, policy_id, version, content, checksum, validation_status, validation_errors, published_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(version.id().as_uuid())
        .bind(version.policy_id().as_uuid())
        .bind(i64::from(version.version()))
        .bind(version.content())
        .bind(version.checksum())
        .bind(version.validation_status().as_str())
        .bind(version.validation_errors())
        .bind(version.published_at())
        .bind(version.created_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to insert policy version: {error}")))?;

        Ok(version)
    }

    async fn update(&self, version: PolicyVersion) -> AppResult<PolicyVersion> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE policy_versions
            SET validation_status = $3, validation_errors = $4, published_at = $5
            WHERE policy_id = $1 AND id = $2
            "#,
        )
        .bind(version.policy_id().as_uuid())
        .bind(version.id().as_uuid())
        .bind(version.validation_status().as_str())
        .bind(version.validation_errors())
        .bind(version.published_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to update policy version: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "policy version '{}' was not found",
                version.id().as_uuid()
            )));
        }

        Ok(version)
    }

    async fn find_current(&self, policy_id: PolicyId, version: u32) -> AppResult<Option<PolicyVersion>> {
        let row = sqlx::query_as::<_, PolicyVersionRow>(
            r#"
            SELECT id, policy_id, version, content, checksum, validation_status, validation_errors, published_at, created_at
            FROM policy_versions
            WHERE policy_id = $1 AND version = $2
            "#,
        )
        .bind(policy_id.as_uuid())
        .bind(i64::from(version))
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to find current policy version: {error}")))?;

        row.map(row_to_policy_version).transpose()
    }

    async fn list(&self, policy_id: PolicyId) -> AppResult<Vec<PolicyVersion>> {
        let rows = sqlx::query_as::<_, PolicyVersionRow>(
            r#"
            SELECT id, policy_id, version, content, checksum, validation_status, validation_errors, published_at, created_at
            FROM policy_versions
            WHERE policy_id = $1
            ORDER BY version
            "#,
        )
        .bind(policy_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to list policy versions: {error}")))?;

        rows.into_iter().map(row_to_policy_version).collect()
    }
}
