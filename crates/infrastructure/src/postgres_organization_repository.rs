use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use qryvanta_application::OrganizationRepository;
use qryvanta_core::{AppError, AppResult, TenantId};
use qryvanta_domain::{NonEmptyString, Organization, OrganizationStatus};

/// PostgreSQL-backed repository for the organization aggregate.
#[derive(Clone)]
pub struct PostgresOrganizationRepository {
    pool: PgPool,
}

impl PostgresOrganizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: uuid::Uuid,
    name: String,
    status: String,
    deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn row_to_organization(row: OrganizationRow) -> AppResult<Organization> {
    let name = NonEmptyString::new(row.name)?;
    let status = OrganizationStatus::parse(row.status.as_str())?;
    Ok(Organization::from_parts(
        TenantId::from_uuid(row.id),
        name,
        status,
        row.deleted_at,
    ))
}

#[async_trait]
impl OrganizationRepository for PostgresOrganizationRepository {
    async fn insert(&self, organization: Organization) -> AppResult<Organization> {
        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, status)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(organization.id().as_uuid())
        .bind(organization.name())
        .bind(organization.status().as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to insert organization: {error}")))?;

        Ok(organization)
    }

    async fn find(&self, tenant_id: TenantId) -> AppResult<Option<Organization>> {
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

    async fn update(&self, organization: Organization) -> AppResult<Organization> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE organizations
            SET name = $2, status = $3, deleted_at = $4
            WHERE id = $1
            "#,
        )
        .bind(organization.id().as_uuid())
        .bind(organization.name())
        .bind(organization.status().as_str())
        .bind(organization.deleted_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to update organization: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "organization '{}' was not found",
                organization.id()
            )));
        }

        Ok(organization)
    }
}
