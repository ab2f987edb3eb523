use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, QueryBuilder};

use qryvanta_application::{AuditLogQuery, AuditRepository};
use qryvanta_core::{AppError, AppResult, TenantId};
use qryvanta_domain::{AuditEventType, AuditLog, AuditLogId};

/// PostgreSQL-backed append-only audit log store.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    occurred_at: DateTime<Utc>,
    event_type: String,
    actor: Option<String>,
    actor_email: Option<String>,
    resource_type: Option<String>,
    resource_id: Option<String>,
    action: String,
    decision: Option<String>,
    reason: Option<String>,
    request_data: serde_json::Value,
    response_data: serde_json::Value,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

fn row_to_audit_log(row: AuditLogRow) -> AppResult<AuditLog> {
    let event_type = AuditEventType::parse(row.event_type.as_str())?;
    Ok(AuditLog::new(
        AuditLogId::from_uuid(row.id),
        TenantId::from_uuid(row.tenant_id),
        row.occurred_at,
        event_type,
        row.actor,
        row.actor_email,
        row.resource_type,
        row.resource_id,
        row.action,
        row.decision,
        row.reason,
        row.request_data,
        row.response_data,
        row.ip_address,
        row.user_agent,
    ))
}

/// Appends the tenant and query filters shared by the listing and export
/// paths onto a `SELECT ... WHERE tenant_id = $1` builder.
fn push_query_filters<'a>(builder: &mut QueryBuilder<'a, sqlx::Postgres>, query: &'a AuditLogQuery) {
    if let Some(from) = query.from {
        builder.push(" AND occurred_at >= ").push_bind(from);
    }
    if let Some(to) = query.to {
        builder.push(" AND occurred_at < ").push_bind(to);
    }
    if let Some(actor) = query.actor.as_deref() {
        builder.push(" AND actor = ").push_bind(actor);
    }
    if let Some(resource_type) = query.resource_type.as_deref() {
        builder.push(" AND resource_type = ").push_bind(resource_type);
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append(&self, entry: AuditLog) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs
                (id, tenant_id, occurred_at, event_type, actor, actor_email, resource_type,
                 resource_id, action, decision, reason, request_data, response_data, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(entry.id().as_uuid())
        .bind(entry.tenant_id().as_uuid())
        .bind(entry.occurred_at())
        .bind(entry.event_type().as_str())
        .bind(entry.actor())
        .bind(entry.actor_email())
        .bind(entry.resource_type())
        .bind(entry.resource_id())
        .bind(entry.action())
        .bind(entry.decision())
        .bind(entry.reason())
        .bind(entry.request_data())
        .bind(entry.response_data())
        .bind(entry.ip_address())
        .bind(entry.user_agent())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to append audit entry: {error}")))?;

        Ok(())
    }

    async fn list_recent_entries(&self, tenant_id: TenantId, query: AuditLogQuery) -> AppResult<Vec<AuditLog>> {
        let mut builder = QueryBuilder::new(
            r#"
            SELECT id, tenant_id, occurred_at, event_type, actor, actor_email, resource_type,
                   resource_id, action, decision, reason, request_data, response_data, ip_address, user_agent
            FROM audit_logs
            WHERE tenant_id =
            "#,
        );
        builder.push_bind(tenant_id.as_uuid());
        push_query_filters(&mut builder, &query);
        builder.push(" ORDER BY occurred_at DESC LIMIT ").push_bind(i64::from(query.limit));

        let rows = builder
            .build_query_as::<AuditLogRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::StorageError(format!("failed to list audit entries: {error}")))?;

        rows.into_iter().map(row_to_audit_log).collect()
    }

    async fn export_entries(&self, tenant_id: TenantId, query: AuditLogQuery) -> AppResult<Vec<AuditLog>> {
        let mut builder = QueryBuilder::new(
            r#"
            SELECT id, tenant_id, occurred_at, event_type, actor, actor_email, resource_type,
                   resource_id, action, decision, reason, request_data, response_data, ip_address, user_agent
            FROM audit_logs
            WHERE tenant_id =
            "#,
        );
        builder.push_bind(tenant_id.as_uuid());
        push_query_filters(&mut builder, &query);
        builder.push(" ORDER BY occurred_at ASC LIMIT ").push_bind(i64::from(query.limit));

        let rows = builder
            .build_query_as::<AuditLogRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::StorageError(format!("failed to export audit entries: {error}")))?;

        rows.into_iter().map(row_to_audit_log).collect()
    }

    async fn purge_entries_older_than(&self, tenant_id: TenantId, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM audit_logs
            WHERE tenant_id = $1 AND occurred_at < $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to purge audit entries: {error}")))?
        .rows_affected();

        Ok(rows_affected)
    }
}
