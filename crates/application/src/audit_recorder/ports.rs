use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qryvanta_core::{AppResult, TenantId};
use qryvanta_domain::AuditLog;

/// A bounded window for listing or exporting audit entries.
#[derive(Debug, Clone)]
pub struct AuditLogQuery {
    /// Only entries at or after this timestamp.
    pub from: Option<DateTime<Utc>>,
    /// Only entries strictly before this timestamp.
    pub to: Option<DateTime<Utc>>,
    /// Only entries for this actor, if set.
    pub actor: Option<String>,
    /// Only entries for this resource type, if set.
    pub resource_type: Option<String>,
    /// Maximum rows to return.
    pub limit: u32,
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            actor: None,
            resource_type: None,
            limit: 100,
        }
    }
}

/// Append-only, query, export, and retention-purge access to audit storage.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends a single entry. Called by the worker pool, never directly by
    /// request handlers (§4.6 — "must never block the hot path").
    async fn append(&self, entry: AuditLog) -> AppResult<()>;

    /// Lists entries most-recent-first matching `query`.
    async fn list_recent_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLog>>;

    /// Streams entries for CSV export matching `query`.
    async fn export_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLog>>;

    /// Deletes entries for `tenant_id` with `occurred_at < cutoff`, returning
    /// the number of rows removed.
    async fn purge_entries_older_than(
        &self,
        tenant_id: TenantId,
        cutoff: DateTime<Utc>,
    ) -> AppResult<u64>;
}
