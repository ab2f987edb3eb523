//! AuditLog domain type: an immutable, time-partitioned record of a decision
//! or an administrative mutation.

use chrono::{DateTime, Utc};
use qryvanta_core::{AppError, AppResult, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for an audit log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditLogId(Uuid);

impl AuditLogId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AuditLogId {
    fn default() -> Self {
        Self::new()
    }
}

/// The broad category of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A decision produced by the RBAC evaluator / policy adapter.
    Decision,
    /// An administrative create/update/delete mutation.
    AdminMutation,
}

impl AuditEventType {
    /// Returns the storage string for this event type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decision => "decision",
            Self::AdminMutation => "admin_mutation",
        }
    }

    /// Parses a storage string into an audit event type.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "decision" => Ok(Self::Decision),
            "admin_mutation" => Ok(Self::AdminMutation),
            other => Err(AppError::Validation(format!(
                "unknown audit event type '{other}'"
            ))),
        }
    }
}

/// An append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    id: AuditLogId,
    tenant_id: TenantId,
    occurred_at: DateTime<Utc>,
    event_type: AuditEventType,
    actor: Option<String>,
    actor_email: Option<String>,
    resource_type: Option<String>,
    resource_id: Option<String>,
    action: String,
    decision: Option<String>,
    reason: Option<String>,
    request_data: Value,
    response_data: Value,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

impl AuditLog {
    /// Creates a new audit log entry.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: AuditLogId,
        tenant_id: TenantId,
        occurred_at: DateTime<Utc>,
        event_type: AuditEventType,
        actor: Option<String>,
        actor_email: Option<String>,
        resource_type: Option<String>,
        resource_id: Option<String>,
        action: String,
        decision: Option<String>,
        reason: Option<String>,
        request_data: Value,
        response_data: Value,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            occurred_at,
            event_type,
            actor,
            actor_email,
            resource_type,
            resource_id,
            action,
            decision,
            reason,
            request_data,
            response_data,
            ip_address,
            user_agent,
        }
    }

    /// Returns the entry id.
    #[must_use]
    pub fn id(&self) -> AuditLogId {
        self.id
    }

    /// Returns the owning tenant; also the partition key's leading term.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the timestamp; the monthly partition key.
    #[must_use]
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Returns the event type.
    #[must_use]
    pub fn event_type(&self) -> AuditEventType {
        self.event_type
    }

    /// Returns the acting principal, if any.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// Returns the acting principal's email, if known.
    #[must_use]
    pub fn actor_email(&self) -> Option<&str> {
        self.actor_email.as_deref()
    }

    /// Returns the affected resource type, if any.
    #[must_use]
    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    /// Returns the affected resource id, if any.
    #[must_use]
    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    /// Returns the action performed.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the decision outcome, for decision-type events.
    #[must_use]
    pub fn decision(&self) -> Option<&str> {
        self.decision.as_deref()
    }

    /// Returns the human-readable reason.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the request payload as stored.
    #[must_use]
    pub fn request_data(&self) -> &Value {
        &self.request_data
    }

    /// Returns the response payload as stored.
    #[must_use]
    pub fn response_data(&self) -> &Value {
        &self.response_data
    }

    /// Returns the caller's IP address, if captured.
    #[must_use]
    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    /// Returns the caller's user agent, if captured.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Escapes a field for CSV export: wraps in quotes and doubles any
    /// embedded quote whenever the field contains a separator, quote, or
    /// newline, per §4.6's export rule.
    #[must_use]
    pub fn csv_escape(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_owned()
        }
    }

    /// Renders this entry as a single CSV row (without a trailing newline).
    #[must_use]
    pub fn to_csv_row(&self) -> String {
        let fields = [
            self.id.as_uuid().to_string(),
            self.tenant_id.to_string(),
            self.occurred_at.to_rfc3339(),
            self.event_type.as_str().to_owned(),
            self.actor.clone().unwrap_or_default(),
            self.resource_type.clone().unwrap_or_default(),
            self.resource_id.clone().unwrap_or_default(),
            self.action.clone(),
            self.decision.clone().unwrap_or_default(),
            self.reason.clone().unwrap_or_default(),
        ];
        fields
            .iter()
            .map(|field| Self::csv_escape(field))
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(reason: &str) -> AuditLog {
        AuditLog::new(
            AuditLogId::new(),
            TenantId::new(),
            Utc::now(),
            AuditEventType::Decision,
            Some("u-ext-1".to_owned()),
            None,
            Some("document".to_owned()),
            Some("doc-1".to_owned()),
            "read".to_owned(),
            Some("allow".to_owned()),
            Some(reason.to_owned()),
            Value::Null,
            Value::Null,
            None,
            None,
        )
    }

    #[test]
    fn csv_escape_quotes_fields_with_commas() {
        assert_eq!(AuditLog::csv_escape("a,b"), "\"a,b\"");
        assert_eq!(AuditLog::csv_escape("plain"), "plain");
    }

    #[test]
    fn csv_escape_doubles_embedded_quotes() {
        assert_eq!(AuditLog::csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn csv_row_escapes_reason_containing_comma() {
        let entry = sample("viewer, document:read");
        let row = entry.to_csv_row();
        assert!(row.contains("\"viewer, document:read\""));
    }

    #[test]
    fn event_type_roundtrips_through_storage_string() {
        assert_eq!(
            AuditEventType::parse("decision").unwrap_or_else(|_| unreachable!()).as_str(),
            "decision"
        );
        assert!(AuditEventType::parse("bogus").is_err());
    }
}
