use qryvanta_domain::AuditLog;

/// Header row matching the field order of [`AuditLog::to_csv_row`].
pub const CSV_HEADER: &str =
    "id,tenant_id,occurred_at,event_type,actor,resource_type,resource_id,action,decision,reason";

/// Renders `entries` as a complete CSV document, header included, per
/// §4.6's export operation.
#[must_use]
pub fn to_csv_document(entries: &[AuditLog]) -> String {
    let mut document = String::from(CSV_HEADER);
    document.push('\n');
    for entry in entries {
        document.push_str(&entry.to_csv_row());
        document.push('\n');
    }
    document
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use qryvanta_core::TenantId;
    use qryvanta_domain::{AuditEventType, AuditLogId};
    use serde_json::Value;

    use super::*;

    #[test]
    fn document_starts_with_header_and_has_one_row_per_entry() {
        let entry = AuditLog::new(
            AuditLogId::new(),
            TenantId::new(),
            Utc::now(),
            AuditEventType::Decision,
            Some("u-1".to_owned()),
            None,
            Some("document".to_owned()),
            Some("doc-1".to_owned()),
            "read".to_owned(),
            Some("allow".to_owned()),
            Some("viewer: document:read".to_owned()),
            Value::Null,
            Value::Null,
            None,
            None,
        );
        let document = to_csv_document(&[entry]);
        let mut lines = document.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(lines.count(), 1);
    }
}
