use qryvanta_core::{PrincipalId, TenantId};

/// Builds the decision cache key: `{tenant}:{principal}:{action}:{resource-type}:{resource-id}`.
/// Resource attributes deliberately do not contribute to the key, per §4.4 —
/// callers passing attributes are responsible for invalidating on attribute
/// change.
#[must_use]
pub fn fingerprint(
    tenant_id: TenantId,
    principal: &PrincipalId,
    action: &str,
    resource_type: &str,
    resource_id: &str,
) -> String {
    format!("{tenant_id}:{principal}:{action}:{resource_type}:{resource_id}")
}

/// Returns the L2 namespace prefix for a tenant, used for bulk purge.
#[must_use]
pub fn tenant_prefix(tenant_id: TenantId) -> String {
    format!("{tenant_id}:")
}
