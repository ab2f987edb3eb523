use serde::{Deserialize, Serialize};

use crate::{PrincipalId, TenantId};

/// How the caller's tenant identity was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialMode {
    /// A signed bearer token validated against JWKS.
    Bearer,
    /// A shared-secret API key mapped to a fixed tenant.
    ApiKey,
}

/// The outcome of the identity & tenancy gate: a tenant binding, and, for
/// bearer credentials, the resolved internal user together with the stable
/// external principal id used for RBAC lookup and cache keying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedCaller {
    tenant_id: TenantId,
    credential_mode: CredentialMode,
    principal: Option<PrincipalId>,
    internal_user_id: Option<uuid::Uuid>,
}

impl AuthenticatedCaller {
    /// Builds a caller bound to a tenant via a resolved bearer identity.
    #[must_use]
    pub fn bearer(tenant_id: TenantId, principal: PrincipalId, internal_user_id: uuid::Uuid) -> Self {
        Self {
            tenant_id,
            credential_mode: CredentialMode::Bearer,
            principal: Some(principal),
            internal_user_id: Some(internal_user_id),
        }
    }

    /// Builds a caller bound to a tenant via an API key, with no user
    /// identity attached.
    #[must_use]
    pub fn api_key(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            credential_mode: CredentialMode::ApiKey,
            principal: None,
            internal_user_id: None,
        }
    }

    /// Returns the tenant bound to this request.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns how the credential was validated.
    #[must_use]
    pub fn credential_mode(&self) -> CredentialMode {
        self.credential_mode
    }

    /// Returns the resolved external principal id, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&PrincipalId> {
        self.principal.as_ref()
    }

    /// Returns the resolved internal user id, if any.
    #[must_use]
    pub fn internal_user_id(&self) -> Option<uuid::Uuid> {
        self.internal_user_id
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{AuthenticatedCaller, CredentialMode};
    use crate::{PrincipalId, TenantId};

    #[test]
    fn api_key_caller_has_no_user_identity() {
        let caller = AuthenticatedCaller::api_key(TenantId::new());
        assert_eq!(caller.credential_mode(), CredentialMode::ApiKey);
        assert!(caller.principal().is_none());
        assert!(caller.internal_user_id().is_none());
    }

    #[test]
    fn bearer_caller_carries_principal_and_user_id() {
        let tenant_id = TenantId::new();
        let user_id = Uuid::new_v4();
        let caller = AuthenticatedCaller::bearer(
            tenant_id,
            PrincipalId::new("u-ext-1").unwrap_or_else(|_| unreachable!()),
            user_id,
        );

        assert_eq!(caller.tenant_id(), tenant_id);
        assert_eq!(caller.principal().map(PrincipalId::as_str), Some("u-ext-1"));
        assert_eq!(caller.internal_user_id(), Some(user_id));
    }
}
