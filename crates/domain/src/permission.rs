//! Permission domain type: an (resource-type, action, effect) triple.
//!
//! Unlike a closed catalog enum, permissions here are administrator-defined
//! data, since the RBAC evaluator (§4.2) matches against caller-supplied
//! `resource-type`/`action` strings rather than a fixed set baked into the
//! binary.

use qryvanta_core::{AppError, AppResult, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionId(Uuid);

impl PermissionId {
    /// Creates a new random permission identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a permission identifier from an existing UUID value.
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

impl Default for PermissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PermissionId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Whether a permission grants or explicitly blocks the matching action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Grants the action, subject to resource-scope matching.
    Allow,
    /// Blocks the action unconditionally, taking precedence over any allow
    /// (deny-over-allow, §4.2 step 6).
    Deny,
}

impl Effect {
    /// Returns the storage string for this effect.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }

    /// Parses a storage string into an effect.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            other => Err(AppError::Validation(format!("unknown permission effect '{other}'"))),
        }
    }
}

/// A single grantable capability: "do `action` to `resource_type`".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    id: PermissionId,
    org_id: TenantId,
    name: String,
    resource_type: String,
    action: String,
    effect: Effect,
}

impl Permission {
    /// Creates a new permission, rejecting empty name/resource-type/action.
    pub fn new(
        id: PermissionId,
        org_id: TenantId,
        name: impl Into<String>,
        resource_type: impl Into<String>,
        action: impl Into<String>,
        effect: Effect,
    ) -> AppResult<Self> {
        let name = name.into();
        let resource_type = resource_type.into();
        let action = action.into();

        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "permission name must not be empty".to_owned(),
            ));
        }
        if resource_type.trim().is_empty() {
            return Err(AppError::Validation(
                "permission resource-type must not be empty".to_owned(),
            ));
        }
        if action.trim().is_empty() {
            return Err(AppError::Validation(
                "permission action must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            id,
            org_id,
            name,
            resource_type,
            action,
            effect,
        })
    }

    /// Reconstructs a permission from persisted fields.
    #[must_use]
    pub fn from_parts(
        id: PermissionId,
        org_id: TenantId,
        name: String,
        resource_type: String,
        action: String,
        effect: Effect,
    ) -> Self {
        Self {
            id,
            org_id,
            name,
            resource_type,
            action,
            effect,
        }
    }

    /// Returns the permission id.
    #[must_use]
    pub fn id(&self) -> PermissionId {
        self.id
    }

    /// Returns the owning organization.
    #[must_use]
    pub fn org_id(&self) -> TenantId {
        self.org_id
    }

    /// Returns the permission name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the resource type this permission applies to.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        self.resource_type.as_str()
    }

    /// Returns the action this permission applies to.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the effect.
    #[must_use]
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Returns whether this permission matches a requested
    /// (resource-type, action) pair, per §4.2 step 5.
    #[must_use]
    pub fn matches(&self, resource_type: &str, action: &str) -> bool {
        self.resource_type == resource_type && self.action == action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_exact_resource_type_and_action() {
        let permission = Permission::new(
            PermissionId::new(),
            TenantId::new(),
            "document:read",
            "document",
            "read",
            Effect::Allow,
        )
        .unwrap_or_else(|_| unreachable!());

        assert!(permission.matches("document", "read"));
        assert!(!permission.matches("document", "write"));
        assert!(!permission.matches("folder", "read"));
    }

    #[test]
    fn empty_fields_are_rejected() {
        assert!(Permission::new(
            PermissionId::new(),
            TenantId::new(),
            "",
            "document",
            "read",
            Effect::Allow,
        )
        .is_err());
    }

    #[test]
    fn effect_roundtrips_through_storage_string() {
        assert_eq!(Effect::parse("allow").unwrap_or_else(|_| unreachable!()).as_str(), "allow");
        assert_eq!(Effect::parse("deny").unwrap_or_else(|_| unreachable!()).as_str(), "deny");
        assert!(Effect::parse("maybe").is_err());
    }
}
