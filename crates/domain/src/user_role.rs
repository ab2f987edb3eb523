//! UserRole assignment: grants a [`Role`](crate::Role) to a
//! [`User`](crate::User), optionally scoped to a resource and optionally
//! time-bounded.

use chrono::{DateTime, Utc};
use qryvanta_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{RoleId, UserId};

/// Unique identifier for a user-role assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRoleId(Uuid);

impl UserRoleId {
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

impl Default for UserRoleId {
    fn default() -> Self {
        Self::new()
    }
}

/// The scope a user-role assignment applies to, matched per §4.2 step 7.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceScope {
    /// Matches any resource of any type.
    Global,
    /// Matches any instance of the named resource type.
    TypeScoped {
        /// The resource type this assignment is scoped to.
        resource_type: String,
    },
    /// Matches exactly one resource instance.
    Instance {
        /// The resource type this assignment is scoped to.
        resource_type: String,
        /// The specific resource id this assignment is scoped to.
        resource_id: String,
    },
}

impl ResourceScope {
    /// Builds a scope from optional (resource-type, resource-id) fields as
    /// persisted, enforcing the "resource-id requires resource-type"
    /// invariant.
    pub fn from_optional(
        resource_type: Option<String>,
        resource_id: Option<String>,
    ) -> AppResult<Self> {
        match (resource_type, resource_id) {
            (None, None) => Ok(Self::Global),
            (Some(resource_type), None) => Ok(Self::TypeScoped { resource_type }),
            (Some(resource_type), Some(resource_id)) => Ok(Self::Instance {
                resource_type,
                resource_id,
            }),
            (None, Some(_)) => Err(AppError::Validation(
                "resource-id requires resource-type".to_owned(),
            )),
        }
    }

    /// Returns whether this scope permits access to `(resource_type,
    /// resource_id)`.
    #[must_use]
    pub fn matches(&self, resource_type: &str, resource_id: &str) -> bool {
        match self {
            Self::Global => true,
            Self::TypeScoped { resource_type: scoped_type } => scoped_type == resource_type,
            Self::Instance {
                resource_type: scoped_type,
                resource_id: scoped_id,
            } => scoped_type == resource_type && scoped_id == resource_id,
        }
    }

    /// Decomposes the scope back into its persisted optional fields.
    #[must_use]
    pub fn into_optional(self) -> (Option<String>, Option<String>) {
        match self {
            Self::Global => (None, None),
            Self::TypeScoped { resource_type } => (Some(resource_type), None),
            Self::Instance {
                resource_type,
                resource_id,
            } => (Some(resource_type), Some(resource_id)),
        }
    }
}

/// A grant of `role_id` to `user_id`, optionally scoped and optionally
/// expiring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    id: UserRoleId,
    user_id: UserId,
    role_id: RoleId,
    scope: ResourceScope,
    granted_by: Option<UserId>,
    granted_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl UserRole {
    /// Creates a new user-role assignment.
    #[must_use]
    pub fn new(
        id: UserRoleId,
        user_id: UserId,
        role_id: RoleId,
        scope: ResourceScope,
        granted_by: Option<UserId>,
        granted_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            user_id,
            role_id,
            scope,
            granted_by,
            granted_at,
            expires_at,
        }
    }

    /// Returns the assignment id.
    #[must_use]
    pub fn id(&self) -> UserRoleId {
        self.id
    }

    /// Returns the granted-to user.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the granted role.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the resource scope.
    #[must_use]
    pub fn scope(&self) -> &ResourceScope {
        &self.scope
    }

    /// Returns the granting user, if recorded.
    #[must_use]
    pub fn granted_by(&self) -> Option<UserId> {
        self.granted_by
    }

    /// Returns the grant timestamp.
    #[must_use]
    pub fn granted_at(&self) -> DateTime<Utc> {
        self.granted_at
    }

    /// Returns the expiry timestamp, if any.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns whether this assignment is expired as of `now`. Expiry at
    /// exactly `now` is treated as expired (§8 boundary case).
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_scope_matches_any_resource() {
        let scope = ResourceScope::from_optional(None, None).unwrap_or_else(|_| unreachable!());
        assert!(scope.matches("document", "doc-1"));
        assert!(scope.matches("folder", "anything"));
    }

    #[test]
    fn type_scoped_matches_any_instance_of_type() {
        let scope =
            ResourceScope::from_optional(Some("document".to_owned()), None).unwrap_or_else(|_| unreachable!());
        assert!(scope.matches("document", "doc-1"));
        assert!(!scope.matches("folder", "doc-1"));
    }

    #[test]
    fn instance_scope_matches_exact_pair_only() {
        let scope = ResourceScope::from_optional(
            Some("document".to_owned()),
            Some("doc-1".to_owned()),
        )
        .unwrap_or_else(|_| unreachable!());
        assert!(scope.matches("document", "doc-1"));
        assert!(!scope.matches("document", "doc-2"));
    }

    #[test]
    fn resource_id_without_type_is_rejected() {
        assert!(ResourceScope::from_optional(None, Some("doc-1".to_owned())).is_err());
    }

    #[test]
    fn expiry_at_exactly_now_is_expired() {
        let now = Utc::now();
        let user_role = UserRole::new(
            UserRoleId::new(),
            UserId::new(),
            RoleId::new(),
            ResourceScope::Global,
            None,
            now,
            Some(now),
        );
        assert!(user_role.is_expired(now));
    }

    #[test]
    fn no_expiry_never_expires() {
        let now = Utc::now();
        let user_role = UserRole::new(
            UserRoleId::new(),
            UserId::new(),
            RoleId::new(),
            ResourceScope::Global,
            None,
            now,
            None,
        );
        assert!(!user_role.is_expired(now));
    }
}
