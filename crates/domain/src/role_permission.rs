//! RolePermission edge: grants a [`Permission`](crate::Permission) to a
//! [`Role`](crate::Role).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PermissionId, RoleId};

/// Unique identifier for a role-permission edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RolePermissionId(Uuid);

impl RolePermissionId {
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

impl Default for RolePermissionId {
    fn default() -> Self {
        Self::new()
    }
}

/// An edge granting `permission_id` to `role_id`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RolePermission {
    id: RolePermissionId,
    role_id: RoleId,
    permission_id: PermissionId,
}

impl RolePermission {
    /// Creates a new role-permission edge.
    #[must_use]
    pub fn new(id: RolePermissionId, role_id: RoleId, permission_id: PermissionId) -> Self {
        Self {
            id,
            role_id,
            permission_id,
        }
    }

    /// Returns the edge id.
    #[must_use]
    pub fn id(&self) -> RolePermissionId {
        self.id
    }

    /// Returns the granted-to role.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the granted permission.
    #[must_use]
    pub fn permission_id(&self) -> PermissionId {
        self.permission_id
    }
}
