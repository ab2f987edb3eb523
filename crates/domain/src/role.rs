//! Role domain type and hierarchy constraints.

use qryvanta_core::{AppError, AppResult, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum allowed role hierarchy depth; a root role is level 0.
pub const MAX_HIERARCHY_DEPTH: u8 = 10;

/// Unique identifier for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
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

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A role within an organization, optionally parented for hierarchical
/// permission closure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    org_id: TenantId,
    name: String,
    display_name: String,
    parent_id: Option<RoleId>,
    level: u8,
    is_system: bool,
}

impl Role {
    /// Creates a root role (no parent, level 0).
    pub fn root(
        id: RoleId,
        org_id: TenantId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        is_system: bool,
    ) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::Validation("role name must not be empty".to_owned()));
        }

        Ok(Self {
            id,
            org_id,
            name,
            display_name: display_name.into(),
            parent_id: None,
            level: 0,
            is_system,
        })
    }

    /// Creates a role parented under `parent`, validating the resulting
    /// `level = parent.level + 1` does not exceed [`MAX_HIERARCHY_DEPTH`].
    pub fn child_of(
        id: RoleId,
        org_id: TenantId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        parent: &Role,
        is_system: bool,
    ) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::Validation("role name must not be empty".to_owned()));
        }

        let level = parent.level.checked_add(1).ok_or_else(|| {
            AppError::Conflict("role hierarchy depth overflow".to_owned())
        })?;
        if level > MAX_HIERARCHY_DEPTH {
            return Err(AppError::Conflict(format!(
                "role hierarchy depth {level} exceeds maximum {MAX_HIERARCHY_DEPTH}"
            )));
        }

        Ok(Self {
            id,
            org_id,
            name,
            display_name: display_name.into(),
            parent_id: Some(parent.id),
            level,
            is_system,
        })
    }

    /// Reconstructs a role from persisted fields, without re-validating the
    /// hierarchy depth (the caller is expected to have enforced it at write
    /// time; a read path must not reject previously-valid data).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: RoleId,
        org_id: TenantId,
        name: String,
        display_name: String,
        parent_id: Option<RoleId>,
        level: u8,
        is_system: bool,
    ) -> Self {
        Self {
            id,
            org_id,
            name,
            display_name,
            parent_id,
            level,
            is_system,
        }
    }

    /// Returns the role id.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the owning organization.
    #[must_use]
    pub fn org_id(&self) -> TenantId {
        self.org_id
    }

    /// Returns the machine-readable role name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the parent role id, if any.
    #[must_use]
    pub fn parent_id(&self) -> Option<RoleId> {
        self.parent_id
    }

    /// Returns the hierarchy level (0 for a root role).
    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Returns whether this is a built-in, immutable, undeletable role.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.is_system
    }

    /// Renames the role, rejecting the operation for system roles per the
    /// "system roles immutable & undeletable" invariant.
    pub fn rename(&mut self, name: impl Into<String>) -> AppResult<()> {
        if self.is_system {
            return Err(AppError::PreconditionFailed {
                current: "system".to_owned(),
                required: "non-system".to_owned(),
            });
        }

        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::Validation("role name must not be empty".to_owned()));
        }

        self.name = name;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_role_has_level_zero() {
        let role = Role::root(RoleId::new(), TenantId::new(), "admin", "Admin", false)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(role.level(), 0);
        assert!(role.parent_id().is_none());
    }

    #[test]
    fn child_role_level_is_parent_plus_one() {
        let parent = Role::root(RoleId::new(), TenantId::new(), "admin", "Admin", false)
            .unwrap_or_else(|_| unreachable!());
        let child = Role::child_of(
            RoleId::new(),
            parent.org_id(),
            "viewer",
            "Viewer",
            &parent,
            false,
        )
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(child.level(), 1);
        assert_eq!(child.parent_id(), Some(parent.id()));
    }

    #[test]
    fn depth_ten_is_accepted_and_eleven_rejected() {
        let org_id = TenantId::new();
        let mut current =
            Role::root(RoleId::new(), org_id, "level-0", "Level 0", false).unwrap_or_else(|_| unreachable!());

        for level in 1..=MAX_HIERARCHY_DEPTH {
            let next = Role::child_of(
                RoleId::new(),
                org_id,
                format!("level-{level}"),
                format!("Level {level}"),
                &current,
                false,
            )
            .unwrap_or_else(|_| unreachable!());
            assert_eq!(next.level(), level);
            current = next;
        }

        let overflow = Role::child_of(
            RoleId::new(),
            org_id,
            "level-11",
            "Level 11",
            &current,
            false,
        );
        assert!(overflow.is_err());
    }

    #[test]
    fn system_role_cannot_be_renamed() {
        let mut role = Role::root(RoleId::new(), TenantId::new(), "owner", "Owner", true)
            .unwrap_or_else(|_| unreachable!());
        assert!(role.rename("new-name").is_err());
    }
}
