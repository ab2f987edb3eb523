//! Policy domain type and lifecycle state machine.

use qryvanta_core::{AppError, AppResult, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyId(Uuid);

impl PolicyId {
    /// Creates a new random policy identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a policy identifier from an existing UUID value.
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

impl Default for PolicyId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PolicyId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// The policy language a [`Policy`] is authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    /// Open Policy Agent's Rego language; the only type validated today.
    Rego,
    /// Reserved; the validation endpoint returns `unsupported` for these.
    Cedar,
}

impl PolicyType {
    /// Returns the storage string for this policy type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rego => "rego",
            Self::Cedar => "cedar",
        }
    }

    /// Parses a storage string into a policy type.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "rego" => Ok(Self::Rego),
            "cedar" => Ok(Self::Cedar),
            other => Err(AppError::Validation(format!("unknown policy type '{other}'"))),
        }
    }
}

/// Lifecycle state of a [`Policy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    /// Newly created or updated, not yet serving decisions.
    Draft,
    /// Published; contributes to the external policy adapter's decisions.
    Active,
    /// Taken out of the serving set; reversible to `Active` by
    /// administrative override.
    Archived,
}

impl PolicyStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    /// Parses a storage string into a policy status.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            other => Err(AppError::Validation(format!("unknown policy status '{other}'"))),
        }
    }
}

/// A named policy document, tracked through draft → active → archived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    id: PolicyId,
    org_id: TenantId,
    name: String,
    display_name: String,
    policy_type: PolicyType,
    status: PolicyStatus,
    current_version: u32,
}

impl Policy {
    /// Creates a new policy in `Draft` status with `current_version = 1`.
    pub fn new(
        id: PolicyId,
        org_id: TenantId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        policy_type: PolicyType,
    ) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::Validation("policy name must not be empty".to_owned()));
        }

        Ok(Self {
            id,
            org_id,
            name,
            display_name: display_name.into(),
            policy_type,
            status: PolicyStatus::Draft,
            current_version: 1,
        })
    }

    /// Reconstructs a policy from persisted fields.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: PolicyId,
        org_id: TenantId,
        name: String,
        display_name: String,
        policy_type: PolicyType,
        status: PolicyStatus,
        current_version: u32,
    ) -> Self {
        Self {
            id,
            org_id,
            name,
            display_name,
            policy_type,
            status,
            current_version,
        }
    }

    /// Returns the policy id.
    #[must_use]
    pub fn id(&self) -> PolicyId {
        self.id
    }

    /// Returns the owning organization.
    #[must_use]
    pub fn org_id(&self) -> TenantId {
        self.org_id
    }

    /// Returns the machine-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the human-readable display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the policy type.
    #[must_use]
    pub fn policy_type(&self) -> PolicyType {
        self.policy_type
    }

    /// Returns the current lifecycle status.
    #[must_use]
    pub fn status(&self) -> PolicyStatus {
        self.status
    }

    /// Returns the current version number (≥ 1).
    #[must_use]
    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    /// Records that a new version was appended, advancing
    /// `current_version`.
    pub fn advance_version(&mut self, new_version: u32) -> AppResult<()> {
        if new_version <= self.current_version {
            return Err(AppError::Conflict(format!(
                "version {new_version} does not advance current version {current}",
                current = self.current_version
            )));
        }
        self.current_version = new_version;
        Ok(())
    }

    /// Transitions `Draft` → `Active`. The caller is responsible for having
    /// checked that the target version is `valid` before calling this.
    pub fn publish(&mut self) -> AppResult<()> {
        if self.status == PolicyStatus::Active {
            return Ok(());
        }
        if self.status != PolicyStatus::Draft && self.status != PolicyStatus::Archived {
            return Err(AppError::PreconditionFailed {
                current: self.status.as_str().to_owned(),
                required: "draft or archived".to_owned(),
            });
        }
        self.status = PolicyStatus::Active;
        Ok(())
    }

    /// Transitions `Active` → `Archived`.
    pub fn archive(&mut self) -> AppResult<()> {
        if self.status != PolicyStatus::Active {
            return Err(AppError::PreconditionFailed {
                current: self.status.as_str().to_owned(),
                required: "active".to_owned(),
            });
        }
        self.status = PolicyStatus::Archived;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_policy_starts_as_draft_with_version_one() {
        let policy = Policy::new(
            PolicyId::new(),
            TenantId::new(),
            "edge-access",
            "Edge Access",
            PolicyType::Rego,
        )
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(policy.status(), PolicyStatus::Draft);
        assert_eq!(policy.current_version(), 1);
    }

    #[test]
    fn archive_requires_active_status() {
        let mut policy = Policy::new(
            PolicyId::new(),
            TenantId::new(),
            "edge-access",
            "Edge Access",
            PolicyType::Rego,
        )
        .unwrap_or_else(|_| unreachable!());
        assert!(policy.archive().is_err());
        policy.publish().unwrap_or_else(|_| unreachable!());
        assert!(policy.archive().is_ok());
        assert_eq!(policy.status(), PolicyStatus::Archived);
    }

    #[test]
    fn archived_policy_can_be_republished() {
        let mut policy = Policy::new(
            PolicyId::new(),
            TenantId::new(),
            "edge-access",
            "Edge Access",
            PolicyType::Rego,
        )
        .unwrap_or_else(|_| unreachable!());
        policy.publish().unwrap_or_else(|_| unreachable!());
        policy.archive().unwrap_or_else(|_| unreachable!());
        assert!(policy.publish().is_ok());
        assert_eq!(policy.status(), PolicyStatus::Active);
    }
}
