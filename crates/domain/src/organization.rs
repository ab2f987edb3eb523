//! Organization (tenant) domain type.

use chrono::{DateTime, Utc};
use qryvanta_core::{AppError, AppResult, NonEmptyString, TenantId};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationStatus {
    /// Normal operating state.
    Active,
    /// Temporarily blocked from issuing new authenticated sessions.
    Suspended,
    /// Soft-deleted; excluded from all normal reads.
    Deleted,
}

impl OrganizationStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Deleted => "deleted",
        }
    }

    /// Parses a storage string into an organization status.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "deleted" => Ok(Self::Deleted),
            other => Err(AppError::Validation(format!(
                "unknown organization status '{other}'"
            ))),
        }
    }
}

/// A tenant: the isolation boundary for all other entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    id: TenantId,
    name: NonEmptyString,
    status: OrganizationStatus,
    deleted_at: Option<DateTime<Utc>>,
}

impl Organization {
    /// Creates a new active organization.
    #[must_use]
    pub fn new(id: TenantId, name: NonEmptyString) -> Self {
        Self {
            id,
            name,
            status: OrganizationStatus::Active,
            deleted_at: None,
        }
    }

    /// Reconstructs an organization from persisted fields.
    #[must_use]
    pub fn from_parts(
        id: TenantId,
        name: NonEmptyString,
        status: OrganizationStatus,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            name,
            status,
            deleted_at,
        }
    }

    /// Returns the organization id.
    #[must_use]
    pub fn id(&self) -> TenantId {
        self.id
    }

    /// Returns the organization name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> OrganizationStatus {
        self.status
    }

    /// Returns the soft-delete timestamp, if deleted.
    #[must_use]
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns whether this organization is able to serve authenticated
    /// requests, per §4.1's "suspended/deleted org" rejection rule.
    #[must_use]
    pub fn accepts_requests(&self) -> bool {
        matches!(self.status, OrganizationStatus::Active)
    }

    /// Marks the organization suspended.
    pub fn suspend(&mut self) {
        self.status = OrganizationStatus::Suspended;
    }

    /// Restores a suspended organization to active.
    pub fn restore(&mut self) {
        self.status = OrganizationStatus::Active;
    }

    /// Soft-deletes the organization.
    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.status = OrganizationStatus::Deleted;
        self.deleted_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_organization_is_active_and_accepts_requests() {
        let org = Organization::new(
            TenantId::new(),
            NonEmptyString::new("acme").unwrap_or_else(|_| unreachable!()),
        );
        assert!(org.accepts_requests());
    }

    #[test]
    fn suspended_organization_rejects_requests() {
        let mut org = Organization::new(
            TenantId::new(),
            NonEmptyString::new("acme").unwrap_or_else(|_| unreachable!()),
        );
        org.suspend();
        assert!(!org.accepts_requests());
    }

    #[test]
    fn status_roundtrips_through_storage_string() {
        for status in [
            OrganizationStatus::Active,
            OrganizationStatus::Suspended,
            OrganizationStatus::Deleted,
        ] {
            let parsed = OrganizationStatus::parse(status.as_str()).unwrap_or_else(|_| unreachable!());
            assert_eq!(parsed.as_str(), status.as_str());
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(OrganizationStatus::parse("enabled").is_err());
    }
}
