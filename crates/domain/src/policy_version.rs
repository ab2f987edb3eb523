//! PolicyVersion domain type: an immutable, content-addressed revision of a
//! [`Policy`](crate::Policy).

use chrono::{DateTime, Utc};
use qryvanta_core::AppError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::PolicyId;

/// Unique identifier for a policy version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyVersionId(Uuid);

impl PolicyVersionId {
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

impl Default for PolicyVersionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of validating a [`PolicyVersion`]'s content, per §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Not yet validated.
    Pending,
    /// Passed denylist and syntactic/semantic checks.
    Valid,
    /// Failed validation; `validation_errors` carries the details.
    Invalid,
}

impl ValidationStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }

    /// Parses a storage string into a validation status.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "pending" => Ok(Self::Pending),
            "valid" => Ok(Self::Valid),
            "invalid" => Ok(Self::Invalid),
            other => Err(AppError::Validation(format!(
                "unknown validation status '{other}'"
            ))),
        }
    }
}

/// Computes the SHA-256 checksum of policy content as a lowercase hex
/// string, matching the invariant `checksum(v) = SHA-256(content(v))`.
#[must_use]
pub fn checksum_of(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// An immutable revision of a policy's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyVersion {
    id: PolicyVersionId,
    policy_id: PolicyId,
    version: u32,
    content: String,
    checksum: String,
    validation_status: ValidationStatus,
    validation_errors: Option<Vec<String>>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl PolicyVersion {
    /// Creates a new version from content, computing its checksum and
    /// setting `validation_status = Pending` — the caller validates
    /// separately and calls [`PolicyVersion::mark_valid`] or
    /// [`PolicyVersion::mark_invalid`].
    #[must_use]
    pub fn new(
        id: PolicyVersionId,
        policy_id: PolicyId,
        version: u32,
        content: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        let checksum = checksum_of(&content);
        Self {
            id,
            policy_id,
            version,
            content,
            checksum,
            validation_status: ValidationStatus::Pending,
            validation_errors: None,
            published_at: None,
            created_at,
        }
    }

    /// Reconstructs a policy version from persisted fields.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: PolicyVersionId,
        policy_id: PolicyId,
        version: u32,
        content: String,
        checksum: String,
        validation_status: ValidationStatus,
        validation_errors: Option<Vec<String>>,
        published_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            policy_id,
            version,
            content,
            checksum,
            validation_status,
            validation_errors,
            published_at,
            created_at,
        }
    }

    /// Returns the version id.
    #[must_use]
    pub fn id(&self) -> PolicyVersionId {
        self.id
    }

    /// Returns the owning policy.
    #[must_use]
    pub fn policy_id(&self) -> PolicyId {
        self.policy_id
    }

    /// Returns the sequence number within the policy.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns the raw content.
    #[must_use]
    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    /// Returns the SHA-256 checksum of `content`.
    #[must_use]
    pub fn checksum(&self) -> &str {
        self.checksum.as_str()
    }

    /// Returns whether the stored checksum actually matches the content,
    /// per the testable property `checksum(v) = SHA-256(content(v))`.
    #[must_use]
    pub fn checksum_is_consistent(&self) -> bool {
        self.checksum == checksum_of(&self.content)
    }

    /// Returns the validation status.
    #[must_use]
    pub fn validation_status(&self) -> ValidationStatus {
        self.validation_status
    }

    /// Returns the structured validation errors, if invalid.
    #[must_use]
    pub fn validation_errors(&self) -> Option<&[String]> {
        self.validation_errors.as_deref()
    }

    /// Returns the publish timestamp, if published.
    #[must_use]
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Marks the version as having passed validation.
    pub fn mark_valid(&mut self) {
        self.validation_status = ValidationStatus::Valid;
        self.validation_errors = None;
    }

    /// Marks the version as having failed validation with the given errors.
    pub fn mark_invalid(&mut self, errors: Vec<String>) {
        self.validation_status = ValidationStatus::Invalid;
        self.validation_errors = Some(errors);
    }

    /// Returns whether this version may be published (must be `Valid`).
    #[must_use]
    pub fn is_publishable(&self) -> bool {
        self.validation_status == ValidationStatus::Valid
    }

    /// Records the publish timestamp.
    pub fn mark_published(&mut self, at: DateTime<Utc>) {
        self.published_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_matches_content() {
        let version = PolicyVersion::new(
            PolicyVersionId::new(),
            PolicyId::new(),
            1,
            "package example\nallow := true\n".to_owned(),
            Utc::now(),
        );
        assert!(version.checksum_is_consistent());
    }

    #[test]
    fn only_valid_versions_are_publishable() {
        let mut version = PolicyVersion::new(
            PolicyVersionId::new(),
            PolicyId::new(),
            1,
            "package example\n".to_owned(),
            Utc::now(),
        );
        assert!(!version.is_publishable());
        version.mark_valid();
        assert!(version.is_publishable());
    }

    #[test]
    fn invalid_version_carries_errors() {
        let mut version = PolicyVersion::new(
            PolicyVersionId::new(),
            PolicyId::new(),
            1,
            "package example\nhttp.send(x)\n".to_owned(),
            Utc::now(),
        );
        version.mark_invalid(vec!["denylisted import: http.send".to_owned()]);
        assert!(!version.is_publishable());
        assert_eq!(version.validation_errors().map(<[String]>::len), Some(1));
    }
}
