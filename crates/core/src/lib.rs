//! Shared primitives for all Rust crates in the authorization platform.

#![forbid(unsafe_code)]

/// Caller identity primitives produced by the identity & tenancy gate.
pub mod auth;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use auth::AuthenticatedCaller;

/// Result type used across the platform's crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Tenant identifier used as the partition key for every persisted resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Creates a random tenant identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tenant identifier from an existing UUID value.
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

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TenantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Stable external identity of a decision's subject (the "principal" in the
/// wire protocol). Kept distinct from the internal `UserId` so that cache
/// keys and invalidation targets remain stable across re-provisioning; see
/// `DESIGN.md` for the rationale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Creates a validated principal identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "principal id must not be empty".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PrincipalId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories, covering both the admin surface
/// (typed errors returned directly) and the decision hot path (folded into an
/// `error` decision rather than an HTTP error status).
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// No credential validated for the request.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Credential validated but the action is not permitted.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state (unique constraint,
    /// duplicate assignment, hierarchy cycle, max-depth exceeded).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Operation is not valid for the current state of the target
    /// (publish of an invalid version, archive of a draft, mutating a
    /// system role). Carries the current and required state.
    #[error("precondition failed: current={current}, required={required}")]
    PreconditionFailed {
        /// Human-readable description of the current state.
        current: String,
        /// Human-readable description of the state required to proceed.
        required: String,
    },

    /// Caller exceeded its rate-limit bucket.
    #[error("rate limited: retry after {retry_after}")]
    RateLimited {
        /// RFC 3339 timestamp at which the caller's bucket refills.
        retry_after: String,
    },

    /// A non-essential dependency (the external policy engine) failed or
    /// timed out and the caller is proceeding on a fallback code path.
    #[error("degraded: {0}")]
    DegradedDependency(String),

    /// The persistence layer reported a failure.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Unexpected internal error with no closer-fitting category.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{NonEmptyString, PrincipalId, TenantId};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn tenant_id_formats_as_uuid() {
        let tenant_id = TenantId::new();
        assert_eq!(tenant_id.to_string().len(), 36);
    }

    #[test]
    fn principal_id_rejects_empty() {
        assert!(PrincipalId::new("").is_err());
        assert!(PrincipalId::new("u-ext-1").is_ok());
    }
}
