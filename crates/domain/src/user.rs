//! User domain type and identity value objects.

use chrono::{DateTime, Utc};
use qryvanta_core::{AppError, AppResult, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
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

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let parts: Vec<&str> = trimmed.splitn(2, '@').collect();
        if parts.len() != 2 {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        let local = parts[0];
        let domain = parts[1];

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Lifecycle state of a user within its organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Able to authenticate and contribute to RBAC decisions.
    Active,
    /// Account exists but is blocked; RBAC evaluation denies with
    /// "User inactive" per §4.2 step 1.
    Inactive,
}

impl UserStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Parses a storage string into a user status.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(AppError::Validation(format!("unknown user status '{other}'"))),
        }
    }
}

/// A user within an organization, identified externally by a stable subject
/// or API-supplied principal id distinct from its internal `UserId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    org_id: TenantId,
    email: EmailAddress,
    username: Option<String>,
    external_identity_id: Option<String>,
    bearer_subject: Option<String>,
    status: UserStatus,
    last_synced_at: DateTime<Utc>,
}

impl User {
    /// Creates a new active user, synced as of now.
    #[must_use]
    pub fn new(
        id: UserId,
        org_id: TenantId,
        email: EmailAddress,
        username: Option<String>,
        external_identity_id: Option<String>,
        bearer_subject: Option<String>,
    ) -> Self {
        Self {
            id,
            org_id,
            email,
            username,
            external_identity_id,
            bearer_subject,
            status: UserStatus::Active,
            last_synced_at: Utc::now(),
        }
    }

    /// Reconstructs a user from persisted fields.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: UserId,
        org_id: TenantId,
        email: EmailAddress,
        username: Option<String>,
        external_identity_id: Option<String>,
        bearer_subject: Option<String>,
        status: UserStatus,
        last_synced_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            org_id,
            email,
            username,
            external_identity_id,
            bearer_subject,
            status,
            last_synced_at,
        }
    }

    /// Returns the internal user id.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the owning organization.
    #[must_use]
    pub fn org_id(&self) -> TenantId {
        self.org_id
    }

    /// Returns the user's email address.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the username, if set.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the stable external identity id used for RBAC lookup and
    /// cache keying, if the user has been JIT-provisioned or otherwise
    /// linked to one.
    #[must_use]
    pub fn external_identity_id(&self) -> Option<&str> {
        self.external_identity_id.as_deref()
    }

    /// Returns the last-seen bearer `sub` claim, if any.
    #[must_use]
    pub fn bearer_subject(&self) -> Option<&str> {
        self.bearer_subject.as_deref()
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> UserStatus {
        self.status
    }

    /// Returns whether this user can contribute to an allow decision.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.status, UserStatus::Active)
    }

    /// Returns when this user's identity was last synced from a bearer hit
    /// or JIT provisioning event.
    #[must_use]
    pub fn last_synced_at(&self) -> DateTime<Utc> {
        self.last_synced_at
    }

    /// Links the user to a bearer subject, updating the external identity id
    /// if it is not already set (first-seen binding per §4.1 JIT rules).
    pub fn bind_bearer_subject(&mut self, subject: impl Into<String>) {
        let subject = subject.into();
        if self.external_identity_id.is_none() {
            self.external_identity_id = Some(subject.clone());
        }
        self.bearer_subject = Some(subject);
    }

    /// Marks this user as synced as of now. Called on every bearer-hit path
    /// in JIT provisioning, not just first-seen binding (§4.1).
    pub fn touch_last_synced(&mut self) {
        self.last_synced_at = Utc::now();
    }
}

/// Registration mode for a tenant's self-service sign-up flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationMode {
    /// Only invited users can join the tenant.
    InviteOnly,
    /// Anyone can register and create an account.
    Open,
}

impl RegistrationMode {
    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InviteOnly => "invite_only",
            Self::Open => "open",
        }
    }

    /// Parses a storage string into a registration mode.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "invite_only" => Ok(Self::InviteOnly),
            "open" => Ok(Self::Open),
            other => Err(AppError::Validation(format!(
                "unknown registration mode '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_is_accepted() {
        let email = EmailAddress::new("USER@Example.COM");
        assert!(email.is_ok());
        assert_eq!(
            email.unwrap_or_else(|_| panic!("test")).as_str(),
            "user@example.com"
        );
    }

    #[test]
    fn email_without_at_is_rejected() {
        assert!(EmailAddress::new("noatsign").is_err());
    }

    #[test]
    fn email_without_domain_dot_is_rejected() {
        assert!(EmailAddress::new("user@nodot").is_err());
    }

    #[test]
    fn empty_email_is_rejected() {
        assert!(EmailAddress::new("").is_err());
    }

    #[test]
    fn inactive_user_does_not_contribute_to_decisions() {
        let user = User::from_parts(
            UserId::new(),
            TenantId::new(),
            EmailAddress::new("u@example.com").unwrap_or_else(|_| unreachable!()),
            None,
            Some("u-ext-1".to_owned()),
            None,
            UserStatus::Inactive,
            Utc::now(),
        );
        assert!(!user.is_active());
    }

    #[test]
    fn first_bearer_bind_sets_external_identity_id() {
        let mut user = User::new(
            UserId::new(),
            TenantId::new(),
            EmailAddress::new("u@example.com").unwrap_or_else(|_| unreachable!()),
            None,
            None,
            None,
        );
        user.bind_bearer_subject("sub-123");
        assert_eq!(user.external_identity_id(), Some("sub-123"));
        assert_eq!(user.bearer_subject(), Some("sub-123"));
    }

    #[test]
    fn touch_last_synced_advances_the_timestamp() {
        let mut user = User::new(
            UserId::new(),
            TenantId::new(),
            EmailAddress::new("u@example.com").unwrap_or_else(|_| unreachable!()),
            None,
            None,
            None,
        );
        let before = user.last_synced_at();
        std::thread::sleep(std::time::Duration::from_millis(2));
        user.touch_last_synced();
        assert!(user.last_synced_at() > before);
    }
}
