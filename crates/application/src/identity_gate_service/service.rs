use std::sync::Arc;

use qryvanta_core::{AppError, AppResult, AuthenticatedCaller, PrincipalId, TenantId};
use qryvanta_domain::{EmailAddress, User};

use super::jwt::BearerVerifier;
use super::ports::IdentityRepository;

/// Resolves an inbound credential to a tenant and, for bearer tokens, an
/// internal user identity — with Just-In-Time provisioning on first sight
/// of a bearer subject (§4.1).
#[derive(Clone)]
pub struct IdentityGateService {
    repository: Arc<dyn IdentityRepository>,
    verifier: Arc<dyn BearerVerifier>,
}

impl IdentityGateService {
    /// Creates a new gate over the given repository and bearer verifier.
    #[must_use]
    pub fn new(repository: Arc<dyn IdentityRepository>, verifier: Arc<dyn BearerVerifier>) -> Self {
        Self { repository, verifier }
    }

    /// Resolves a bearer token, per §4.1's bearer path: verify → check
    /// tenant status → JIT-provision or bind.
    pub async fn authenticate_bearer(&self, token: &str) -> AppResult<AuthenticatedCaller> {
        let claims = self.verifier.verify(token).await?;
        self.check_tenant_accepts_requests(claims.tenant_id).await?;

        let user = self.resolve_or_provision_user(&claims).await?;
        let principal = PrincipalId::new(
            user.external_identity_id()
                .unwrap_or(&claims.subject)
                .to_owned(),
        )?;

        Ok(AuthenticatedCaller::bearer(
            claims.tenant_id,
            principal,
            user.id().as_uuid(),
        ))
    }

    /// Resolves an API key, per §4.1's shared-secret path: a valid key
    /// grants the tenant identity alone, with no user identity attached.
    pub async fn authenticate_api_key(&self, api_key: &str) -> AppResult<AuthenticatedCaller> {
        let tenant_id = self
            .repository
            .resolve_api_key(api_key)
            .await?
            .ok_or_else(|| AppError::AuthenticationFailed("unknown api key".to_owned()))?;

        self.check_tenant_accepts_requests(tenant_id).await?;
        Ok(AuthenticatedCaller::api_key(tenant_id))
    }

    async fn check_tenant_accepts_requests(&self, tenant_id: TenantId) -> AppResult<()> {
        let organization = self
            .repository
            .find_organization(tenant_id)
            .await?
            .ok_or_else(|| AppError::AuthenticationFailed("unknown tenant".to_owned()))?;

        if !organization.accepts_requests() {
            return Err(AppError::AuthorizationDenied(
                "organization is suspended or deleted".to_owned(),
            ));
        }
        Ok(())
    }

    async fn resolve_or_provision_user(
        &self,
        claims: &super::ports::BearerClaims,
    ) -> AppResult<User> {
        if let Some(mut user) = self
            .repository
            .find_user_by_subject(claims.tenant_id, &claims.subject)
            .await?
        {
            user.touch_last_synced();
            return self.repository.upsert_user(user).await;
        }

        if let Some(email) = &claims.email {
            if let Some(mut user) = self
                .repository
                .find_user_by_email(claims.tenant_id, email)
                .await?
            {
                user.bind_bearer_subject(claims.subject.clone());
                user.touch_last_synced();
                return self.repository.upsert_user(user).await;
            }
        }

        let email = claims
            .email
            .clone()
            .unwrap_or_else(|| format!("{}@unknown.invalid", claims.subject));
        let mut user = User::new(
            qryvanta_domain::UserId::new(),
            claims.tenant_id,
            EmailAddress::new(email)?,
            None,
            None,
            None,
        );
        user.bind_bearer_subject(claims.subject.clone());
        self.repository.upsert_user(user).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use parking_lot::Mutex;

    use async_trait::async_trait;
    use qryvanta_domain::{NonEmptyString, Organization};

    use super::super::ports::BearerClaims;
    use super::*;

    #[derive(Default)]
    struct FakeRepository {
        organizations: Mutex<HashMap<TenantId, Organization>>,
        users_by_subject: Mutex<HashMap<(TenantId, String), User>>,
        api_keys: Mutex<HashMap<String, TenantId>>,
    }

    #[async_trait]
    impl IdentityRepository for FakeRepository {
        async fn find_organization(&self, tenant_id: TenantId) -> AppResult<Option<Organization>> {
            Ok(self.organizations.lock().get(&tenant_id).cloned())
        }

        async fn find_user_by_subject(
            &self,
            tenant_id: TenantId,
            subject: &str,
        ) -> AppResult<Option<User>> {
            Ok(self
                .users_by_subject
                .lock()
                .get(&(tenant_id, subject.to_owned()))
                .cloned())
        }

        async fn find_user_by_email(&self, _tenant_id: TenantId, _email: &str) -> AppResult<Option<User>> {
            Ok(None)
        }

        async fn upsert_user(&self, user: User) -> AppResult<User> {
            let subject = user
                .bearer_subject()
                .unwrap_or_else(|| unreachable!())
                .to_owned();
            self.users_by_subject
                .lock()
                .insert((user.org_id(), subject), user.clone());
            Ok(user)
        }

        async fn resolve_api_key(&self, api_key: &str) -> AppResult<Option<TenantId>> {
            Ok(self.api_keys.lock().get(api_key).copied())
        }
    }

    struct FakeVerifier {
        claims: BearerClaims,
    }

    #[async_trait]
    impl BearerVerifier for FakeVerifier {
        async fn verify(&self, _token: &str) -> AppResult<BearerClaims> {
            Ok(self.claims.clone())
        }
    }

    fn active_org(tenant_id: TenantId) -> Organization {
        Organization::new(tenant_id, NonEmptyString::new("Acme").unwrap_or_else(|_| unreachable!()))
    }

    #[tokio::test]
    async fn first_bearer_sighting_jit_provisions_a_user() {
        let tenant_id = TenantId::new();
        let repository = Arc::new(FakeRepository::default());
        repository
            .organizations
            .lock()
            .insert(tenant_id, active_org(tenant_id));

        let verifier = Arc::new(FakeVerifier {
            claims: BearerClaims {
                subject: "sub-123".to_owned(),
                email: Some("person@example.com".to_owned()),
                tenant_id,
            },
        });

        let gate = IdentityGateService::new(repository.clone(), verifier);
        let caller = gate.authenticate_bearer("token").await.unwrap_or_else(|_| unreachable!());
        assert!(caller.internal_user_id().is_some());
        assert_eq!(caller.principal().map(PrincipalId::as_str), Some("sub-123"));

        let provisioned = repository
            .find_user_by_subject(tenant_id, "sub-123")
            .await
            .unwrap_or_else(|_| unreachable!())
            .unwrap_or_else(|| unreachable!());
        assert_eq!(provisioned.external_identity_id(), Some("sub-123"));
    }

    #[tokio::test]
    async fn repeat_bearer_sighting_updates_last_synced_at() {
        let tenant_id = TenantId::new();
        let repository = Arc::new(FakeRepository::default());
        repository
            .organizations
            .lock()
            .insert(tenant_id, active_org(tenant_id));

        let verifier = Arc::new(FakeVerifier {
            claims: BearerClaims {
                subject: "sub-123".to_owned(),
                email: Some("person@example.com".to_owned()),
                tenant_id,
            },
        });

        let gate = IdentityGateService::new(repository.clone(), verifier);
        gate.authenticate_bearer("token").await.unwrap_or_else(|_| unreachable!());
        let first_sync = repository
            .find_user_by_subject(tenant_id, "sub-123")
            .await
            .unwrap_or_else(|_| unreachable!())
            .unwrap_or_else(|| unreachable!())
            .last_synced_at();

        std::thread::sleep(std::time::Duration::from_millis(2));
        gate.authenticate_bearer("token").await.unwrap_or_else(|_| unreachable!());
        let second_sync = repository
            .find_user_by_subject(tenant_id, "sub-123")
            .await
            .unwrap_or_else(|_| unreachable!())
            .unwrap_or_else(|| unreachable!())
            .last_synced_at();

        assert!(second_sync > first_sync);
    }

    #[tokio::test]
    async fn suspended_tenant_is_rejected() {
        let tenant_id = TenantId::new();
        let mut org = active_org(tenant_id);
        org.suspend();
        let repository = Arc::new(FakeRepository::default());
        repository.organizations.lock().insert(tenant_id, org);

        let verifier = Arc::new(FakeVerifier {
            claims: BearerClaims {
                subject: "sub-1".to_owned(),
                email: None,
                tenant_id,
            },
        });

        let gate = IdentityGateService::new(repository, verifier);
        let outcome = gate.authenticate_bearer("token").await;
        assert!(matches!(outcome, Err(AppError::AuthorizationDenied(_))));
    }

    #[tokio::test]
    async fn unknown_api_key_fails_authentication() {
        let repository = Arc::new(FakeRepository::default());
        let verifier = Arc::new(FakeVerifier {
            claims: BearerClaims {
                subject: "unused".to_owned(),
                email: None,
                tenant_id: TenantId::new(),
            },
        });
        let gate = IdentityGateService::new(repository, verifier);
        let outcome = gate.authenticate_api_key("nope").await;
        assert!(matches!(outcome, Err(AppError::AuthenticationFailed(_))));
    }
}
