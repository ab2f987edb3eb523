use std::sync::Arc;

use chrono::Utc;
use qryvanta_core::{AppError, AppResult, TenantId};
use qryvanta_domain::{Policy, PolicyId, PolicyType, PolicyVersion};

use super::ports::{PolicyRepository, PolicyVersionRepository, RegoCompilerClient};
use super::validator::{denylist_violations, missing_package_declaration, unbalanced_delimiter_violations};

/// Orchestrates policy creation, content versioning, validation, and the
/// Draft→Active→Archived lifecycle (§4.5).
#[derive(Clone)]
pub struct PolicyLifecycleService {
    policies: Arc<dyn PolicyRepository>,
    versions: Arc<dyn PolicyVersionRepository>,
    compiler: Option<Arc<dyn RegoCompilerClient>>,
}

impl PolicyLifecycleService {
    /// Creates a new service. `compiler` is optional; when absent (or on
    /// transport failure) validation falls back to the local structural
    /// check.
    #[must_use]
    pub fn new(
        policies: Arc<dyn PolicyRepository>,
        versions: Arc<dyn PolicyVersionRepository>,
        compiler: Option<Arc<dyn RegoCompilerClient>>,
    ) -> Self {
        Self {
            policies,
            versions,
            compiler,
        }
    }

    /// Lists a tenant's policies.
    pub async fn list_policies(&self, tenant_id: TenantId) -> AppResult<Vec<Policy>> {
        self.policies.list(tenant_id).await
    }

    /// Looks up a single policy.
    pub async fn get_policy(&self, tenant_id: TenantId, policy_id: PolicyId) -> AppResult<Policy> {
        self.policies
            .find(tenant_id, policy_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("policy {policy_id}")))
    }

    /// Lists every version recorded for a policy, oldest first.
    pub async fn list_versions(&self, policy_id: PolicyId) -> AppResult<Vec<PolicyVersion>> {
        self.versions.list(policy_id).await
    }

    /// Creates a new policy with its first version and runs validation.
    pub async fn create_policy(
        &self,
        tenant_id: TenantId,
        name: String,
        display_name: String,
        policy_type: PolicyType,
        content: String,
    ) -> AppResult<(Policy, PolicyVersion)> {
        let policy = Policy::new(PolicyId::new(), tenant_id, name, display_name, policy_type)?;
        let policy = self.policies.insert(policy).await?;
        let version = self.validate_and_store(&policy, policy.current_version(), content).await?;
        Ok((policy, version))
    }

    /// Appends a new version to an already-versioned policy, advancing
    /// `current_version` to `max + 1`.
    pub async fn add_version(
        &self,
        policy: &Policy,
        content: String,
    ) -> AppResult<(Policy, PolicyVersion)> {
        let next_version = policy.current_version() + 1;
        let version = self.validate_and_store(policy, next_version, content).await?;

        let mut updated = policy.clone();
        updated.advance_version(next_version)?;
        let updated = self.policies.update(updated).await?;

        Ok((updated, version))
    }

    /// Validates `content` and persists it as `version_number` of `policy`.
    async fn validate_and_store(
        &self,
        policy: &Policy,
        version_number: u32,
        content: String,
    ) -> AppResult<PolicyVersion> {
        if policy.policy_type() == PolicyType::Cedar {
            return Err(AppError::Validation(
                "cedar validation is unsupported".to_owned(),
            ));
        }

        let mut version = PolicyVersion::new(
            qryvanta_domain::PolicyVersionId::new(),
            policy.id(),
            version_number,
            content,
            Utc::now(),
        );

        let errors = self.validate(version.content()).await;
        if errors.is_empty() {
            version.mark_valid();
        } else {
            version.mark_invalid(errors);
        }

        self.versions.insert(version).await
    }

    /// Runs the §4.5 validation pipeline and returns structured errors
    /// (empty means valid). Step 1 (empty content, missing `package`) runs
    /// unconditionally; it is never skipped by compiler delegation.
    async fn validate(&self, content: &str) -> Vec<String> {
        if content.trim().is_empty() {
            return vec!["policy content must not be empty".to_owned()];
        }

        let mut errors: Vec<String> = missing_package_declaration(content).into_iter().collect();
        errors.extend(denylist_violations(content));
        if !errors.is_empty() {
            return errors;
        }

        match &self.compiler {
            Some(compiler) => match compiler.compile(content).await {
                Ok(compile_errors) => errors.extend(compile_errors),
                Err(_) => errors.extend(unbalanced_delimiter_violations(content)),
            },
            None => errors.extend(unbalanced_delimiter_violations(content)),
        }

        errors
    }

    /// Publishes `policy`'s current version. Requires the current version
    /// to be `valid`; refuses otherwise per §4.5 step 4.
    pub async fn publish(
        &self,
        tenant_id: TenantId,
        policy_id: PolicyId,
    ) -> AppResult<Policy> {
        let mut policy = self
            .policies
            .find(tenant_id, policy_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("policy {policy_id}")))?;

        let current = self
            .versions
            .find_current(policy_id, policy.current_version())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("policy {policy_id} has no current version")))?;

        if !current.is_publishable() {
            return Err(AppError::PreconditionFailed {
                current: current.validation_status().as_str().to_owned(),
                required: "valid".to_owned(),
            });
        }

        policy.publish()?;
        let policy = self.policies.update(policy).await?;

        let mut current = current;
        current.mark_published(Utc::now());
        self.versions.update(current).await?;

        Ok(policy)
    }

    /// Archives `policy`, taking it out of the serving set.
    pub async fn archive(&self, tenant_id: TenantId, policy_id: PolicyId) -> AppResult<Policy> {
        let mut policy = self
            .policies
            .find(tenant_id, policy_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("policy {policy_id}")))?;
        policy.archive()?;
        self.policies.update(policy).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use parking_lot::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct FakePolicyRepository {
        rows: Mutex<HashMap<PolicyId, Policy>>,
    }

    #[async_trait]
    impl PolicyRepository for FakePolicyRepository {
        async fn find(&self, _tenant_id: TenantId, policy_id: PolicyId) -> AppResult<Option<Policy>> {
            Ok(self.rows.lock().get(&policy_id).cloned())
        }

        async fn list(&self, tenant_id: TenantId) -> AppResult<Vec<Policy>> {
            Ok(self
                .rows
                .lock()
                .values()
                .filter(|p| p.org_id() == tenant_id)
                .cloned()
                .collect())
        }

        async fn insert(&self, policy: Policy) -> AppResult<Policy> {
            self.rows.lock().insert(policy.id(), policy.clone());
            Ok(policy)
        }

        async fn update(&self, policy: Policy) -> AppResult<Policy> {
            self.rows.lock().insert(policy.id(), policy.clone());
            Ok(policy)
        }
    }

    #[derive(Default)]
    struct FakeVersionRepository {
        rows: Mutex<HashMap<qryvanta_domain::PolicyVersionId, PolicyVersion>>,
    }

    #[async_trait]
    impl PolicyVersionRepository for FakeVersionRepository {
        async fn insert(&self, version: PolicyVersion) -> AppResult<PolicyVersion> {
            self.rows.lock().insert(version.id(), version.clone());
            Ok(version)
        }

        async fn update(&self, version: PolicyVersion) -> AppResult<PolicyVersion> {
            self.rows.lock().insert(version.id(), version.clone());
            Ok(version)
        }

        async fn find_current(
            &self,
            policy_id: PolicyId,
            version: u32,
        ) -> AppResult<Option<PolicyVersion>> {
            Ok(self
                .rows
                .lock()
                .values()
                .find(|v| v.policy_id() == policy_id && v.version() == version)
                .cloned())
        }

        async fn list(&self, policy_id: PolicyId) -> AppResult<Vec<PolicyVersion>> {
            Ok(self
                .rows
                .lock()
                .values()
                .filter(|v| v.policy_id() == policy_id)
                .cloned()
                .collect())
        }
    }

    fn service() -> PolicyLifecycleService {
        PolicyLifecycleService::new(
            Arc::new(FakePolicyRepository::default()),
            Arc::new(FakeVersionRepository::default()),
            None,
        )
    }

    struct PermissiveCompiler;

    #[async_trait]
    impl RegoCompilerClient for PermissiveCompiler {
        async fn compile(&self, _content: &str) -> AppResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn missing_package_declaration_is_rejected_even_when_compiler_accepts_it() {
        let service = PolicyLifecycleService::new(
            Arc::new(FakePolicyRepository::default()),
            Arc::new(FakeVersionRepository::default()),
            Some(Arc::new(PermissiveCompiler)),
        );

        let (_policy, version) = service
            .create_policy(
                TenantId::new(),
                "edge".to_owned(),
                "Edge".to_owned(),
                PolicyType::Rego,
                "allow := true\n".to_owned(),
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(version.validation_status(), qryvanta_domain::ValidationStatus::Invalid);
        assert!(version
            .validation_errors()
            .unwrap_or_default()
            .iter()
            .any(|e| e.contains("package")));
    }

    #[tokio::test]
    async fn s6_denylisted_import_marks_invalid_and_refuses_publish() {
        let service = service();
        let (policy, version) = service
            .create_policy(
                TenantId::new(),
                "edge".to_owned(),
                "Edge".to_owned(),
                PolicyType::Rego,
                "package edge\nallow { http.send({}) }\n".to_owned(),
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(version.validation_status(), qryvanta_domain::ValidationStatus::Invalid);

        let outcome = service.publish(policy.org_id(), policy.id()).await;
        assert!(matches!(outcome, Err(AppError::PreconditionFailed { .. })));
    }

    #[tokio::test]
    async fn clean_policy_validates_and_publishes() {
        let service = service();
        let (policy, version) = service
            .create_policy(
                TenantId::new(),
                "edge".to_owned(),
                "Edge".to_owned(),
                PolicyType::Rego,
                "package edge\nallow := true\n".to_owned(),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(version.validation_status(), qryvanta_domain::ValidationStatus::Valid);

        let published = service
            .publish(policy.org_id(), policy.id())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(published.status(), qryvanta_domain::PolicyStatus::Active);
    }

    #[tokio::test]
    async fn archived_policy_can_be_republished_through_the_service() {
        let service = service();
        let (policy, _version) = service
            .create_policy(
                TenantId::new(),
                "edge".to_owned(),
                "Edge".to_owned(),
                PolicyType::Rego,
                "package edge\nallow := true\n".to_owned(),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        service.publish(policy.org_id(), policy.id()).await.unwrap_or_else(|_| unreachable!());
        service.archive(policy.org_id(), policy.id()).await.unwrap_or_else(|_| unreachable!());
        let republished = service
            .publish(policy.org_id(), policy.id())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(republished.status(), qryvanta_domain::PolicyStatus::Active);
    }
}
