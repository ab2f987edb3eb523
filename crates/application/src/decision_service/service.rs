use std::time::Instant;

use chrono::Utc;
use qryvanta_core::AppResult;
use qryvanta_domain::{AuditEventType, AuditLog, AuditLogId};

use crate::audit_recorder::AuditRecorder;
use crate::external_policy_adapter::{ExternalPolicyAdapter, PolicyEngineRequest};
use crate::rbac_evaluator::{DecisionOutcome, RbacEvaluator};
use crate::two_tier_cache::{fingerprint, CachedDecision, TwoTierDecisionCache};

use super::request::{DecisionRequest, DecisionResponse};
use super::single_flight::{FlightRole, SingleFlightGroup};

/// What the leader of a single-flight group broadcasts to its followers:
/// either a cacheable decision, or the reason evaluation failed (§4.4,
/// §7 — error decisions are never written to the cache).
#[derive(Clone)]
enum FlightOutcome {
    Decided { cached: CachedDecision, degraded: bool },
    Failed { reason: String },
}

/// Orchestrates a single authorization decision end to end: fingerprint →
/// L1 → L2 → evaluator (RBAC + optional policy) → populate caches → audit
/// (async) → response (§2's control-flow summary).
#[derive(Clone)]
pub struct DecisionService {
    cache: TwoTierDecisionCache,
    evaluator: RbacEvaluator,
    policy_adapter: Option<ExternalPolicyAdapter>,
    audit: AuditRecorder,
    single_flight: SingleFlightGroup<FlightOutcome>,
}

impl DecisionService {
    /// Creates a new decision service. `policy_adapter` is `None` when the
    /// external policy engine is disabled.
    #[must_use]
    pub fn new(
        cache: TwoTierDecisionCache,
        evaluator: RbacEvaluator,
        policy_adapter: Option<ExternalPolicyAdapter>,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            cache,
            evaluator,
            policy_adapter,
            audit,
            single_flight: SingleFlightGroup::default(),
        }
    }

    /// Answers `request`, consulting the cache before re-evaluating, and
    /// enqueues an audit record regardless of cache or error outcome. Any
    /// failure below the rate limiter (which runs ahead of this call, at
    /// the HTTP layer) is folded into an `"error"` decision rather than
    /// propagated, per §7.
    pub async fn decide(&self, request: DecisionRequest) -> AppResult<DecisionResponse> {
        let start = Instant::now();
        let key = fingerprint(
            request.tenant_id,
            &request.principal,
            &request.action,
            &request.resource_type,
            &request.resource_id,
        );

        if let Some(cached) = self.cache.get(&key).await {
            let response = self.to_response(&cached, false, true, start.elapsed().as_millis() as u64);
            self.record_audit(&request, &response);
            return Ok(response);
        }

        let outcome = match self.single_flight.join(&key) {
            FlightRole::Leader => {
                let outcome = self.evaluate_and_populate(&request, &key).await;
                self.single_flight.finish(&key, outcome.clone());
                outcome
            }
            FlightRole::Follower(mut receiver) => receiver.recv().await.unwrap_or_else(|_| FlightOutcome::Failed {
                reason: "single-flight leader dropped result".to_owned(),
            }),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        let response = match outcome {
            FlightOutcome::Decided { cached, degraded } => {
                self.to_response(&cached, degraded, false, elapsed_ms)
            }
            FlightOutcome::Failed { reason } => DecisionResponse {
                decision: "error".to_owned(),
                reason,
                contributing_roles: Vec::new(),
                contributing_permissions: Vec::new(),
                degraded: false,
                from_cache: false,
                evaluation_time_ms: elapsed_ms,
            },
        };
        self.record_audit(&request, &response);
        Ok(response)
    }

    async fn evaluate_and_populate(&self, request: &DecisionRequest, key: &str) -> FlightOutcome {
        match self.evaluate(request).await {
            Ok((cached, degraded)) => {
                self.cache.populate(key, cached.clone()).await;
                FlightOutcome::Decided { cached, degraded }
            }
            Err(error) => FlightOutcome::Failed { reason: error.to_string() },
        }
    }

    async fn evaluate(&self, request: &DecisionRequest) -> AppResult<(CachedDecision, bool)> {
        let rbac = self
            .evaluator
            .evaluate(
                request.tenant_id,
                &request.principal,
                &request.action,
                &request.resource_type,
                &request.resource_id,
            )
            .await?;

        let rbac_allowed = rbac.outcome == DecisionOutcome::Allow;

        let (allowed, degraded) = match &self.policy_adapter {
            None => (rbac_allowed, false),
            Some(adapter) => {
                let policy_request = PolicyEngineRequest {
                    tenant_id: request.tenant_id,
                    principal: request.principal.clone(),
                    action: request.action.clone(),
                    resource_type: request.resource_type.clone(),
                    resource_id: request.resource_id.clone(),
                    context: request.context.clone(),
                    rbac_decision: rbac_allowed,
                };
                let outcome = adapter.evaluate(&policy_request).await;
                (outcome.allowed, outcome.degraded)
            }
        };

        let cached = CachedDecision {
            decision: if allowed { "allow" } else { "deny" }.to_owned(),
            reason: rbac.reason.clone(),
            contributing_roles: rbac.contributing_roles.clone(),
            contributing_permissions: rbac.contributing_permissions.clone(),
            created_at: Utc::now(),
        };

        Ok((cached, degraded))
    }

    fn to_response(
        &self,
        cached: &CachedDecision,
        degraded: bool,
        from_cache: bool,
        evaluation_time_ms: u64,
    ) -> DecisionResponse {
        DecisionResponse {
            decision: cached.decision.clone(),
            reason: cached.reason.clone(),
            contributing_roles: cached.contributing_roles.clone(),
            contributing_permissions: cached.contributing_permissions.clone(),
            degraded,
            from_cache,
            evaluation_time_ms,
        }
    }

    fn record_audit(&self, request: &DecisionRequest, response: &DecisionResponse) {
        let entry = AuditLog::new(
            AuditLogId::new(),
            request.tenant_id,
            Utc::now(),
            AuditEventType::Decision,
            Some(request.principal.as_str().to_owned()),
            None,
            Some(request.resource_type.clone()),
            Some(request.resource_id.clone()),
            request.action.clone(),
            Some(response.decision.clone()),
            Some(response.reason.clone()),
            request.context.clone(),
            serde_json::Value::Null,
            None,
            None,
        );
        self.audit.enqueue(entry);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use parking_lot::Mutex as StdMutex;

    use async_trait::async_trait;
    use qryvanta_core::{AppResult as CoreResult, PrincipalId, TenantId};
    use qryvanta_domain::{
        Effect, Permission, PermissionId, ResourceScope, Role, RoleId, User, UserId, UserRole,
        UserRoleId,
    };
    use serde_json::Value;

    use crate::audit_recorder::AuditRepository;
    use crate::rbac_evaluator::RbacRepository;
    use crate::two_tier_cache::L1Cache;

    use super::*;

    #[derive(Default)]
    struct InMemoryL1 {
        entries: StdMutex<HashMap<String, CachedDecision>>,
    }

    impl L1Cache for InMemoryL1 {
        fn get(&self, key: &str) -> Option<CachedDecision> {
            self.entries.lock().get(key).cloned()
        }

        fn put(&self, key: String, value: CachedDecision) {
            self.entries.lock().insert(key, value);
        }

        fn invalidate_keys(&self, keys: &[String]) {
            let mut entries = self.entries.lock();
            for key in keys {
                entries.remove(key);
            }
        }

        fn invalidate_prefix(&self, prefix: &str) {
            self.entries
                .lock()
                .retain(|key, _| !key.starts_with(prefix));
        }

        fn len(&self) -> usize {
            self.entries.lock().len()
        }
    }

    struct FakeRbacRepository {
        user: User,
        user_roles: Vec<UserRole>,
        roles: HashMap<RoleId, Role>,
        role_permissions: HashMap<RoleId, Vec<Permission>>,
    }

    #[async_trait]
    impl RbacRepository for FakeRbacRepository {
        async fn find_user_by_external_id(
            &self,
            _tenant_id: TenantId,
            _external_id: &str,
        ) -> CoreResult<Option<User>> {
            Ok(Some(self.user.clone()))
        }

        async fn list_user_roles(&self, _user_id: UserId) -> CoreResult<Vec<UserRole>> {
            Ok(self.user_roles.clone())
        }

        async fn find_role(&self, role_id: RoleId) -> CoreResult<Option<Role>> {
            Ok(self.roles.get(&role_id).cloned())
        }

        async fn list_role_permissions(&self, role_id: RoleId) -> CoreResult<Vec<Permission>> {
            Ok(self.role_permissions.get(&role_id).cloned().unwrap_or_default())
        }
    }

    struct FailingRbacRepository;

    #[async_trait]
    impl RbacRepository for FailingRbacRepository {
        async fn find_user_by_external_id(
            &self,
            _tenant_id: TenantId,
            _external_id: &str,
        ) -> CoreResult<Option<User>> {
            Err(qryvanta_core::AppError::StorageError("connection reset".to_owned()))
        }

        async fn list_user_roles(&self, _user_id: UserId) -> CoreResult<Vec<UserRole>> {
            Ok(Vec::new())
        }

        async fn find_role(&self, _role_id: RoleId) -> CoreResult<Option<Role>> {
            Ok(None)
        }

        async fn list_role_permissions(&self, _role_id: RoleId) -> CoreResult<Vec<Permission>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct FakeAuditRepository {
        written: StdMutex<Vec<AuditLog>>,
    }

    #[async_trait]
    impl AuditRepository for FakeAuditRepository {
        async fn append(&self, entry: AuditLog) -> CoreResult<()> {
            self.written.lock().push(entry);
            Ok(())
        }

        async fn list_recent_entries(
            &self,
            _tenant_id: TenantId,
            _query: crate::audit_recorder::AuditLogQuery,
        ) -> CoreResult<Vec<AuditLog>> {
            Ok(Vec::new())
        }

        async fn export_entries(
            &self,
            _tenant_id: TenantId,
            _query: crate::audit_recorder::AuditLogQuery,
        ) -> CoreResult<Vec<AuditLog>> {
            Ok(Vec::new())
        }

        async fn purge_entries_older_than(
            &self,
            _tenant_id: TenantId,
            _cutoff: chrono::DateTime<Utc>,
        ) -> CoreResult<u64> {
            Ok(0)
        }
    }

    fn build_service() -> DecisionService {
        let tenant_id = TenantId::new();
        let user = User::new(
            UserId::new(),
            tenant_id,
            qryvanta_domain::EmailAddress::new("viewer@example.com").unwrap_or_else(|_| unreachable!()),
            None,
            Some("viewer-ext".to_owned()),
            None,
        );
        let role = Role::root(RoleId::new(), tenant_id, "viewer", "Viewer", false).unwrap_or_else(|_| unreachable!());
        let permission = Permission::new(
            PermissionId::new(),
            tenant_id,
            "document-read",
            "document",
            "read",
            Effect::Allow,
        )
        .unwrap_or_else(|_| unreachable!());
        let user_role = UserRole::new(
            UserRoleId::new(),
            user.id(),
            role.id(),
            ResourceScope::Global,
            None,
            Utc::now(),
            None,
        );

        let mut roles = HashMap::new();
        roles.insert(role.id(), role.clone());
        let mut role_permissions = HashMap::new();
        role_permissions.insert(role.id(), vec![permission]);

        let repository = Arc::new(FakeRbacRepository {
            user,
            user_roles: vec![user_role],
            roles,
            role_permissions,
        });

        let evaluator = RbacEvaluator::new(repository);
        let cache = TwoTierDecisionCache::new(Arc::new(InMemoryL1::default()), None);
        let audit = AuditRecorder::spawn(Arc::new(FakeAuditRepository::default()), 1);

        DecisionService::new(cache, evaluator, None, audit)
    }

    fn sample_request(tenant_id: TenantId) -> DecisionRequest {
        DecisionRequest {
            tenant_id,
            principal: PrincipalId::new("viewer-ext").unwrap_or_else(|_| unreachable!()),
            action: "read".to_owned(),
            resource_type: "document".to_owned(),
            resource_id: "doc-1".to_owned(),
            context: Value::Null,
        }
    }

    #[tokio::test]
    async fn repository_failure_surfaces_as_error_decision_not_an_error_result() {
        let cache = TwoTierDecisionCache::new(Arc::new(InMemoryL1::default()), None);
        let audit = AuditRecorder::spawn(Arc::new(FakeAuditRepository::default()), 1);
        let evaluator = RbacEvaluator::new(Arc::new(FailingRbacRepository));
        let service = DecisionService::new(cache, evaluator, None, audit);

        let tenant_id = TenantId::new();
        let response = service
            .decide(sample_request(tenant_id))
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(response.decision, "error");
        assert!(!response.allowed());
        assert!(response.reason.contains("connection reset"));
    }

    #[tokio::test]
    async fn first_call_misses_and_second_call_hits_cache() {
        let service = build_service();
        let tenant_id = TenantId::new();
        let request = sample_request(tenant_id);

        let first = service.decide(request.clone()).await;
        // The fake repository ignores tenant_id mismatches, so this always
        // resolves the same fixed user; we only assert on cache behavior.
        assert!(first.is_ok());
        let first = first.unwrap_or_else(|_| unreachable!());
        assert!(!first.from_cache);

        let second = service.decide(request).await.unwrap_or_else(|_| unreachable!());
        assert!(second.from_cache);
        assert_eq!(second.decision, first.decision);
    }
}
