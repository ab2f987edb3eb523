use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use qryvanta_core::{AppResult, PrincipalId, TenantId};
use qryvanta_domain::{Effect, Permission, Role, RoleId, UserRole};

use super::closure::resolve_closure;
use super::ports::{now, RbacRepository};

/// The outcome of an RBAC evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// The principal may perform the action.
    Allow,
    /// The principal may not perform the action.
    Deny,
}

/// A fully-reasoned RBAC decision, suitable for caching and for populating
/// the wire response's `contributingRoles`/`contributingPermissions`.
#[derive(Debug, Clone)]
pub struct RbacDecision {
    /// Whether access is granted.
    pub outcome: DecisionOutcome,
    /// Deterministic, human-readable reason string.
    pub reason: String,
    /// Roles that contributed to the final decision.
    pub contributing_roles: Vec<String>,
    /// Permissions that contributed to the final decision.
    pub contributing_permissions: Vec<String>,
}

impl RbacDecision {
    fn deny(reason: impl Into<String>) -> Self {
        Self {
            outcome: DecisionOutcome::Deny,
            reason: reason.into(),
            contributing_roles: Vec::new(),
            contributing_permissions: Vec::new(),
        }
    }
}

/// The RBAC evaluation engine: user→roles→(hierarchy closure)→
/// role-permissions→decision, with resource-scope matching, per §4.2.
#[derive(Clone)]
pub struct RbacEvaluator {
    repository: Arc<dyn RbacRepository>,
}

impl RbacEvaluator {
    /// Creates a new evaluator over the given repository.
    #[must_use]
    pub fn new(repository: Arc<dyn RbacRepository>) -> Self {
        Self { repository }
    }

    /// Evaluates whether `principal` may perform `action` on
    /// `(resource_type, resource_id)` within `tenant_id`.
    pub async fn evaluate(
        &self,
        tenant_id: TenantId,
        principal: &PrincipalId,
        action: &str,
        resource_type: &str,
        resource_id: &str,
    ) -> AppResult<RbacDecision> {
        let Some(user) = self
            .repository
            .find_user_by_external_id(tenant_id, principal.as_str())
            .await?
        else {
            return Ok(RbacDecision::deny("user not found"));
        };

        if !user.is_active() {
            return Ok(RbacDecision::deny("user inactive"));
        }

        let now = now();
        let user_roles: Vec<UserRole> = self
            .repository
            .list_user_roles(user.id())
            .await?
            .into_iter()
            .filter(|user_role| !user_role.is_expired(now))
            .collect();

        if user_roles.is_empty() {
            return Ok(RbacDecision::deny("no roles"));
        }

        let root_role_ids: Vec<RoleId> = user_roles.iter().map(UserRole::role_id).collect();
        let closure = resolve_closure(self.repository.as_ref(), root_role_ids.clone()).await?;
        let role_map: HashMap<RoleId, Role> =
            closure.iter().map(|role| (role.id(), role.clone())).collect();

        let mut matching_permissions: Vec<(Role, Permission)> = Vec::new();
        for role in &closure {
            let permissions = self.repository.list_role_permissions(role.id()).await?;
            for permission in permissions {
                if permission.matches(resource_type, action) {
                    matching_permissions.push((role.clone(), permission));
                }
            }
        }

        if matching_permissions
            .iter()
            .any(|(_, permission)| permission.effect() == Effect::Deny)
        {
            return Ok(RbacDecision::deny(format!(
                "denied: {resource_type}:{action}"
            )));
        }

        let allow_matches: Vec<&(Role, Permission)> = matching_permissions
            .iter()
            .filter(|(_, permission)| permission.effect() == Effect::Allow)
            .collect();

        if allow_matches.is_empty() {
            return Ok(RbacDecision::deny(format!(
                "lacks {resource_type}:{action}"
            )));
        }

        // A directly-assigned UserRole contributes a given allow match only
        // if that match's role is an ancestor-or-self of the UserRole's own
        // role (i.e. reachable by walking the UserRole's own closure, not
        // the merged closure of every role the user holds), and its scope
        // admits the requested resource. Per §4.2 step 7.
        let resolved: Vec<&(Role, Permission)> = allow_matches
            .iter()
            .copied()
            .filter(|(role, _)| {
                user_roles.iter().any(|user_role| {
                    ancestor_ids(user_role.role_id(), &role_map).contains(&role.id())
                        && user_role.scope().matches(resource_type, resource_id)
                })
            })
            .collect();

        if resolved.is_empty() {
            return Ok(RbacDecision::deny("role not scoped to resource"));
        }

        let (role, permission) = resolved[0];
        Ok(RbacDecision {
            outcome: DecisionOutcome::Allow,
            reason: format!("{}: {}", role.name(), permission.name()),
            contributing_roles: resolved
                .iter()
                .map(|(role, _)| role.name().to_owned())
                .collect(),
            contributing_permissions: resolved
                .iter()
                .map(|(_, permission)| permission.name().to_owned())
                .collect(),
        })
    }
}

/// Walks `role_id` and its ancestors (via the parent pointer) within
/// `role_map`, returning the closed set including `role_id` itself.
/// Cycle-safe via the visited set; bounded by `role_map`'s own size.
fn ancestor_ids(role_id: RoleId, role_map: &HashMap<RoleId, Role>) -> HashSet<RoleId> {
    let mut visited = HashSet::new();
    let mut current = Some(role_id);

    while let Some(id) = current {
        if !visited.insert(id) {
            break;
        }
        current = role_map.get(&id).and_then(Role::parent_id);
    }

    visited
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use parking_lot::Mutex;

    use async_trait::async_trait;
    use qryvanta_core::TenantId;
    use qryvanta_domain::{EmailAddress, PermissionId, ResourceScope, User, UserId, UserRoleId};

    use super::*;

    #[derive(Default)]
    struct FakeRbacRepository {
        users_by_external_id: Mutex<HashMap<(TenantId, String), User>>,
        user_roles: Mutex<HashMap<UserId, Vec<UserRole>>>,
        roles: Mutex<HashMap<RoleId, Role>>,
        role_permissions: Mutex<HashMap<RoleId, Vec<Permission>>>,
    }

    #[async_trait]
    impl RbacRepository for FakeRbacRepository {
        async fn find_user_by_external_id(
            &self,
            tenant_id: TenantId,
            external_id: &str,
        ) -> AppResult<Option<User>> {
            Ok(self
                .users_by_external_id
                .lock()
                .get(&(tenant_id, external_id.to_owned()))
                .cloned())
        }

        async fn list_user_roles(&self, user_id: UserId) -> AppResult<Vec<UserRole>> {
            Ok(self
                .user_roles
                .lock()
                .get(&user_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
            Ok(self.roles.lock().get(&role_id).cloned())
        }

        async fn list_role_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
            Ok(self
                .role_permissions
                .lock()
                .get(&role_id)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn sample_user(tenant_id: TenantId, external_id: &str) -> User {
        User::new(
            UserId::new(),
            tenant_id,
            EmailAddress::new("u@example.com").unwrap_or_else(|_| unreachable!()),
            None,
            Some(external_id.to_owned()),
            None,
        )
    }

    #[tokio::test]
    async fn s1_allow_via_direct_role_permission() {
        let tenant_id = TenantId::new();
        let user = sample_user(tenant_id, "u-ext-1");
        let viewer =
            Role::root(RoleId::new(), tenant_id, "viewer", "Viewer", false).unwrap_or_else(|_| unreachable!());
        let permission = Permission::new(
            PermissionId::new(),
            tenant_id,
            "document:read",
            "document",
            "read",
            Effect::Allow,
        )
        .unwrap_or_else(|_| unreachable!());

        let repository = FakeRbacRepository::default();
        repository
            .users_by_external_id
            .lock()
            .insert((tenant_id, "u-ext-1".to_owned()), user.clone());
        repository.roles.lock().insert(viewer.id(), viewer.clone());
        repository.user_roles.lock().insert(
            user.id(),
            vec![UserRole::new(
                UserRoleId::new(),
                user.id(),
                viewer.id(),
                ResourceScope::Global,
                None,
                chrono::Utc::now(),
                None,
            )],
        );
        repository
            .role_permissions
            .lock()
            .insert(viewer.id(), vec![permission]);

        let evaluator = RbacEvaluator::new(Arc::new(repository));
        let principal = PrincipalId::new("u-ext-1").unwrap_or_else(|_| unreachable!());
        let decision = evaluator
            .evaluate(tenant_id, &principal, "read", "document", "doc-1")
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(decision.outcome, DecisionOutcome::Allow);
        assert!(decision.reason.contains("viewer"));
        assert!(decision.reason.contains("document:read"));
    }

    #[tokio::test]
    async fn s2_deny_when_permission_set_is_empty() {
        let tenant_id = TenantId::new();
        let user = sample_user(tenant_id, "u-ext-1");
        let viewer =
            Role::root(RoleId::new(), tenant_id, "viewer", "Viewer", false).unwrap_or_else(|_| unreachable!());

        let repository = FakeRbacRepository::default();
        repository
            .users_by_external_id
            .lock()
            .insert((tenant_id, "u-ext-1".to_owned()), user.clone());
        repository.roles.lock().insert(viewer.id(), viewer.clone());
        repository.user_roles.lock().insert(
            user.id(),
            vec![UserRole::new(
                UserRoleId::new(),
                user.id(),
                viewer.id(),
                ResourceScope::Global,
                None,
                chrono::Utc::now(),
                None,
            )],
        );

        let evaluator = RbacEvaluator::new(Arc::new(repository));
        let principal = PrincipalId::new("u-ext-1").unwrap_or_else(|_| unreachable!());
        let decision = evaluator
            .evaluate(tenant_id, &principal, "read", "document", "doc-1")
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(decision.outcome, DecisionOutcome::Deny);
        assert!(decision.reason.contains("lacks"));
        assert!(decision.reason.contains("document:read"));
    }

    #[tokio::test]
    async fn s3_allow_via_hierarchy_closure() {
        let tenant_id = TenantId::new();
        let user = sample_user(tenant_id, "u-ext-1");
        let admin =
            Role::root(RoleId::new(), tenant_id, "admin", "Admin", false).unwrap_or_else(|_| unreachable!());
        let viewer = Role::child_of(RoleId::new(), tenant_id, "viewer", "Viewer", &admin, false)
            .unwrap_or_else(|_| unreachable!());
        let permission = Permission::new(
            PermissionId::new(),
            tenant_id,
            "document:read",
            "document",
            "read",
            Effect::Allow,
        )
        .unwrap_or_else(|_| unreachable!());

        let repository = FakeRbacRepository::default();
        repository
            .users_by_external_id
            .lock()
            .insert((tenant_id, "u-ext-1".to_owned()), user.clone());
        repository.roles.lock().insert(admin.id(), admin.clone());
        repository.roles.lock().insert(viewer.id(), viewer.clone());
        repository.user_roles.lock().insert(
            user.id(),
            vec![UserRole::new(
                UserRoleId::new(),
                user.id(),
                viewer.id(),
                ResourceScope::Global,
                None,
                chrono::Utc::now(),
                None,
            )],
        );
        repository
            .role_permissions
            .lock()
            .insert(admin.id(), vec![permission]);

        let evaluator = RbacEvaluator::new(Arc::new(repository));
        let principal = PrincipalId::new("u-ext-1").unwrap_or_else(|_| unreachable!());
        let decision = evaluator
            .evaluate(tenant_id, &principal, "read", "document", "doc-1")
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(decision.outcome, DecisionOutcome::Allow);
    }

    #[tokio::test]
    async fn deny_over_allow_wins_when_both_present() {
        let tenant_id = TenantId::new();
        let user = sample_user(tenant_id, "u-ext-1");
        let viewer =
            Role::root(RoleId::new(), tenant_id, "viewer", "Viewer", false).unwrap_or_else(|_| unreachable!());
        let allow_permission = Permission::new(
            PermissionId::new(),
            tenant_id,
            "document:read-allow",
            "document",
            "read",
            Effect::Allow,
        )
        .unwrap_or_else(|_| unreachable!());
        let deny_permission = Permission::new(
            PermissionId::new(),
            tenant_id,
            "document:read-deny",
            "document",
            "read",
            Effect::Deny,
        )
        .unwrap_or_else(|_| unreachable!());

        let repository = FakeRbacRepository::default();
        repository
            .users_by_external_id
            .lock()
            .insert((tenant_id, "u-ext-1".to_owned()), user.clone());
        repository.roles.lock().insert(viewer.id(), viewer.clone());
        repository.user_roles.lock().insert(
            user.id(),
            vec![UserRole::new(
                UserRoleId::new(),
                user.id(),
                viewer.id(),
                ResourceScope::Global,
                None,
                chrono::Utc::now(),
                None,
            )],
        );
        repository.role_permissions.lock().insert(
            viewer.id(),
            vec![allow_permission, deny_permission],
        );

        let evaluator = RbacEvaluator::new(Arc::new(repository));
        let principal = PrincipalId::new("u-ext-1").unwrap_or_else(|_| unreachable!());
        let decision = evaluator
            .evaluate(tenant_id, &principal, "read", "document", "doc-1")
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(decision.outcome, DecisionOutcome::Deny);
    }

    #[tokio::test]
    async fn instance_scope_rejects_mismatched_resource_id() {
        let tenant_id = TenantId::new();
        let user = sample_user(tenant_id, "u-ext-1");
        let viewer =
            Role::root(RoleId::new(), tenant_id, "viewer", "Viewer", false).unwrap_or_else(|_| unreachable!());
        let permission = Permission::new(
            PermissionId::new(),
            tenant_id,
            "document:read",
            "document",
            "read",
            Effect::Allow,
        )
        .unwrap_or_else(|_| unreachable!());

        let repository = FakeRbacRepository::default();
        repository
            .users_by_external_id
            .lock()
            .insert((tenant_id, "u-ext-1".to_owned()), user.clone());
        repository.roles.lock().insert(viewer.id(), viewer.clone());
        repository.user_roles.lock().insert(
            user.id(),
            vec![UserRole::new(
                UserRoleId::new(),
                user.id(),
                viewer.id(),
                ResourceScope::Instance {
                    resource_type: "document".to_owned(),
                    resource_id: "doc-1".to_owned(),
                },
                None,
                chrono::Utc::now(),
                None,
            )],
        );
        repository
            .role_permissions
            .lock()
            .insert(viewer.id(), vec![permission]);

        let evaluator = RbacEvaluator::new(Arc::new(repository));
        let principal = PrincipalId::new("u-ext-1").unwrap_or_else(|_| unreachable!());
        let decision = evaluator
            .evaluate(tenant_id, &principal, "read", "document", "doc-2")
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(decision.outcome, DecisionOutcome::Deny);
        assert!(decision.reason.contains("not scoped"));
    }

    #[tokio::test]
    async fn unrelated_global_role_does_not_widen_an_unrelated_scoped_grant() {
        let tenant_id = TenantId::new();
        let user = sample_user(tenant_id, "u-ext-1");
        let auditor =
            Role::root(RoleId::new(), tenant_id, "auditor", "Auditor", false).unwrap_or_else(|_| unreachable!());
        let report_viewer = Role::root(RoleId::new(), tenant_id, "report-viewer", "Report Viewer", false)
            .unwrap_or_else(|_| unreachable!());
        let report_read = Permission::new(
            PermissionId::new(),
            tenant_id,
            "report:read",
            "report",
            "read",
            Effect::Allow,
        )
        .unwrap_or_else(|_| unreachable!());

        let repository = FakeRbacRepository::default();
        repository
            .users_by_external_id
            .lock()
            .insert((tenant_id, "u-ext-1".to_owned()), user.clone());
        repository.roles.lock().insert(auditor.id(), auditor.clone());
        repository
            .roles
            .lock()
            .insert(report_viewer.id(), report_viewer.clone());
        repository.user_roles.lock().insert(
            user.id(),
            vec![
                UserRole::new(
                    UserRoleId::new(),
                    user.id(),
                    auditor.id(),
                    ResourceScope::Global,
                    None,
                    chrono::Utc::now(),
                    None,
                ),
                UserRole::new(
                    UserRoleId::new(),
                    user.id(),
                    report_viewer.id(),
                    ResourceScope::Instance {
                        resource_type: "report".to_owned(),
                        resource_id: "report-42".to_owned(),
                    },
                    None,
                    chrono::Utc::now(),
                    None,
                ),
            ],
        );
        repository
            .role_permissions
            .lock()
            .insert(report_viewer.id(), vec![report_read]);

        let evaluator = RbacEvaluator::new(Arc::new(repository));
        let principal = PrincipalId::new("u-ext-1").unwrap_or_else(|_| unreachable!());
        let decision = evaluator
            .evaluate(tenant_id, &principal, "read", "report", "report-999")
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(decision.outcome, DecisionOutcome::Deny);
        assert!(decision.reason.contains("not scoped"));
    }

    #[tokio::test]
    async fn s5_no_roles_denies_with_reason() {
        let tenant_id = TenantId::new();
        let user = sample_user(tenant_id, "u-ext-1");

        let repository = FakeRbacRepository::default();
        repository
            .users_by_external_id
            .lock()
            .insert((tenant_id, "u-ext-1".to_owned()), user);

        let evaluator = RbacEvaluator::new(Arc::new(repository));
        let principal = PrincipalId::new("u-ext-1").unwrap_or_else(|_| unreachable!());
        let decision = evaluator
            .evaluate(tenant_id, &principal, "read", "document", "doc-1")
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(decision.outcome, DecisionOutcome::Deny);
        assert_eq!(decision.reason, "no roles");
    }

    #[tokio::test]
    async fn expired_user_role_does_not_contribute() {
        let tenant_id = TenantId::new();
        let user = sample_user(tenant_id, "u-ext-1");
        let viewer =
            Role::root(RoleId::new(), tenant_id, "viewer", "Viewer", false).unwrap_or_else(|_| unreachable!());
        let permission = Permission::new(
            PermissionId::new(),
            tenant_id,
            "document:read",
            "document",
            "read",
            Effect::Allow,
        )
        .unwrap_or_else(|_| unreachable!());

        let repository = FakeRbacRepository::default();
        repository
            .users_by_external_id
            .lock()
            .insert((tenant_id, "u-ext-1".to_owned()), user.clone());
        repository.roles.lock().insert(viewer.id(), viewer.clone());
        repository.user_roles.lock().insert(
            user.id(),
            vec![UserRole::new(
                UserRoleId::new(),
                user.id(),
                viewer.id(),
                ResourceScope::Global,
                None,
                chrono::Utc::now() - chrono::Duration::hours(2),
                Some(chrono::Utc::now() - chrono::Duration::hours(1)),
            )],
        );
        repository
            .role_permissions
            .lock()
            .insert(viewer.id(), vec![permission]);

        let evaluator = RbacEvaluator::new(Arc::new(repository));
        let principal = PrincipalId::new("u-ext-1").unwrap_or_else(|_| unreachable!());
        let decision = evaluator
            .evaluate(tenant_id, &principal, "read", "document", "doc-1")
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(decision.outcome, DecisionOutcome::Deny);
        assert_eq!(decision.reason, "no roles");
    }
}
