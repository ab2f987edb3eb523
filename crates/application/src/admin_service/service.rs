use std::sync::Arc;

use chrono::{DateTime, Utc};
use qryvanta_core::{AppError, AppResult, NonEmptyString, PrincipalId, TenantId};
use qryvanta_domain::{
    AuditEventType, AuditLog, AuditLogId, Effect, Organization, Permission, PermissionId, Role,
    RoleId, RolePermission, RolePermissionId, User, UserId, UserRole, UserRoleId,
};
use serde_json::Value;

use crate::audit_recorder::AuditRecorder;
use crate::mutation_event_bus::{MutationEvent, MutationEventBus};
use crate::rbac_evaluator::{DecisionOutcome, RbacEvaluator};

use super::ports::{
    OrganizationRepository, PermissionRepository, RolePermissionRepository, RoleRepository,
    UserRepository, UserRoleRepository,
};

/// Thin application services over the Data Model Store, one per aggregate,
/// mirroring the teacher's `security_admin_service.rs` shape: authorize via
/// the same RBAC Evaluator used for decisions, mutate, publish a mutation
/// event, enqueue an audit entry (§4.9). No admin mutation bypasses the
/// event bus.
#[derive(Clone)]
pub struct AdminService {
    evaluator: RbacEvaluator,
    events: MutationEventBus,
    audit: AuditRecorder,
    organizations: Arc<dyn OrganizationRepository>,
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    permissions: Arc<dyn PermissionRepository>,
    role_permissions: Arc<dyn RolePermissionRepository>,
    user_roles: Arc<dyn UserRoleRepository>,
}

#[allow(clippy::too_many_arguments)]
impl AdminService {
    /// Creates a new admin service from required dependencies.
    #[must_use]
    pub fn new(
        evaluator: RbacEvaluator,
        events: MutationEventBus,
        audit: AuditRecorder,
        organizations: Arc<dyn OrganizationRepository>,
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        permissions: Arc<dyn PermissionRepository>,
        role_permissions: Arc<dyn RolePermissionRepository>,
        user_roles: Arc<dyn UserRoleRepository>,
    ) -> Self {
        Self {
            evaluator,
            events,
            audit,
            organizations,
            users,
            roles,
            permissions,
            role_permissions,
            user_roles,
        }
    }

    async fn require_permission(
        &self,
        tenant_id: TenantId,
        actor: &PrincipalId,
        aggregate: &str,
    ) -> AppResult<()> {
        let decision = self
            .evaluator
            .evaluate(tenant_id, actor, "manage", "security", aggregate)
            .await?;

        if decision.outcome == DecisionOutcome::Allow {
            Ok(())
        } else {
            Err(AppError::AuthorizationDenied(decision.reason))
        }
    }

    fn record_mutation(
        &self,
        tenant_id: TenantId,
        actor: &PrincipalId,
        resource_type: &str,
        resource_id: &str,
        action: &str,
    ) {
        let entry = AuditLog::new(
            AuditLogId::new(),
            tenant_id,
            Utc::now(),
            AuditEventType::AdminMutation,
            Some(actor.as_str().to_owned()),
            None,
            Some(resource_type.to_owned()),
            Some(resource_id.to_owned()),
            action.to_owned(),
            None,
            None,
            Value::Null,
            Value::Null,
            None,
            None,
        );
        self.audit.enqueue(entry);
    }

    /// Looks up a tenant's organization.
    pub async fn get_organization(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
    ) -> AppResult<Organization> {
        self.require_permission(actor_tenant, actor, "organization").await?;
        self.organizations
            .find(actor_tenant)
            .await?
            .ok_or_else(|| AppError::NotFound("organization not found".to_owned()))
    }

    /// Creates a new organization. Organization creation has no tenant to
    /// authorize against yet, so it is the one admin mutation not gated by
    /// the RBAC Evaluator; platform-level callers (e.g. a super-admin
    /// surface) are expected to authorize this separately.
    pub async fn create_organization(&self, name: &str) -> AppResult<Organization> {
        let organization = Organization::new(TenantId::new(), NonEmptyString::new(name)?);
        self.organizations.insert(organization).await
    }

    /// Suspends an organization.
    pub async fn suspend_organization(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
    ) -> AppResult<Organization> {
        self.require_permission(actor_tenant, actor, "organization").await?;

        let mut organization = self
            .organizations
            .find(actor_tenant)
            .await?
            .ok_or_else(|| AppError::NotFound("organization not found".to_owned()))?;
        organization.suspend();
        let organization = self.organizations.update(organization).await?;

        self.record_mutation(actor_tenant, actor, "organization", &actor_tenant.to_string(), "suspend");
        Ok(organization)
    }

    /// Restores a suspended organization.
    pub async fn restore_organization(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
    ) -> AppResult<Organization> {
        self.require_permission(actor_tenant, actor, "organization").await?;

        let mut organization = self
            .organizations
            .find(actor_tenant)
            .await?
            .ok_or_else(|| AppError::NotFound("organization not found".to_owned()))?;
        organization.restore();
        let organization = self.organizations.update(organization).await?;

        self.record_mutation(actor_tenant, actor, "organization", &actor_tenant.to_string(), "restore");
        Ok(organization)
    }

    /// Lists a tenant's users.
    pub async fn list_users(&self, actor_tenant: TenantId, actor: &PrincipalId) -> AppResult<Vec<User>> {
        self.require_permission(actor_tenant, actor, "user").await?;
        self.users.list(actor_tenant).await
    }

    /// Looks up a single user.
    pub async fn get_user(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
        user_id: UserId,
    ) -> AppResult<User> {
        self.require_permission(actor_tenant, actor, "user").await?;
        self.users
            .find(actor_tenant, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_owned()))
    }

    /// Lists a tenant's roles.
    pub async fn list_roles(&self, actor_tenant: TenantId, actor: &PrincipalId) -> AppResult<Vec<Role>> {
        self.require_permission(actor_tenant, actor, "role").await?;
        self.roles.list(actor_tenant).await
    }

    /// Lists a tenant's permissions.
    pub async fn list_permissions(&self, actor_tenant: TenantId, actor: &PrincipalId) -> AppResult<Vec<Permission>> {
        self.require_permission(actor_tenant, actor, "permission").await?;
        self.permissions.list(actor_tenant).await
    }

    /// Lists the permissions granted to a role.
    pub async fn list_role_permissions(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
        role_id: RoleId,
    ) -> AppResult<Vec<RolePermission>> {
        self.require_permission(actor_tenant, actor, "role_permission").await?;
        self.role_permissions.list_for_role(role_id).await
    }

    /// Lists the roles assigned to a user.
    pub async fn list_user_roles(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
        user_id: UserId,
    ) -> AppResult<Vec<UserRole>> {
        self.require_permission(actor_tenant, actor, "user_role").await?;
        self.user_roles.list_for_user(user_id).await
    }

    /// Creates a new role, optionally parented under `parent_id`.
    pub async fn create_role(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
        name: &str,
        display_name: &str,
        parent_id: Option<RoleId>,
    ) -> AppResult<Role> {
        self.require_permission(actor_tenant, actor, "role").await?;

        let role = match parent_id {
            None => Role::root(RoleId::new(), actor_tenant, name, display_name, false)?,
            Some(parent_id) => {
                let parent = self
                    .roles
                    .find(actor_tenant, parent_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("parent role not found".to_owned()))?;
                Role::child_of(RoleId::new(), actor_tenant, name, display_name, &parent, false)?
            }
        };

        let role = self.roles.insert(role).await?;
        self.events.publish(MutationEvent::RoleHierarchyChanged { tenant_id: actor_tenant });
        self.record_mutation(actor_tenant, actor, "role", role.name(), "create");
        Ok(role)
    }

    /// Renames an existing, non-system role.
    pub async fn rename_role(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
        role_id: RoleId,
        new_name: &str,
    ) -> AppResult<Role> {
        self.require_permission(actor_tenant, actor, "role").await?;

        let mut role = self
            .roles
            .find(actor_tenant, role_id)
            .await?
            .ok_or_else(|| AppError::NotFound("role not found".to_owned()))?;
        role.rename(new_name)?;
        let role = self.roles.update(role).await?;

        self.record_mutation(actor_tenant, actor, "role", role.name(), "rename");
        Ok(role)
    }

    /// Deletes a role, rejecting system roles per the
    /// "system roles immutable & undeletable" invariant.
    pub async fn delete_role(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
        role_id: RoleId,
    ) -> AppResult<()> {
        self.require_permission(actor_tenant, actor, "role").await?;

        let role = self
            .roles
            .find(actor_tenant, role_id)
            .await?
            .ok_or_else(|| AppError::NotFound("role not found".to_owned()))?;
        if role.is_system() {
            return Err(AppError::PreconditionFailed {
                current: "system".to_owned(),
                required: "non-system".to_owned(),
            });
        }

        self.roles.delete(actor_tenant, role_id).await?;
        self.events.publish(MutationEvent::RoleHierarchyChanged { tenant_id: actor_tenant });
        self.record_mutation(actor_tenant, actor, "role", role.name(), "delete");
        Ok(())
    }

    /// Creates a new permission.
    pub async fn create_permission(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
        name: &str,
        resource_type: &str,
        action: &str,
        effect: Effect,
    ) -> AppResult<Permission> {
        self.require_permission(actor_tenant, actor, "permission").await?;

        let permission = Permission::new(PermissionId::new(), actor_tenant, name, resource_type, action, effect)?;
        let permission = self.permissions.insert(permission).await?;

        self.events.publish(MutationEvent::RolePermissionChanged { tenant_id: actor_tenant });
        self.record_mutation(actor_tenant, actor, "permission", permission.name(), "create");
        Ok(permission)
    }

    /// Deletes a permission.
    pub async fn delete_permission(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        self.require_permission(actor_tenant, actor, "permission").await?;

        self.permissions.delete(actor_tenant, permission_id).await?;
        self.events.publish(MutationEvent::RolePermissionChanged { tenant_id: actor_tenant });
        self.record_mutation(actor_tenant, actor, "permission", &permission_id.as_uuid().to_string(), "delete");
        Ok(())
    }

    /// Grants a permission to a role.
    pub async fn grant_role_permission(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<RolePermission> {
        self.require_permission(actor_tenant, actor, "role_permission").await?;

        let edge = RolePermission::new(RolePermissionId::new(), role_id, permission_id);
        let edge = self.role_permissions.insert(edge).await?;

        self.events.publish(MutationEvent::RolePermissionChanged { tenant_id: actor_tenant });
        self.record_mutation(actor_tenant, actor, "role_permission", &role_id.as_uuid().to_string(), "grant");
        Ok(edge)
    }

    /// Revokes a role-permission edge.
    pub async fn revoke_role_permission(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
        edge_id: RolePermissionId,
    ) -> AppResult<()> {
        self.require_permission(actor_tenant, actor, "role_permission").await?;

        self.role_permissions.delete(edge_id).await?;
        self.events.publish(MutationEvent::RolePermissionChanged { tenant_id: actor_tenant });
        self.record_mutation(actor_tenant, actor, "role_permission", &edge_id.as_uuid().to_string(), "revoke");
        Ok(())
    }

    /// Assigns a role to a user, invalidating that user's cached decisions.
    pub async fn assign_user_role(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
        assignee: &User,
        role_id: RoleId,
        scope: qryvanta_domain::ResourceScope,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<UserRole> {
        self.require_permission(actor_tenant, actor, "user_role").await?;

        let assignment = UserRole::new(
            UserRoleId::new(),
            assignee.id(),
            role_id,
            scope,
            None,
            Utc::now(),
            expires_at,
        );
        let assignment = self.user_roles.insert(assignment).await?;

        if let Some(principal) = assignee.external_identity_id() {
            self.events.publish(MutationEvent::UserRoleChanged {
                tenant_id: actor_tenant,
                principal: PrincipalId::new(principal)?,
            });
        }
        self.record_mutation(actor_tenant, actor, "user_role", &assignment.id().as_uuid().to_string(), "assign");
        Ok(assignment)
    }

    /// Revokes a user-role assignment, invalidating the affected user's
    /// cached decisions.
    pub async fn revoke_user_role(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
        assignee: &User,
        assignment_id: UserRoleId,
    ) -> AppResult<()> {
        self.require_permission(actor_tenant, actor, "user_role").await?;

        self.user_roles.delete(assignment_id).await?;

        if let Some(principal) = assignee.external_identity_id() {
            self.events.publish(MutationEvent::UserRoleChanged {
                tenant_id: actor_tenant,
                principal: PrincipalId::new(principal)?,
            });
        }
        self.record_mutation(actor_tenant, actor, "user_role", &assignment_id.as_uuid().to_string(), "revoke");
        Ok(())
    }

    /// Activates or deactivates a user, invalidating cached decisions.
    pub async fn set_user_status(
        &self,
        actor_tenant: TenantId,
        actor: &PrincipalId,
        user_id: UserId,
        active: bool,
    ) -> AppResult<User> {
        self.require_permission(actor_tenant, actor, "user").await?;

        let mut user = self
            .users
            .find(actor_tenant, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_owned()))?;

        let rebuilt = qryvanta_domain::User::from_parts(
            user.id(),
            user.org_id(),
            qryvanta_domain::EmailAddress::new(user.email())?,
            user.username().map(str::to_owned),
            user.external_identity_id().map(str::to_owned),
            user.bearer_subject().map(str::to_owned),
            if active {
                qryvanta_domain::UserStatus::Active
            } else {
                qryvanta_domain::UserStatus::Inactive
            },
            user.last_synced_at(),
        );
        user = self.users.update(rebuilt).await?;

        if let Some(principal) = user.external_identity_id() {
            self.events.publish(MutationEvent::UserChanged {
                tenant_id: actor_tenant,
                principal: PrincipalId::new(principal)?,
            });
        }
        self.record_mutation(
            actor_tenant,
            actor,
            "user",
            &user_id.as_uuid().to_string(),
            if active { "activate" } else { "deactivate" },
        );
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use parking_lot::Mutex;

    use async_trait::async_trait;
    use qryvanta_domain::{EmailAddress, Permission, UserStatus};

    use crate::rbac_evaluator::RbacRepository;

    use super::*;

    #[derive(Default)]
    struct FakeOrganizations {
        rows: Mutex<HashMap<TenantId, Organization>>,
    }

    #[async_trait]
    impl OrganizationRepository for FakeOrganizations {
        async fn insert(&self, organization: Organization) -> AppResult<Organization> {
            self.rows.lock().insert(organization.id(), organization.clone());
            Ok(organization)
        }

        async fn find(&self, tenant_id: TenantId) -> AppResult<Option<Organization>> {
            Ok(self.rows.lock().get(&tenant_id).cloned())
        }

        async fn update(&self, organization: Organization) -> AppResult<Organization> {
            self.rows.lock().insert(organization.id(), organization.clone());
            Ok(organization)
        }
    }

    #[derive(Default)]
    struct FakeUsers {
        rows: Mutex<HashMap<UserId, User>>,
    }

    #[async_trait]
    impl UserRepository for FakeUsers {
        async fn insert(&self, user: User) -> AppResult<User> {
            self.rows.lock().insert(user.id(), user.clone());
            Ok(user)
        }

        async fn find(&self, _tenant_id: TenantId, user_id: UserId) -> AppResult<Option<User>> {
            Ok(self.rows.lock().get(&user_id).cloned())
        }

        async fn list(&self, tenant_id: TenantId) -> AppResult<Vec<User>> {
            Ok(self
                .rows
                .lock()
                .values()
                .filter(|user| user.org_id() == tenant_id)
                .cloned()
                .collect())
        }

        async fn update(&self, user: User) -> AppResult<User> {
            self.rows.lock().insert(user.id(), user.clone());
            Ok(user)
        }
    }

    #[derive(Default)]
    struct FakeRoles {
        rows: Mutex<HashMap<RoleId, Role>>,
    }

    #[async_trait]
    impl RoleRepository for FakeRoles {
        async fn insert(&self, role: Role) -> AppResult<Role> {
            self.rows.lock().insert(role.id(), role.clone());
            Ok(role)
        }

        async fn find(&self, _tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
            Ok(self.rows.lock().get(&role_id).cloned())
        }

        async fn list(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
            Ok(self
                .rows
                .lock()
                .values()
                .filter(|role| role.org_id() == tenant_id)
                .cloned()
                .collect())
        }

        async fn update(&self, role: Role) -> AppResult<Role> {
            self.rows.lock().insert(role.id(), role.clone());
            Ok(role)
        }

        async fn delete(&self, _tenant_id: TenantId, role_id: RoleId) -> AppResult<()> {
            self.rows.lock().remove(&role_id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakePermissions {
        rows: Mutex<HashMap<PermissionId, Permission>>,
    }

    #[async_trait]
    impl PermissionRepository for FakePermissions {
        async fn insert(&self, permission: Permission) -> AppResult<Permission> {
            self.rows.lock().insert(permission.id(), permission.clone());
            Ok(permission)
        }

        async fn list(&self, tenant_id: TenantId) -> AppResult<Vec<Permission>> {
            Ok(self
                .rows
                .lock()
                .values()
                .filter(|permission| permission.org_id() == tenant_id)
                .cloned()
                .collect())
        }

        async fn delete(&self, _tenant_id: TenantId, permission_id: PermissionId) -> AppResult<()> {
            self.rows.lock().remove(&permission_id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeRolePermissions {
        rows: Mutex<HashMap<RolePermissionId, RolePermission>>,
    }

    #[async_trait]
    impl RolePermissionRepository for FakeRolePermissions {
        async fn insert(&self, edge: RolePermission) -> AppResult<RolePermission> {
            self.rows.lock().insert(edge.id(), edge);
            Ok(edge)
        }

        async fn delete(&self, edge_id: RolePermissionId) -> AppResult<()> {
            self.rows.lock().remove(&edge_id);
            Ok(())
        }

        async fn list_for_role(&self, role_id: RoleId) -> AppResult<Vec<RolePermission>> {
            Ok(self
                .rows
                .lock()
                .values()
                .filter(|edge| edge.role_id() == role_id)
                .copied()
                .collect())
        }
    }

    #[derive(Default)]
    struct FakeUserRoles {
        rows: Mutex<HashMap<UserRoleId, UserRole>>,
    }

    #[async_trait]
    impl UserRoleRepository for FakeUserRoles {
        async fn insert(&self, assignment: UserRole) -> AppResult<UserRole> {
            self.rows.lock().insert(assignment.id(), assignment.clone());
            Ok(assignment)
        }

        async fn delete(&self, assignment_id: UserRoleId) -> AppResult<()> {
            self.rows.lock().remove(&assignment_id);
            Ok(())
        }

        async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<UserRole>> {
            Ok(self
                .rows
                .lock()
                .values()
                .filter(|assignment| assignment.user_id() == user_id)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct AllowAllRbac {
        role: Mutex<Option<Role>>,
        permission: Mutex<Option<Permission>>,
    }

    #[async_trait]
    impl RbacRepository for AllowAllRbac {
        async fn find_user_by_external_id(&self, tenant_id: TenantId, _external_id: &str) -> AppResult<Option<User>> {
            Ok(Some(User::new(
                UserId::new(),
                tenant_id,
                EmailAddress::new("admin@example.com")?,
                None,
                Some("admin-ext".to_owned()),
                None,
            )))
        }

        async fn list_user_roles(&self, user_id: UserId) -> AppResult<Vec<UserRole>> {
            let role_id = self
                .role
                .lock()
                .as_ref()
                .unwrap_or_else(|| unreachable!())
                .id();
            Ok(vec![UserRole::new(
                UserRoleId::new(),
                user_id,
                role_id,
                qryvanta_domain::ResourceScope::Global,
                None,
                Utc::now(),
                None,
            )])
        }

        async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
            let role = self.role.lock().clone();
            Ok(role.filter(|role| role.id() == role_id))
        }

        async fn list_role_permissions(&self, _role_id: RoleId) -> AppResult<Vec<Permission>> {
            Ok(self.permission.lock().clone().into_iter().collect())
        }
    }

    fn admin_permission(tenant_id: TenantId, aggregate: &str) -> Permission {
        Permission::new(
            PermissionId::new(),
            tenant_id,
            format!("manage-{aggregate}"),
            "security",
            "manage",
            Effect::Allow,
        )
        .unwrap_or_else(|_| unreachable!())
    }

    fn build_service() -> (AdminService, TenantId, PrincipalId) {
        let tenant_id = TenantId::new();
        let role = Role::root(RoleId::new(), tenant_id, "admin", "Admin", true).unwrap_or_else(|_| unreachable!());
        let rbac = Arc::new(AllowAllRbac::default());
        *rbac.role.lock() = Some(role);
        *rbac.permission.lock() = Some(admin_permission(tenant_id, "role"));

        let service = AdminService::new(
            RbacEvaluator::new(rbac),
            MutationEventBus::new(),
            AuditRecorder::spawn(Arc::new(NullAudit), 1),
            Arc::new(FakeOrganizations::default()),
            Arc::new(FakeUsers::default()),
            Arc::new(FakeRoles::default()),
            Arc::new(FakePermissions::default()),
            Arc::new(FakeRolePermissions::default()),
            Arc::new(FakeUserRoles::default()),
        );
        (service, tenant_id, PrincipalId::new("admin-ext").unwrap_or_else(|_| unreachable!()))
    }

    struct NullAudit;

    #[async_trait]
    impl crate::audit_recorder::AuditRepository for NullAudit {
        async fn append(&self, _entry: AuditLog) -> AppResult<()> {
            Ok(())
        }

        async fn list_recent_entries(
            &self,
            _tenant_id: TenantId,
            _query: crate::audit_recorder::AuditLogQuery,
        ) -> AppResult<Vec<AuditLog>> {
            Ok(Vec::new())
        }

        async fn export_entries(
            &self,
            _tenant_id: TenantId,
            _query: crate::audit_recorder::AuditLogQuery,
        ) -> AppResult<Vec<AuditLog>> {
            Ok(Vec::new())
        }

        async fn purge_entries_older_than(&self, _tenant_id: TenantId, _cutoff: DateTime<Utc>) -> AppResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn create_root_role_under_permitted_actor_succeeds() {
        let (service, tenant_id, actor) = build_service();
        let role = service
            .create_role(tenant_id, &actor, "billing", "Billing", None)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(role.level(), 0);
    }

    #[tokio::test]
    async fn deleting_a_system_role_is_rejected() {
        let (service, tenant_id, actor) = build_service();
        let role = Role::root(RoleId::new(), tenant_id, "owner", "Owner", true).unwrap_or_else(|_| unreachable!());
        service.roles.insert(role.clone()).await.unwrap_or_else(|_| unreachable!());

        let outcome = service.delete_role(tenant_id, &actor, role.id()).await;
        assert!(matches!(outcome, Err(AppError::PreconditionFailed { .. })));
    }

    #[tokio::test]
    async fn suspending_an_organization_flips_accepts_requests() {
        let (service, tenant_id, actor) = build_service();
        let organization = Organization::new(tenant_id, NonEmptyString::new("Acme").unwrap_or_else(|_| unreachable!()));
        service.organizations.insert(organization).await.unwrap_or_else(|_| unreachable!());

        let organization = service.suspend_organization(tenant_id, &actor).await.unwrap_or_else(|_| unreachable!());
        assert!(!organization.accepts_requests());
    }

    #[tokio::test]
    async fn deactivating_a_user_is_reflected_in_status() {
        let (service, tenant_id, actor) = build_service();
        let user = User::new(
            UserId::new(),
            tenant_id,
            EmailAddress::new("person@example.com").unwrap_or_else(|_| unreachable!()),
            None,
            Some("person-ext".to_owned()),
            None,
        );
        let user = service.users.insert(user).await.unwrap_or_else(|_| unreachable!());

        let updated = service
            .set_user_status(tenant_id, &actor, user.id(), false)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(updated.status(), UserStatus::Inactive);
    }
}
