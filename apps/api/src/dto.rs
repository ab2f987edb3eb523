//! Wire types for the HTTP API. Plain `serde` structs; no `ts_rs` bindings
//! are generated for this surface.

use chrono::{DateTime, Utc};
use qryvanta_application::DecisionRequest;
use qryvanta_core::{AppResult, PrincipalId, TenantId};
use qryvanta_domain::{
    AuditLog, Effect, Organization, OrganizationStatus, Permission, Policy, PolicyStatus,
    PolicyType, PolicyVersion, Role, RolePermission, User, UserRole, UserStatus, ValidationStatus,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// `GET /health` response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub postgres: HealthDependencyStatus,
    pub redis: HealthDependencyStatus,
}

/// Status of a single dependency check within [`HealthResponse`].
#[derive(Debug, Serialize)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

/// `POST /v1/decisions` request body.
#[derive(Debug, Deserialize)]
pub struct DecisionRequestDto {
    pub principal: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    #[serde(default)]
    pub context: Value,
}

impl DecisionRequestDto {
    pub fn into_core(self, tenant_id: TenantId) -> AppResult<DecisionRequest> {
        Ok(DecisionRequest {
            tenant_id,
            principal: PrincipalId::new(self.principal)?,
            action: self.action,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            context: self.context,
        })
    }
}

/// `POST /v1/decisions/batch` request body.
#[derive(Debug, Deserialize)]
pub struct BatchDecisionRequestDto {
    pub requests: Vec<DecisionRequestDto>,
}

/// `POST /v1/decisions` and batch-element response body.
#[derive(Debug, Serialize)]
pub struct DecisionResponseDto {
    /// `"allow"`, `"deny"`, or `"error"` (§6, §7).
    pub decision: String,
    pub reason: String,
    pub contributing_roles: Vec<String>,
    pub contributing_permissions: Vec<String>,
    pub degraded: bool,
    pub from_cache: bool,
    pub evaluation_time_ms: u64,
}

impl From<qryvanta_application::DecisionResponse> for DecisionResponseDto {
    fn from(value: qryvanta_application::DecisionResponse) -> Self {
        Self {
            decision: value.decision,
            reason: value.reason,
            contributing_roles: value.contributing_roles,
            contributing_permissions: value.contributing_permissions,
            degraded: value.degraded,
            from_cache: value.from_cache,
            evaluation_time_ms: value.evaluation_time_ms,
        }
    }
}

/// `POST /v1/decisions/batch` response body.
#[derive(Debug, Serialize)]
pub struct BatchDecisionResponseDto {
    pub responses: Vec<DecisionResponseDto>,
}

#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub id: Uuid,
    pub name: String,
    pub status: &'static str,
}

impl From<Organization> for OrganizationResponse {
    fn from(value: Organization) -> Self {
        Self {
            id: value.id().as_uuid(),
            name: value.name().as_str().to_owned(),
            status: organization_status_str(value.status()),
        }
    }
}

fn organization_status_str(status: OrganizationStatus) -> &'static str {
    match status {
        OrganizationStatus::Active => "active",
        OrganizationStatus::Suspended => "suspended",
        OrganizationStatus::Deleted => "deleted",
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub external_identity_id: Option<String>,
    pub status: &'static str,
}

impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        Self {
            id: value.id().as_uuid(),
            email: value.email().to_owned(),
            username: value.username().map(str::to_owned),
            external_identity_id: value.external_identity_id().map(str::to_owned),
            status: match value.status() {
                UserStatus::Active => "active",
                UserStatus::Inactive => "inactive",
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetUserStatusRequest {
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub parent_id: Option<Uuid>,
    pub level: u8,
    pub is_system: bool,
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            id: value.id().as_uuid(),
            name: value.name().to_owned(),
            display_name: value.display_name().to_owned(),
            parent_id: value.parent_id().map(|id| id.as_uuid()),
            level: value.level(),
            is_system: value.is_system(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub display_name: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RenameRoleRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub id: Uuid,
    pub name: String,
    pub resource_type: String,
    pub action: String,
    pub effect: &'static str,
}

impl From<Permission> for PermissionResponse {
    fn from(value: Permission) -> Self {
        Self {
            id: value.id().as_uuid(),
            name: value.name().to_owned(),
            resource_type: value.resource_type().to_owned(),
            action: value.action().to_owned(),
            effect: match value.effect() {
                Effect::Allow => "allow",
                Effect::Deny => "deny",
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    pub name: String,
    pub resource_type: String,
    pub action: String,
    #[serde(default = "default_effect")]
    pub effect: String,
}

fn default_effect() -> String {
    "allow".to_owned()
}

#[derive(Debug, Serialize)]
pub struct RolePermissionResponse {
    pub id: Uuid,
    pub role_id: Uuid,
    pub permission_id: Uuid,
}

impl From<RolePermission> for RolePermissionResponse {
    fn from(value: RolePermission) -> Self {
        Self {
            id: value.id().as_uuid(),
            role_id: value.role_id().as_uuid(),
            permission_id: value.permission_id().as_uuid(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GrantRolePermissionRequest {
    pub permission_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UserRoleResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub granted_by: Option<Uuid>,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<UserRole> for UserRoleResponse {
    fn from(value: UserRole) -> Self {
        let (resource_type, resource_id) = value.scope().clone().into_optional();
        Self {
            id: value.id().as_uuid(),
            user_id: value.user_id().as_uuid(),
            role_id: value.role_id().as_uuid(),
            resource_type,
            resource_id,
            granted_by: value.granted_by().map(|id| id.as_uuid()),
            granted_at: value.granted_at(),
            expires_at: value.expires_at(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignUserRoleRequest {
    pub role_id: Uuid,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub policy_type: &'static str,
    pub status: &'static str,
    pub current_version: u32,
}

impl From<Policy> for PolicyResponse {
    fn from(value: Policy) -> Self {
        Self {
            id: value.id().as_uuid(),
            name: value.name().to_owned(),
            display_name: value.display_name().to_owned(),
            policy_type: match value.policy_type() {
                PolicyType::Rego => "rego",
                PolicyType::Cedar => "cedar",
            },
            status: match value.status() {
                PolicyStatus::Draft => "draft",
                PolicyStatus::Active => "active",
                PolicyStatus::Archived => "archived",
            },
            current_version: value.current_version(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePolicyRequest {
    pub name: String,
    pub display_name: String,
    #[serde(default = "default_policy_type")]
    pub policy_type: String,
    pub content: String,
}

fn default_policy_type() -> String {
    "rego".to_owned()
}

#[derive(Debug, Deserialize)]
pub struct AddPolicyVersionRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct PolicyVersionResponse {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub version: u32,
    pub checksum: String,
    pub validation_status: &'static str,
    pub validation_errors: Option<Vec<String>>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<PolicyVersion> for PolicyVersionResponse {
    fn from(value: PolicyVersion) -> Self {
        Self {
            id: value.id().as_uuid(),
            policy_id: value.policy_id().as_uuid(),
            version: value.version(),
            checksum: value.checksum().to_owned(),
            validation_status: match value.validation_status() {
                ValidationStatus::Pending => "pending",
                ValidationStatus::Valid => "valid",
                ValidationStatus::Invalid => "invalid",
            },
            validation_errors: value.validation_errors().map(<[String]>::to_vec),
            published_at: value.published_at(),
            created_at: value.created_at(),
        }
    }
}

/// A created-policy response combining the policy and its first version.
#[derive(Debug, Serialize)]
pub struct PolicyWithVersionResponse {
    pub policy: PolicyResponse,
    pub version: PolicyVersionResponse,
}

#[derive(Debug, Serialize)]
pub struct AuditLogEntryResponse {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub event_type: String,
    pub actor: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub action: String,
    pub decision: Option<String>,
    pub reason: Option<String>,
}

impl From<AuditLog> for AuditLogEntryResponse {
    fn from(value: AuditLog) -> Self {
        Self {
            id: value.id().as_uuid(),
            occurred_at: value.occurred_at(),
            event_type: value.event_type().as_str().to_owned(),
            actor: value.actor().map(str::to_owned),
            resource_type: value.resource_type().map(str::to_owned),
            resource_id: value.resource_id().map(str::to_owned),
            action: value.action().to_owned(),
            decision: value.decision().map(str::to_owned),
            reason: value.reason().map(str::to_owned),
        }
    }
}

/// `GET /v1/audit` query parameters.
#[derive(Debug, Deserialize)]
pub struct AuditQueryParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub actor: Option<String>,
    pub resource_type: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct GenericMessageResponse {
    pub message: String,
}

impl GenericMessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
