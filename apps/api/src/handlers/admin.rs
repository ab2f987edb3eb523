use axum::extract::{Path, State};
use axum::{Extension, Json};
use qryvanta_core::AuthenticatedCaller;
use qryvanta_domain::{
    Effect, PermissionId, ResourceScope, RoleId, RolePermissionId, UserId, UserRoleId,
};
use uuid::Uuid;

use super::require_principal;
use crate::dto::{
    AssignUserRoleRequest, CreateOrganizationRequest, CreatePermissionRequest, CreateRoleRequest,
    GenericMessageResponse, GrantRolePermissionRequest, OrganizationResponse, PermissionResponse,
    RenameRoleRequest, RoleResponse, SetUserStatusRequest, UserResponse, UserRoleResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn get_organization(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
) -> ApiResult<Json<OrganizationResponse>> {
    let actor = require_principal(&caller)?;
    let organization = state.admin_service.get_organization(caller.tenant_id(), actor).await?;
    Ok(Json(organization.into()))
}

pub async fn create_organization(
    State(state): State<AppState>,
    Json(body): Json<CreateOrganizationRequest>,
) -> ApiResult<Json<OrganizationResponse>> {
    let organization = state.admin_service.create_organization(&body.name).await?;
    Ok(Json(organization.into()))
}

pub async fn suspend_organization(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
) -> ApiResult<Json<OrganizationResponse>> {
    let actor = require_principal(&caller)?;
    let organization = state.admin_service.suspend_organization(caller.tenant_id(), actor).await?;
    Ok(Json(organization.into()))
}

pub async fn restore_organization(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
) -> ApiResult<Json<OrganizationResponse>> {
    let actor = require_principal(&caller)?;
    let organization = state.admin_service.restore_organization(caller.tenant_id(), actor).await?;
    Ok(Json(organization.into()))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let actor = require_principal(&caller)?;
    let users = state.admin_service.list_users(caller.tenant_id(), actor).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let actor = require_principal(&caller)?;
    let user = state
        .admin_service
        .get_user(caller.tenant_id(), actor, UserId::from_uuid(user_id))
        .await?;
    Ok(Json(user.into()))
}

pub async fn set_user_status(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<SetUserStatusRequest>,
) -> ApiResult<Json<UserResponse>> {
    let actor = require_principal(&caller)?;
    let user = state
        .admin_service
        .set_user_status(caller.tenant_id(), actor, UserId::from_uuid(user_id), body.active)
        .await?;
    Ok(Json(user.into()))
}

pub async fn list_roles(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let actor = require_principal(&caller)?;
    let roles = state.admin_service.list_roles(caller.tenant_id(), actor).await?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

pub async fn create_role(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Json(body): Json<CreateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let actor = require_principal(&caller)?;
    let role = state
        .admin_service
        .create_role(
            caller.tenant_id(),
            actor,
            &body.name,
            &body.display_name,
            body.parent_id.map(RoleId::from_uuid),
        )
        .await?;
    Ok(Json(role.into()))
}

pub async fn rename_role(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(role_id): Path<Uuid>,
    Json(body): Json<RenameRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let actor = require_principal(&caller)?;
    let role = state
        .admin_service
        .rename_role(caller.tenant_id(), actor, RoleId::from_uuid(role_id), &body.name)
        .await?;
    Ok(Json(role.into()))
}

pub async fn delete_role(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<GenericMessageResponse>> {
    let actor = require_principal(&caller)?;
    state
        .admin_service
        .delete_role(caller.tenant_id(), actor, RoleId::from_uuid(role_id))
        .await?;
    Ok(Json(GenericMessageResponse::new("role deleted")))
}

pub async fn list_permissions(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let actor = require_principal(&caller)?;
    let permissions = state.admin_service.list_permissions(caller.tenant_id(), actor).await?;
    Ok(Json(permissions.into_iter().map(PermissionResponse::from).collect()))
}

pub async fn create_permission(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Json(body): Json<CreatePermissionRequest>,
) -> ApiResult<Json<PermissionResponse>> {
    let actor = require_principal(&caller)?;
    let effect = Effect::parse(&body.effect)?;
    let permission = state
        .admin_service
        .create_permission(
            caller.tenant_id(),
            actor,
            &body.name,
            &body.resource_type,
            &body.action,
            effect,
        )
        .await?;
    Ok(Json(permission.into()))
}

pub async fn delete_permission(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(permission_id): Path<Uuid>,
) -> ApiResult<Json<GenericMessageResponse>> {
    let actor = require_principal(&caller)?;
    state
        .admin_service
        .delete_permission(caller.tenant_id(), actor, PermissionId::from_uuid(permission_id))
        .await?;
    Ok(Json(GenericMessageResponse::new("permission deleted")))
}

pub async fn list_role_permissions(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<Vec<crate::dto::RolePermissionResponse>>> {
    let actor = require_principal(&caller)?;
    let edges = state
        .admin_service
        .list_role_permissions(caller.tenant_id(), actor, RoleId::from_uuid(role_id))
        .await?;
    Ok(Json(edges.into_iter().map(crate::dto::RolePermissionResponse::from).collect()))
}

pub async fn grant_role_permission(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(role_id): Path<Uuid>,
    Json(body): Json<GrantRolePermissionRequest>,
) -> ApiResult<Json<crate::dto::RolePermissionResponse>> {
    let actor = require_principal(&caller)?;
    let edge = state
        .admin_service
        .grant_role_permission(
            caller.tenant_id(),
            actor,
            RoleId::from_uuid(role_id),
            PermissionId::from_uuid(body.permission_id),
        )
        .await?;
    Ok(Json(edge.into()))
}

pub async fn revoke_role_permission(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(edge_id): Path<Uuid>,
) -> ApiResult<Json<GenericMessageResponse>> {
    let actor = require_principal(&caller)?;
    state
        .admin_service
        .revoke_role_permission(caller.tenant_id(), actor, RolePermissionId::from_uuid(edge_id))
        .await?;
    Ok(Json(GenericMessageResponse::new("role permission revoked")))
}

pub async fn list_user_roles(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<UserRoleResponse>>> {
    let actor = require_principal(&caller)?;
    let assignments = state
        .admin_service
        .list_user_roles(caller.tenant_id(), actor, UserId::from_uuid(user_id))
        .await?;
    Ok(Json(assignments.into_iter().map(UserRoleResponse::from).collect()))
}

pub async fn assign_user_role(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<AssignUserRoleRequest>,
) -> ApiResult<Json<UserRoleResponse>> {
    let actor = require_principal(&caller)?;
    let assignee = state
        .admin_service
        .get_user(caller.tenant_id(), actor, UserId::from_uuid(user_id))
        .await?;
    let scope = ResourceScope::from_optional(body.resource_type, body.resource_id)?;
    let assignment = state
        .admin_service
        .assign_user_role(
            caller.tenant_id(),
            actor,
            &assignee,
            RoleId::from_uuid(body.role_id),
            scope,
            body.expires_at,
        )
        .await?;
    Ok(Json(assignment.into()))
}

pub async fn revoke_user_role(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path((user_id, assignment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<GenericMessageResponse>> {
    let actor = require_principal(&caller)?;
    let assignee = state
        .admin_service
        .get_user(caller.tenant_id(), actor, UserId::from_uuid(user_id))
        .await?;
    state
        .admin_service
        .revoke_user_role(caller.tenant_id(), actor, &assignee, UserRoleId::from_uuid(assignment_id))
        .await?;
    Ok(Json(GenericMessageResponse::new("user role revoked")))
}
