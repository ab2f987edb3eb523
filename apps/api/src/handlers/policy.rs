use axum::extract::{Path, State};
use axum::{Extension, Json};
use qryvanta_core::{AppError, AuthenticatedCaller};
use qryvanta_domain::{PolicyId, PolicyType};
use uuid::Uuid;

use super::require_principal;
use crate::dto::{
    AddPolicyVersionRequest, CreatePolicyRequest, PolicyResponse, PolicyVersionResponse,
    PolicyWithVersionResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

async fn require_policy_management(state: &AppState, caller: &AuthenticatedCaller) -> ApiResult<()> {
    let actor = require_principal(caller)?;
    let decision = state
        .policy_rbac_evaluator
        .evaluate(caller.tenant_id(), actor, "manage", "security", "policy")
        .await?;

    if decision.outcome == qryvanta_application::DecisionOutcome::Allow {
        Ok(())
    } else {
        Err(AppError::AuthorizationDenied(decision.reason).into())
    }
}

fn parse_policy_type(value: &str) -> Result<PolicyType, AppError> {
    match value {
        "rego" => Ok(PolicyType::Rego),
        "cedar" => Ok(PolicyType::Cedar),
        other => Err(AppError::Validation(format!("unknown policy type '{other}'"))),
    }
}

pub async fn list_policies(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
) -> ApiResult<Json<Vec<PolicyResponse>>> {
    require_policy_management(&state, &caller).await?;
    let policies = state.policy_lifecycle_service.list_policies(caller.tenant_id()).await?;
    Ok(Json(policies.into_iter().map(PolicyResponse::from).collect()))
}

pub async fn get_policy(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(policy_id): Path<Uuid>,
) -> ApiResult<Json<PolicyResponse>> {
    require_policy_management(&state, &caller).await?;
    let policy = state
        .policy_lifecycle_service
        .get_policy(caller.tenant_id(), PolicyId::from_uuid(policy_id))
        .await?;
    Ok(Json(policy.into()))
}

pub async fn list_versions(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(policy_id): Path<Uuid>,
) -> ApiResult<Json<Vec<PolicyVersionResponse>>> {
    require_policy_management(&state, &caller).await?;
    let policy_id = PolicyId::from_uuid(policy_id);
    // Validate the policy belongs to the caller's tenant before listing.
    state.policy_lifecycle_service.get_policy(caller.tenant_id(), policy_id).await?;
    let versions = state.policy_lifecycle_service.list_versions(policy_id).await?;
    Ok(Json(versions.into_iter().map(PolicyVersionResponse::from).collect()))
}

pub async fn create_policy(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Json(body): Json<CreatePolicyRequest>,
) -> ApiResult<Json<PolicyWithVersionResponse>> {
    require_policy_management(&state, &caller).await?;
    let policy_type = parse_policy_type(&body.policy_type)?;
    let (policy, version) = state
        .policy_lifecycle_service
        .create_policy(caller.tenant_id(), body.name, body.display_name, policy_type, body.content)
        .await?;
    Ok(Json(PolicyWithVersionResponse {
        policy: policy.into(),
        version: version.into(),
    }))
}

pub async fn add_version(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(policy_id): Path<Uuid>,
    Json(body): Json<AddPolicyVersionRequest>,
) -> ApiResult<Json<PolicyWithVersionResponse>> {
    require_policy_management(&state, &caller).await?;
    let policy = state
        .policy_lifecycle_service
        .get_policy(caller.tenant_id(), PolicyId::from_uuid(policy_id))
        .await?;
    let (policy, version) = state.policy_lifecycle_service.add_version(&policy, body.content).await?;
    Ok(Json(PolicyWithVersionResponse {
        policy: policy.into(),
        version: version.into(),
    }))
}

pub async fn publish(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(policy_id): Path<Uuid>,
) -> ApiResult<Json<PolicyResponse>> {
    require_policy_management(&state, &caller).await?;
    let policy = state
        .policy_lifecycle_service
        .publish(caller.tenant_id(), PolicyId::from_uuid(policy_id))
        .await?;
    Ok(Json(policy.into()))
}

pub async fn archive(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Path(policy_id): Path<Uuid>,
) -> ApiResult<Json<PolicyResponse>> {
    require_policy_management(&state, &caller).await?;
    let policy = state
        .policy_lifecycle_service
        .archive(caller.tenant_id(), PolicyId::from_uuid(policy_id))
        .await?;
    Ok(Json(policy.into()))
}
