use axum::extract::State;
use axum::{Extension, Json};
use qryvanta_core::{AppError, AuthenticatedCaller};

use super::require_principal;
use crate::dto::GenericMessageResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// `POST /v1/cache/invalidate`: drops every cached decision for the
/// caller's tenant, for operators recovering from a suspected stale-cache
/// incident rather than a routine mutation (those invalidate narrowly via
/// the mutation event bus).
pub async fn invalidate_tenant(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
) -> ApiResult<Json<GenericMessageResponse>> {
    let actor = require_principal(&caller)?;
    let decision = state
        .policy_rbac_evaluator
        .evaluate(caller.tenant_id(), actor, "manage", "security", "cache")
        .await?;

    if decision.outcome != qryvanta_application::DecisionOutcome::Allow {
        return Err(AppError::AuthorizationDenied(decision.reason).into());
    }

    let prefix = qryvanta_application::tenant_prefix(caller.tenant_id());
    state.decision_cache.invalidate_prefix(&prefix).await;
    Ok(Json(GenericMessageResponse::new("tenant cache invalidated")))
}
