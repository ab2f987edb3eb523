use axum::Extension;
use axum::extract::State;
use axum::Json;
use qryvanta_core::AuthenticatedCaller;

use crate::dto::{
    BatchDecisionRequestDto, BatchDecisionResponseDto, DecisionRequestDto, DecisionResponseDto,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// `POST /v1/decisions`: evaluates a single authorization decision.
pub async fn decide(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Json(body): Json<DecisionRequestDto>,
) -> ApiResult<Json<DecisionResponseDto>> {
    let request = body.into_core(caller.tenant_id())?;
    let response = state.decision_service.decide(request).await?;
    Ok(Json(response.into()))
}

/// `POST /v1/decisions/batch`: evaluates a batch of decisions, preserving
/// request order in the response.
pub async fn decide_batch(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Json(body): Json<BatchDecisionRequestDto>,
) -> ApiResult<Json<BatchDecisionResponseDto>> {
    let mut responses = Vec::with_capacity(body.requests.len());
    for request in body.requests {
        let request = request.into_core(caller.tenant_id())?;
        let response = state.decision_service.decide(request).await?;
        responses.push(response.into());
    }
    Ok(Json(BatchDecisionResponseDto { responses }))
}
