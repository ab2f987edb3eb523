use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use qryvanta_application::AuditLogQuery;
use qryvanta_core::{AppError, AuthenticatedCaller};

use super::require_principal;
use crate::dto::{AuditLogEntryResponse, AuditQueryParams};
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 100;

async fn require_audit_read(state: &AppState, caller: &AuthenticatedCaller) -> ApiResult<()> {
    let actor = require_principal(caller)?;
    let decision = state
        .policy_rbac_evaluator
        .evaluate(caller.tenant_id(), actor, "manage", "security", "audit")
        .await?;

    if decision.outcome == qryvanta_application::DecisionOutcome::Allow {
        Ok(())
    } else {
        Err(AppError::AuthorizationDenied(decision.reason).into())
    }
}

fn build_query(params: &AuditQueryParams) -> AuditLogQuery {
    AuditLogQuery {
        from: params.from,
        to: params.to,
        actor: params.actor.clone(),
        resource_type: params.resource_type.clone(),
        limit: params.limit.unwrap_or(DEFAULT_LIMIT),
    }
}

/// `GET /v1/audit`: lists recent audit log entries for the caller's tenant.
pub async fn list_recent(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Query(params): Query<AuditQueryParams>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    require_audit_read(&state, &caller).await?;
    let query = build_query(&params);
    let entries = state.audit_repository.list_recent_entries(caller.tenant_id(), query).await?;
    Ok(Json(entries.into_iter().map(AuditLogEntryResponse::from).collect()))
}

/// `GET /v1/audit/export`: streams matching audit entries as a CSV document.
pub async fn export(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Query(params): Query<AuditQueryParams>,
) -> ApiResult<impl IntoResponse> {
    require_audit_read(&state, &caller).await?;
    let query = build_query(&params);
    let entries = state.audit_repository.export_entries(caller.tenant_id(), query).await?;
    let document = qryvanta_application::to_csv_document(&entries);
    Ok((
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        document,
    ))
}
