use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use qryvanta_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the inbound credential — a bearer token or an `X-Api-Key`
/// header — to an [`qryvanta_core::AuthenticatedCaller`] via the Identity &
/// Tenancy Gate, and inserts it into the request extensions for downstream
/// handlers to extract.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let headers = request.headers();

    let bearer_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let api_key = headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .map(str::trim);

    let caller = match (bearer_token, api_key) {
        (Some(token), _) if !token.is_empty() => {
            state.identity_gate_service.authenticate_bearer(token).await?
        }
        (_, Some(key)) if !key.is_empty() => {
            state.identity_gate_service.authenticate_api_key(key).await?
        }
        _ => {
            return Err(AppError::AuthenticationFailed(
                "missing Authorization bearer token or X-Api-Key header".to_owned(),
            )
            .into());
        }
    };

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
