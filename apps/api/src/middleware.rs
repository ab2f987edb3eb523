use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use qryvanta_application::TokenBucketRule;

use crate::error::ApiResult;
use crate::state::AppState;

/// Per-credential token-bucket rate limit (§4.7), the sole pre-evaluation
/// hard reject. Keys on the bearer subject / API key resolved by
/// [`crate::auth::authenticate`], which must run before this layer.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let caller = request
        .extensions()
        .get::<qryvanta_core::AuthenticatedCaller>()
        .cloned();

    let credential_key = match &caller {
        Some(caller) => caller
            .principal()
            .map(|principal| principal.as_str().to_owned())
            .unwrap_or_else(|| caller.tenant_id().to_string()),
        None => extract_client_ip(&request),
    };

    let rule = TokenBucketRule::new(
        state.config.rate_limit.capacity,
        state.config.rate_limit.refill_tokens,
        state.config.rate_limit.refill_period_seconds,
    );

    state.rate_limiter_service.check(&credential_key, rule).await?;

    Ok(next.run(request).await)
}

/// Extracts the client IP address from request headers.
///
/// Prefers `X-Forwarded-For` (first entry) for reverse-proxy setups, falls
/// back to `X-Real-Ip`, then to `"unknown"`.
fn extract_client_ip(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|forwarded| forwarded.split(',').next())
        .map(|ip| ip.trim().to_owned())
        .or_else(|| {
            request
                .headers()
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
                .map(|ip| ip.trim().to_owned())
        })
        .unwrap_or_else(|| "unknown".to_owned())
}
