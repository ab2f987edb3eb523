use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::{HealthDependencyStatus, HealthResponse};
use crate::state::AppState;

mod checks;

/// `GET /health`: checks Postgres and, when configured as required by the
/// chosen cache/rate-limit backends, Redis.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let redis_required = state.config.cache.l2_backend == crate::api_config::StoreBackend::Redis
        || state.config.rate_limit.backend == crate::api_config::StoreBackend::Redis;

    let postgres = checks::check_postgres(state.postgres_pool.clone()).await;
    let redis = checks::check_redis(state.redis_client.clone(), redis_required).await;

    let ready = is_healthy(postgres.status) && is_healthy(redis.status);
    let status = if ready { "ok" } else { "degraded" };
    let http_status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        http_status,
        Json(HealthResponse { status, ready, postgres, redis }),
    )
}

fn is_healthy(status: &str) -> bool {
    status == "ok" || status == "disabled"
}
