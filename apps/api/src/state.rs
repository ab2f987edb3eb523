use std::sync::Arc;

use qryvanta_application::{
    AdminService, AuditRecorder, AuditRepository, DecisionService, IdentityGateService,
    PolicyLifecycleService, RateLimiterService, RbacEvaluator, TwoTierDecisionCache,
};
use sqlx::PgPool;

use crate::api_config::ApiConfig;

/// Shared application state, one instance per process, cloned into every
/// request handler by axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub decision_service: DecisionService,
    pub admin_service: AdminService,
    pub policy_lifecycle_service: PolicyLifecycleService,
    pub policy_rbac_evaluator: RbacEvaluator,
    pub identity_gate_service: IdentityGateService,
    pub rate_limiter_service: RateLimiterService,
    pub audit_repository: Arc<dyn AuditRepository>,
    pub audit_recorder: AuditRecorder,
    pub decision_cache: Arc<TwoTierDecisionCache>,
    pub config: Arc<ApiConfig>,
    /// Kept alongside the repository adapters for the `/health` handler's
    /// direct `SELECT 1`/`PING` dependency checks.
    pub postgres_pool: PgPool,
    pub redis_client: Option<redis::Client>,
}
