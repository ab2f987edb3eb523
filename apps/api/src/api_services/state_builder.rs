use std::sync::Arc;

use qryvanta_application::{
    AdminService, AuditRecorder, DecisionService, ExternalPolicyAdapter, IdentityGateService,
    MutationEventBus, PolicyEngineClient, PolicyLifecycleService, RbacEvaluator,
    RegoCompilerClient,
};
use qryvanta_core::AppError;
use qryvanta_infrastructure::{
    HttpRegoCompilerClient, JwksBearerVerifier, OpaPolicyEngineClient,
};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

use super::redis::build_redis_client;

mod caches;
mod repositories;

/// Background workers draining the audit queue (§4.8); fixed rather than
/// configurable since it only trades CPU for write latency under load.
const AUDIT_WORKER_COUNT: usize = 2;

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let redis_client = config
        .redis_url
        .as_deref()
        .map(build_redis_client)
        .transpose()?;

    let repositories = repositories::build_repository_set(&pool);

    let events = MutationEventBus::new();
    let audit_recorder = AuditRecorder::spawn(repositories.audit.clone(), AUDIT_WORKER_COUNT);
    let rbac_evaluator = RbacEvaluator::new(repositories.rbac.clone());
    let decision_cache = caches::build_decision_cache(config, redis_client.clone())?;
    events.subscribe(Arc::new(decision_cache.clone()));

    let policy_engine_client: Option<Arc<dyn PolicyEngineClient>> =
        if config.policy_engine.enabled {
            let base_url = config.policy_engine_base_url.as_deref().ok_or_else(|| {
                AppError::Validation("POLICY_ENGINE_BASE_URL is required when POLICY_ENGINE_ENABLED=true".to_owned())
            })?;
            let policy_path = config.policy_engine_policy_path.as_deref().ok_or_else(|| {
                AppError::Validation("POLICY_ENGINE_POLICY_PATH is required when POLICY_ENGINE_ENABLED=true".to_owned())
            })?;
            Some(Arc::new(OpaPolicyEngineClient::new(
                reqwest::Client::new(),
                base_url,
                policy_path,
            )))
        } else {
            None
        };
    let policy_adapter = policy_engine_client
        .map(|client| ExternalPolicyAdapter::new(client, config.policy_engine.clone()));

    let decision_service = DecisionService::new(
        decision_cache.clone(),
        rbac_evaluator.clone(),
        policy_adapter,
        audit_recorder.clone(),
    );

    let admin_service = AdminService::new(
        rbac_evaluator.clone(),
        events,
        audit_recorder.clone(),
        repositories.organizations,
        repositories.users,
        repositories.roles,
        repositories.permissions,
        repositories.role_permissions,
        repositories.user_roles,
    );

    let rego_compiler: Option<Arc<dyn RegoCompilerClient>> = config
        .rego_compiler_url
        .as_deref()
        .map(|compile_url| {
            Arc::new(HttpRegoCompilerClient::new(reqwest::Client::new(), compile_url)) as Arc<dyn RegoCompilerClient>
        });
    let policy_lifecycle_service =
        PolicyLifecycleService::new(repositories.policies, repositories.policy_versions, rego_compiler);

    let identity_gate_service = if config.oidc.enabled {
        let verifier = Arc::new(JwksBearerVerifier::new(
            reqwest::Client::new(),
            config.oidc.jwks_uri.clone(),
            config.oidc.issuer.clone(),
            config.oidc.audience.clone(),
            config.oidc.clock_skew_seconds,
            std::time::Duration::from_secs(config.oidc.jwks_cache_ttl_seconds),
        ));
        IdentityGateService::new(repositories.identity, verifier)
    } else {
        return Err(AppError::Validation(
            "OIDC_ENABLED=false is not yet supported: no alternative identity gate is wired".to_owned(),
        ));
    };

    let rate_limiter_service = caches::build_rate_limiter_service(config, redis_client.clone())?;

    Ok(AppState {
        decision_service,
        admin_service,
        policy_lifecycle_service,
        policy_rbac_evaluator: rbac_evaluator,
        identity_gate_service,
        rate_limiter_service,
        audit_repository: repositories.audit,
        audit_recorder,
        decision_cache: Arc::new(decision_cache),
        config: Arc::new(config.clone()),
        postgres_pool: pool,
        redis_client,
    })
}
