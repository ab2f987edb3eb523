use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use qryvanta_core::AppError;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

/// Builds the full HTTP router: `/health` is unauthenticated, every other
/// route sits behind the identity & tenancy gate and the per-credential
/// rate limiter, in that order (§4.1, §4.7).
pub fn build_router(app_state: AppState) -> Result<Router, AppError> {
    let decision_routes = Router::new()
        .route("/v1/decisions", post(handlers::decision::decide))
        .route("/v1/decisions/batch", post(handlers::decision::decide_batch));

    let admin_routes = Router::new()
        .route("/v1/organization", get(handlers::admin::get_organization))
        .route("/v1/organizations", post(handlers::admin::create_organization))
        .route("/v1/organization/suspend", post(handlers::admin::suspend_organization))
        .route("/v1/organization/restore", post(handlers::admin::restore_organization))
        .route("/v1/users", get(handlers::admin::list_users))
        .route("/v1/users/{user_id}", get(handlers::admin::get_user))
        .route("/v1/users/{user_id}/status", post(handlers::admin::set_user_status))
        .route(
            "/v1/roles",
            get(handlers::admin::list_roles).post(handlers::admin::create_role),
        )
        .route(
            "/v1/roles/{role_id}",
            put(handlers::admin::rename_role).delete(handlers::admin::delete_role),
        )
        .route(
            "/v1/permissions",
            get(handlers::admin::list_permissions).post(handlers::admin::create_permission),
        )
        .route(
            "/v1/permissions/{permission_id}",
            delete(handlers::admin::delete_permission),
        )
        .route(
            "/v1/roles/{role_id}/permissions",
            get(handlers::admin::list_role_permissions).post(handlers::admin::grant_role_permission),
        )
        .route(
            "/v1/role-permissions/{edge_id}",
            delete(handlers::admin::revoke_role_permission),
        )
        .route(
            "/v1/users/{user_id}/roles",
            get(handlers::admin::list_user_roles).post(handlers::admin::assign_user_role),
        )
        .route(
            "/v1/users/{user_id}/roles/{assignment_id}",
            delete(handlers::admin::revoke_user_role),
        );

    let policy_routes = Router::new()
        .route(
            "/v1/policies",
            get(handlers::policy::list_policies).post(handlers::policy::create_policy),
        )
        .route("/v1/policies/{policy_id}", get(handlers::policy::get_policy))
        .route(
            "/v1/policies/{policy_id}/versions",
            get(handlers::policy::list_versions).post(handlers::policy::add_version),
        )
        .route("/v1/policies/{policy_id}/publish", post(handlers::policy::publish))
        .route("/v1/policies/{policy_id}/archive", post(handlers::policy::archive));

    let audit_routes = Router::new()
        .route("/v1/audit", get(handlers::audit::list_recent))
        .route("/v1/audit/export", get(handlers::audit::export));

    let cache_routes =
        Router::new().route("/v1/cache/invalidate", post(handlers::cache::invalidate_tenant));

    let authenticated_routes = decision_routes
        .merge(admin_routes)
        .merge(policy_routes)
        .merge(audit_routes)
        .merge(cache_routes)
        .route_layer(from_fn_with_state(app_state.clone(), middleware::rate_limit))
        .route_layer(from_fn_with_state(app_state.clone(), auth::authenticate));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(app_state.config.cors_allowed_origins.as_deref())?)
        .with_state(app_state))
}

fn build_cors_layer(allowed_origins: Option<&[String]>) -> Result<CorsLayer, AppError> {
    let allow_origin = match allowed_origins {
        None => AllowOrigin::any(),
        Some(origins) => {
            let parsed = origins
                .iter()
                .map(|origin| {
                    origin
                        .parse::<HeaderValue>()
                        .map_err(|error| AppError::Internal(format!("invalid CORS origin '{origin}': {error}")))
                })
                .collect::<Result<Vec<_>, AppError>>()?;
            AllowOrigin::list(parsed)
        }
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]))
}
