//! HTTP handler functions, grouped by the surface they serve.

use qryvanta_core::{AppError, PrincipalId};

pub mod admin;
pub mod audit;
pub mod cache;
pub mod decision;
pub mod health;
pub mod policy;

/// Extracts the acting principal from an authenticated caller, rejecting
/// API-key credentials (which carry no principal, per §4.1) from any
/// mutating or principal-scoped admin operation.
fn require_principal(caller: &qryvanta_core::AuthenticatedCaller) -> Result<&PrincipalId, AppError> {
    caller.principal().ok_or_else(|| {
        AppError::AuthorizationDenied(
            "admin operations require a bearer-authenticated principal".to_owned(),
        )
    })
}
