use async_trait::async_trait;
use qryvanta_core::AppResult;

use super::ports::BearerClaims;

/// Verifies a bearer token's signature, expiry (with clock-skew
/// tolerance), issuer, and audience, returning its claims. Implementations
/// use the `jsonwebtoken` crate against a JWKS endpoint cache (§4.1); the
/// cache itself lives in `crates/infrastructure` alongside the other
/// network-backed adapters.
#[async_trait]
pub trait BearerVerifier: Send + Sync {
    /// Verifies `token`, returning its claims or an `AuthenticationFailed`
    /// error describing why verification failed.
    async fn verify(&self, token: &str) -> AppResult<BearerClaims>;
}

/// Default clock-skew tolerance applied to `exp`/`nbf` checks (§4.1).
pub const DEFAULT_CLOCK_SKEW_SECONDS: i64 = 30;

/// Default JWKS cache TTL before a refresh is attempted even without an
/// unknown key id (§4.1).
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 3_600;
