//! Identity & tenancy gate (§4.1): resolves an inbound bearer token or API
//! key to a tenant and, for bearer credentials, an internal user — JIT
//! provisioning users the first time a bearer subject is seen.

mod jwt;
mod ports;
mod service;

pub use jwt::{BearerVerifier, DEFAULT_CLOCK_SKEW_SECONDS, DEFAULT_JWKS_CACHE_TTL_SECONDS};
pub use ports::{BearerClaims, IdentityRepository};
pub use service::IdentityGateService;
