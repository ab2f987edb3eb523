//! JWKS-backed bearer token verifier.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use parking_lot::RwLock;
use serde::Deserialize;

use qryvanta_application::{BearerClaims, BearerVerifier, DEFAULT_CLOCK_SKEW_SECONDS};
use qryvanta_core::{AppError, AppResult, TenantId};

#[derive(Debug, Deserialize)]
struct TokenClaims {
    sub: String,
    iss: String,
    email: Option<String>,
    /// Custom claim carrying the tenant this token was issued for.
    tenant_id: uuid::Uuid,
    // Read by jsonwebtoken's own expiry check, not by this module directly.
    #[allow(dead_code)]
    #[serde(default)]
    exp: i64,
}

struct CachedJwks {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Verifies bearer tokens against a remote JWKS endpoint, caching the key
/// set in a bounded, TTL-refreshed in-process slot shaped like the
/// platform's other two-tier caches, refreshing early on an unknown key id.
pub struct JwksBearerVerifier {
    http_client: reqwest::Client,
    jwks_uri: String,
    issuer: String,
    audience: String,
    clock_skew_seconds: i64,
    cache_ttl: Duration,
    cache: RwLock<Option<CachedJwks>>,
}

impl JwksBearerVerifier {
    /// Creates a verifier for the given JWKS endpoint, expected issuer, and
    /// expected audience.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        jwks_uri: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        clock_skew_seconds: i64,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            http_client,
            jwks_uri: jwks_uri.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            clock_skew_seconds,
            cache_ttl,
            cache: RwLock::new(None),
        }
    }

    /// Creates a verifier using the platform defaults for clock skew and
    /// JWKS cache TTL.
    #[must_use]
    pub fn with_defaults(
        http_client: reqwest::Client,
        jwks_uri: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self::new(
            http_client,
            jwks_uri,
            issuer,
            audience,
            DEFAULT_CLOCK_SKEW_SECONDS,
            Duration::from_secs(qryvanta_application::DEFAULT_JWKS_CACHE_TTL_SECONDS),
        )
    }

    async fn fetch_jwks(&self) -> AppResult<JwkSet> {
        let response = self
            .http_client
            .get(&self.jwks_uri)
            .send()
            .await
            .map_err(|error| AppError::DegradedDependency(format!("failed to reach JWKS endpoint: {error}")))?;

        response
            .json::<JwkSet>()
            .await
            .map_err(|error| AppError::DegradedDependency(format!("failed to parse JWKS response: {error}")))
    }

    async fn find_decoding_key(&self, key_id: Option<&str>) -> AppResult<DecodingKey> {
        {
            let cache = self.cache.read();
            if let Some(cached) = cache.as_ref()
                && cached.fetched_at.elapsed() < self.cache_ttl
                && let Some(key) = select_key(&cached.keys, key_id)
            {
                return decoding_key_from_jwk(key);
            }
        }

        let keys = self.fetch_jwks().await?;
        let decoding_key = select_key(&keys, key_id)
            .ok_or_else(|| AppError::AuthenticationFailed("no matching JWKS key id".to_owned()))
            .and_then(decoding_key_from_jwk)?;

        *self.cache.write() = Some(CachedJwks {
            keys,
            fetched_at: Instant::now(),
        });

        Ok(decoding_key)
    }
}

fn select_key<'a>(jwks: &'a JwkSet, key_id: Option<&str>) -> Option<&'a jsonwebtoken::jwk::Jwk> {
    match key_id {
        Some(key_id) => jwks.find(key_id),
        None => jwks.keys.first(),
    }
}

fn decoding_key_from_jwk(jwk: &jsonwebtoken::jwk::Jwk) -> AppResult<DecodingKey> {
    DecodingKey::from_jwk(jwk)
        .map_err(|error| AppError::AuthenticationFailed(format!("invalid JWKS key material: {error}")))
}

#[async_trait]
impl BearerVerifier for JwksBearerVerifier {
    async fn verify(&self, token: &str) -> AppResult<BearerClaims> {
        let header = decode_header(token)
            .map_err(|error| AppError::AuthenticationFailed(format!("malformed bearer token: {error}")))?;

        let decoding_key = self.find_decoding_key(header.kid.as_deref()).await?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.leeway = u64::try_from(self.clock_skew_seconds.max(0)).unwrap_or(0);

        let decoded = decode::<TokenClaims>(token, &decoding_key, &validation)
            .map_err(|error| AppError::AuthenticationFailed(format!("bearer token verification failed: {error}")))?;

        if decoded.claims.iss != self.issuer {
            return Err(AppError::AuthenticationFailed("unexpected token issuer".to_owned()));
        }

        Ok(BearerClaims {
            subject: decoded.claims.sub,
            email: decoded.claims.email,
            tenant_id: TenantId::from_uuid(decoded.claims.tenant_id),
        })
    }
}
