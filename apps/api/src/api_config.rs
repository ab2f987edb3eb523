use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use qryvanta_application::PolicyEngineConfig;
use qryvanta_core::AppError;
use tracing_subscriber::EnvFilter;

/// Backend chosen for the L2 decision cache and the distributed rate
/// limiter. Both default to in-process storage so a single-instance
/// deployment needs no Redis at all; setting `REDIS_URL` alone does not
/// switch either on, since L1-only and local-bucket-only are both valid
/// standalone deployments (§4.4, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local storage; lost on restart, not shared across instances.
    InMemory,
    /// Shared storage backed by `REDIS_URL`.
    Redis,
}

impl StoreBackend {
    fn parse(name: &str, value: &str) -> Result<Self, AppError> {
        match value {
            "memory" | "in_memory" | "in-memory" => Ok(Self::InMemory),
            "redis" => Ok(Self::Redis),
            other => Err(AppError::Validation(format!(
                "{name} must be 'memory' or 'redis', got '{other}'"
            ))),
        }
    }
}

/// `cache.l1.*` / `cache.l2.*` settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub l1_max_entries: usize,
    pub l1_ttl_seconds: u64,
    pub l2_backend: StoreBackend,
    pub l2_ttl_seconds: u64,
}

/// `rateLimit.*` settings.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub backend: StoreBackend,
    pub capacity: u32,
    pub refill_tokens: u32,
    pub refill_period_seconds: i64,
}

/// `oidc.*` settings.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    pub enabled: bool,
    pub issuer: String,
    pub jwks_uri: String,
    pub audience: String,
    pub clock_skew_seconds: i64,
    pub jwks_cache_ttl_seconds: u64,
}

/// Full process configuration, assembled once by [`ApiConfig::load`] and
/// handed to the composition root. Never re-read mid-process.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    /// Required when either [`CacheConfig::l2_backend`] or
    /// [`RateLimitConfig::backend`] is [`StoreBackend::Redis`].
    pub redis_url: Option<String>,
    pub api_host: String,
    pub api_port: u16,
    /// Origins the CORS layer accepts, or `None` to allow any origin.
    pub cors_allowed_origins: Option<Vec<String>>,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub policy_engine: PolicyEngineConfig,
    /// Required when `policy_engine.enabled`.
    pub policy_engine_base_url: Option<String>,
    pub policy_engine_policy_path: Option<String>,
    /// Falls back to `local_structural_check` when unset.
    pub rego_compiler_url: Option<String>,
    pub oidc: OidcConfig,
    pub audit_retention_days: u32,
    pub rbac_max_hierarchy_depth: u32,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let policy_engine_enabled = bool_env("POLICY_ENGINE_ENABLED", false)?;
        let oidc_enabled = bool_env("OIDC_ENABLED", true)?;

        let cache = CacheConfig {
            l1_max_entries: parse_env_usize("CACHE_L1_MAX_ENTRIES", 10_000)?,
            l1_ttl_seconds: parse_env_u64("CACHE_L1_TTL_SECONDS", 10)?,
            l2_backend: store_backend_env("CACHE_L2_BACKEND", StoreBackend::InMemory)?,
            l2_ttl_seconds: parse_env_u64("CACHE_L2_TTL_SECONDS", 300)?,
        };

        let rate_limit = RateLimitConfig {
            backend: store_backend_env("RATE_LIMIT_BACKEND", StoreBackend::InMemory)?,
            capacity: parse_env_u32("RATE_LIMIT_CAPACITY", 100)?,
            refill_tokens: parse_env_u32("RATE_LIMIT_REFILL_TOKENS", 100)?,
            refill_period_seconds: parse_env_i64("RATE_LIMIT_REFILL_PERIOD_SECONDS", 60)?,
        };

        let policy_engine = PolicyEngineConfig {
            enabled: policy_engine_enabled,
            timeout_ms: parse_env_u64("POLICY_ENGINE_TIMEOUT_MS", 5_000)?,
            connect_timeout_ms: parse_env_u64("POLICY_ENGINE_CONNECT_TIMEOUT_MS", 2_000)?,
            retry_attempts: parse_env_u32("POLICY_ENGINE_RETRY_ATTEMPTS", 3)?,
            backoff_base_ms: parse_env_u64("POLICY_ENGINE_BACKOFF_BASE_MS", 100)?,
        };

        if policy_engine_enabled {
            required_non_empty_env("POLICY_ENGINE_BASE_URL")?;
            required_non_empty_env("POLICY_ENGINE_POLICY_PATH")?;
        }

        let oidc = OidcConfig {
            enabled: oidc_enabled,
            issuer: if oidc_enabled { required_non_empty_env("OIDC_ISSUER")? } else { String::new() },
            jwks_uri: if oidc_enabled { required_non_empty_env("OIDC_JWKS_URI")? } else { String::new() },
            audience: if oidc_enabled { required_non_empty_env("OIDC_AUDIENCE")? } else { String::new() },
            clock_skew_seconds: parse_env_i64("OIDC_CLOCK_SKEW_SECONDS", 30)?,
            jwks_cache_ttl_seconds: parse_env_u64("OIDC_JWKS_CACHE_TTL_SECONDS", 3_600)?,
        };

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_owned)
                    .collect()
            });

        let config = Self {
            database_url: required_non_empty_env("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL").ok().filter(|value| !value.trim().is_empty()),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_owned()),
            api_port: parse_env_u32("API_PORT", 8080)? as u16,
            cors_allowed_origins,
            cache,
            rate_limit,
            policy_engine,
            policy_engine_base_url: env::var("POLICY_ENGINE_BASE_URL").ok(),
            policy_engine_policy_path: env::var("POLICY_ENGINE_POLICY_PATH").ok(),
            rego_compiler_url: env::var("REGO_COMPILER_URL").ok().filter(|value| !value.trim().is_empty()),
            oidc,
            audit_retention_days: parse_env_u32("AUDIT_RETENTION_DAYS", 90)?,
            rbac_max_hierarchy_depth: parse_env_u32("RBAC_MAX_HIERARCHY_DEPTH", 10)?,
        };

        if (config.cache.l2_backend == StoreBackend::Redis || config.rate_limit.backend == StoreBackend::Redis)
            && config.redis_url.is_none()
        {
            return Err(AppError::Validation(
                "REDIS_URL must be set when CACHE_L2_BACKEND or RATE_LIMIT_BACKEND is 'redis'".to_owned(),
            ));
        }

        Ok(config)
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn bool_env(name: &str, default: bool) -> Result<bool, AppError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => match value.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(AppError::Validation(format!(
                "{name} must be 'true' or 'false', got '{other}'"
            ))),
        },
    }
}

fn store_backend_env(name: &str, default: StoreBackend) -> Result<StoreBackend, AppError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => StoreBackend::parse(name, &value),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, AppError> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, AppError> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_i64(name: &str, default: i64) -> Result<i64, AppError> {
    match env::var(name) {
        Ok(value) => value.parse::<i64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, AppError> {
    match env::var(name) {
        Ok(value) => value.parse::<usize>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
