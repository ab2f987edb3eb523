use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::config::PolicyEngineConfig;
use super::ports::{PolicyEngineClient, PolicyEngineRequest};

/// The composed outcome of RBAC plus (optionally) the external policy
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyCompositionOutcome {
    /// Final allow/deny after composition.
    pub allowed: bool,
    /// Set when the policy engine could not be reached after retries and
    /// the result fell back to RBAC alone.
    pub degraded: bool,
}

/// Optional adapter to an external OPA-compatible decision endpoint. When
/// disabled, callers should skip this component entirely and use the RBAC
/// decision directly (the "capability-returning factory" pattern of §9 —
/// the sentinel is simply "don't construct this adapter").
#[derive(Clone)]
pub struct ExternalPolicyAdapter {
    client: Arc<dyn PolicyEngineClient>,
    config: PolicyEngineConfig,
}

impl ExternalPolicyAdapter {
    /// Creates a new adapter. Construct only when `config.enabled`.
    #[must_use]
    pub fn new(client: Arc<dyn PolicyEngineClient>, config: PolicyEngineConfig) -> Self {
        Self { client, config }
    }

    /// Consults the policy engine and composes its result with the RBAC
    /// candidate decision per §4.3: deny if either denies; allow only if
    /// both allow; on transport failure after retries, fall back to RBAC
    /// alone with `degraded = true`.
    pub async fn evaluate(
        &self,
        request: &PolicyEngineRequest,
    ) -> PolicyCompositionOutcome {
        match self.call_with_retry(request).await {
            Ok(response) => {
                let policy_allowed = response.result.unwrap_or(false);
                PolicyCompositionOutcome {
                    allowed: request.rbac_decision && policy_allowed,
                    degraded: false,
                }
            }
            Err(error) => {
                warn!(%error, "external policy engine unreachable, falling back to RBAC");
                PolicyCompositionOutcome {
                    allowed: request.rbac_decision,
                    degraded: true,
                }
            }
        }
    }

    async fn call_with_retry(
        &self,
        request: &PolicyEngineRequest,
    ) -> qryvanta_core::AppResult<super::ports::PolicyEngineResponse> {
        let mut attempt = 0_u32;
        loop {
            match self.client.evaluate(request).await {
                Ok(response) => return Ok(response),
                Err(error) if attempt < self.config.retry_attempts => {
                    let delay = self.config.backoff_base_ms.saturating_mul(1 << attempt);
                    warn!(%error, attempt, delay_ms = delay, "policy engine call failed, retrying");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
