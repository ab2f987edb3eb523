//! Optional integration with an external OPA-compatible decision endpoint,
//! consulted alongside the RBAC evaluator per §4.3.

mod config;
mod ports;
mod service;

pub use config::PolicyEngineConfig;
pub use ports::{PolicyEngineClient, PolicyEngineRequest, PolicyEngineResponse};
pub use service::{ExternalPolicyAdapter, PolicyCompositionOutcome};
