//! RBAC evaluation engine: user→roles→(hierarchy closure)→
//! role-permissions→decision, with resource-scope matching.

mod closure;
mod ports;
mod service;

pub use ports::RbacRepository;
pub use service::{DecisionOutcome, RbacDecision, RbacEvaluator};
