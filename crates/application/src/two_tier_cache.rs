//! Two-tier decision cache: a bounded in-process L1 plus an optional
//! distributed L2, keyed by request fingerprint.

mod fingerprint;
mod ports;
mod service;

pub use fingerprint::{fingerprint, tenant_prefix};
pub use ports::{CachedDecision, L1Cache, L2Cache};
pub use service::{CacheStats, TwoTierDecisionCache};
