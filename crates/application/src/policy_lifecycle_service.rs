//! Policy content versioning, Rego validation, and the
//! Draft→Active→Archived lifecycle (§4.5).

mod ports;
mod service;
mod validator;

pub use ports::{PolicyRepository, PolicyVersionRepository, RegoCompilerClient};
pub use service::PolicyLifecycleService;
pub use validator::{denylist_violations, local_structural_check, DENYLISTED_IMPORTS};
