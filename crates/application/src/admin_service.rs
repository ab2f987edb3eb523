//! Admin services over the Data Model Store (§4.9): one thin service per
//! aggregate, each mutation authorized through the RBAC Evaluator, then
//! persisted, then published on the mutation event bus, then audited.

mod ports;
mod service;

pub use ports::{
    OrganizationRepository, PermissionRepository, RolePermissionRepository, RoleRepository,
    UserRepository, UserRoleRepository,
};
pub use service::AdminService;
