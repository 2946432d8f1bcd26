//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_service;
mod role_ports;
mod role_repository;
mod role_service;

pub use authorization_service::AuthorizationService;
pub use role_ports::{
    CapabilityProvider, CreateRoleParams, DEFAULT_LIST_MAX_ITEMS, GetRoleTarget, ListRolesParams,
    MAX_LIST_MAX_ITEMS, ModifyRoleParams, PolicyEngine, PutRolePolicyParams, RoleListing,
    RoleOperation, RoleOperationKind, RoleOutcome, RoleParams, RolePolicy, RolePolicyTarget,
    RoleStore, RoleTarget,
};
pub use role_repository::RoleRepository;
pub use role_service::RoleService;
