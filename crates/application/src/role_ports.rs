mod authorization;
mod operations;
mod store;

pub use authorization::{CapabilityProvider, PolicyEngine};
pub use operations::{
    CreateRoleParams, DEFAULT_LIST_MAX_ITEMS, GetRoleTarget, ListRolesParams, MAX_LIST_MAX_ITEMS,
    ModifyRoleParams, PutRolePolicyParams, RoleListing, RoleOperation, RoleOperationKind,
    RoleOutcome, RoleParams, RolePolicy, RolePolicyTarget, RoleTarget,
};
pub use store::RoleStore;
