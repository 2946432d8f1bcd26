//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod policy;
mod role;
mod security;

pub use policy::{
    MAX_POLICY_DOCUMENT_LEN, MAX_POLICY_NAME_LEN, PolicyDocument, validate_policy_name,
};
pub use role::{
    DEFAULT_ROLE_PATH, MAX_PATH_NAME_LEN, MAX_ROLE_NAME_LEN, ROLE_ARN_PREFIX,
    ROLE_ENCODING_COMPAT_VERSION, ROLE_ENCODING_VERSION, Role, SESSION_DURATION_MAX,
    SESSION_DURATION_MIN, extract_name_tenant, role_arn,
};
pub use security::{CapabilityLevel, CapabilitySet, IamAction, PolicyDecision};
