//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod access_config;
mod in_memory_caller_directory;
mod in_memory_role_store;
mod redis_role_store;
mod static_policy_engine;

pub use access_config::{AccessConfig, CallerEntry, PolicyRule};
pub use in_memory_caller_directory::InMemoryCallerDirectory;
pub use in_memory_role_store::InMemoryRoleStore;
pub use redis_role_store::RedisRoleStore;
pub use static_policy_engine::StaticPolicyEngine;
