use std::fs;
use std::path::Path;
use std::sync::Arc;

use tessera_application::{AuthorizationService, RoleRepository, RoleService, RoleStore};
use tessera_core::AppError;
use tessera_infrastructure::{
    AccessConfig, InMemoryCallerDirectory, InMemoryRoleStore, RedisRoleStore, StaticPolicyEngine,
};
use tracing::info;

use crate::api_config::{ApiConfig, RoleStoreConfig};
use crate::state::AppState;

pub fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let access_config = load_access_config(config.access_config_path.as_path())?;

    let mut redis_client = None;
    let store: Arc<dyn RoleStore> = match &config.role_store {
        RoleStoreConfig::Memory => Arc::new(InMemoryRoleStore::new()),
        RoleStoreConfig::Redis { url, key_prefix } => {
            let client = build_redis_client(url.as_str())?;
            redis_client = Some(client.clone());
            Arc::new(RedisRoleStore::new(client, key_prefix.as_str()))
        }
    };

    assemble_app_state(store, redis_client, access_config)
}

pub fn assemble_app_state(
    store: Arc<dyn RoleStore>,
    redis_client: Option<redis::Client>,
    access_config: AccessConfig,
) -> Result<AppState, AppError> {
    let caller_count = access_config.callers.len();
    let rule_count = access_config.policies.len();

    let caller_directory = Arc::new(InMemoryCallerDirectory::new(access_config.callers)?);
    let policy_engine = Arc::new(StaticPolicyEngine::new(access_config.policies)?);
    let authorization_service =
        AuthorizationService::new(caller_directory.clone(), policy_engine);
    let role_service = RoleService::new(RoleRepository::new(store), authorization_service);

    info!(callers = caller_count, policy_rules = rule_count, "access configuration loaded");

    Ok(AppState {
        role_service,
        caller_directory,
        redis_client,
    })
}

fn load_access_config(path: &Path) -> Result<AccessConfig, AppError> {
    let contents = fs::read_to_string(path).map_err(|error| {
        AppError::InvalidInput(format!(
            "failed to read ACCESS_CONFIG_PATH '{}': {error}",
            path.display()
        ))
    })?;

    AccessConfig::from_json(contents.as_str())
}

fn build_redis_client(redis_url: &str) -> Result<redis::Client, AppError> {
    redis::Client::open(redis_url)
        .map_err(|error| AppError::InvalidInput(format!("invalid REDIS_URL: {error}")))
}
