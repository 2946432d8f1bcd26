use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use tessera_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_KEY_PREFIX: &str = "tessera";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleStoreConfig {
    Memory,
    Redis { url: String, key_prefix: String },
}

impl RoleStoreConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redis { .. } => "redis",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub role_store: RoleStoreConfig,
    pub access_config_path: PathBuf,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = match lookup("API_PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|error| AppError::InvalidInput(format!("invalid API_PORT: {error}")))?,
            None => 3002,
        };

        let role_store = match lookup("ROLE_STORE_BACKEND")
            .unwrap_or_else(|| "memory".to_owned())
            .as_str()
        {
            "memory" => RoleStoreConfig::Memory,
            "redis" => RoleStoreConfig::Redis {
                url: required_non_empty(&lookup, "REDIS_URL")?,
                key_prefix: lookup("ROLE_STORE_KEY_PREFIX")
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_owned()),
            },
            other => {
                return Err(AppError::InvalidInput(format!(
                    "ROLE_STORE_BACKEND must be either 'memory' or 'redis', got '{other}'"
                )));
            }
        };

        let access_config_path = PathBuf::from(required_non_empty(&lookup, "ACCESS_CONFIG_PATH")?);

        Ok(Self {
            api_host,
            api_port,
            role_store,
            access_config_path,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::InvalidInput(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = lookup(name).ok_or_else(|| AppError::InvalidInput(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{name} must not be empty")));
    }

    Ok(value)
}
