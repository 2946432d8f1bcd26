use serde::Deserialize;
use tessera_core::{AppError, AppResult};
use tessera_domain::PolicyDecision;

/// Callers and policy rules loaded at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccessConfig {
    /// Known callers keyed by access key.
    #[serde(default)]
    pub callers: Vec<CallerEntry>,
    /// Ordered policy rules.
    #[serde(default)]
    pub policies: Vec<PolicyRule>,
}

impl AccessConfig {
    /// Parses an access configuration document.
    pub fn from_json(value: &str) -> AppResult<Self> {
        serde_json::from_str(value).map_err(|error| {
            AppError::InvalidInput(format!("invalid access configuration: {error}"))
        })
    }
}

/// One caller entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallerEntry {
    /// Bearer access key presented by the caller.
    pub access_key: String,
    /// Caller subject.
    pub subject: String,
    /// Caller tenant; empty for the global tenant.
    #[serde(default)]
    pub tenant: String,
    /// Capability string such as `roles=read,write`.
    pub capabilities: String,
}

/// One policy rule. Patterns accept `*` and `?` wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PolicyRule {
    /// Rule effect.
    pub effect: PolicyDecision,
    /// Principal ARN patterns.
    pub principals: Vec<String>,
    /// IAM action patterns.
    pub actions: Vec<String>,
    /// Resource ARN patterns.
    pub resources: Vec<String>,
}
