use std::collections::HashMap;

use async_trait::async_trait;
use tessera_application::CapabilityProvider;
use tessera_core::{AppError, AppResult, CallerIdentity, TenantName};
use tessera_domain::{CapabilityLevel, CapabilitySet};

use crate::CallerEntry;

/// Static directory of callers resolving access keys and capabilities.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCallerDirectory {
    identities: HashMap<String, CallerIdentity>,
    capabilities: HashMap<(TenantName, String), CapabilitySet>,
}

impl InMemoryCallerDirectory {
    /// Builds a directory from configured caller entries.
    pub fn new(entries: Vec<CallerEntry>) -> AppResult<Self> {
        let mut directory = Self::default();

        for entry in entries {
            if entry.access_key.trim().is_empty() {
                return Err(AppError::InvalidInput(format!(
                    "caller '{}' has an empty access key",
                    entry.subject
                )));
            }

            let capabilities: CapabilitySet = entry.capabilities.parse()?;
            let identity = CallerIdentity::new(entry.subject, TenantName::new(entry.tenant)?);

            if directory.identities.contains_key(entry.access_key.as_str()) {
                return Err(AppError::InvalidInput(format!(
                    "access key for caller '{}' is configured twice",
                    identity.subject()
                )));
            }

            directory.capabilities.insert(
                (identity.tenant().clone(), identity.subject().to_owned()),
                capabilities,
            );
            directory.identities.insert(entry.access_key, identity);
        }

        Ok(directory)
    }

    /// Resolves the caller presenting `access_key`.
    pub fn authenticate(&self, access_key: &str) -> AppResult<CallerIdentity> {
        self.identities
            .get(access_key)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("unknown access key".to_owned()))
    }
}

#[async_trait]
impl CapabilityProvider for InMemoryCallerDirectory {
    async fn has_capability(
        &self,
        caller: &CallerIdentity,
        level: CapabilityLevel,
    ) -> AppResult<bool> {
        Ok(self
            .capabilities
            .get(&(caller.tenant().clone(), caller.subject().to_owned()))
            .is_some_and(|capabilities| capabilities.allows(level)))
    }
}
