use std::collections::BTreeMap;

use async_trait::async_trait;
use tessera_application::RoleStore;
use tessera_core::{AppError, AppResult};
use tokio::sync::RwLock;

/// In-memory role store implementation.
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryRoleStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn get(&self, key: &str) -> AppResult<Vec<u8>> {
        self.entries
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("no role store entry at '{key}'")))
    }

    async fn put(&self, key: &str, value: Vec<u8>, exclusive: bool) -> AppResult<()> {
        let mut entries = self.entries.write().await;

        if exclusive && entries.contains_key(key) {
            return Err(AppError::AlreadyExists(format!(
                "role store entry '{key}' already exists"
            )));
        }

        entries.insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        match self.entries.write().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("no role store entry at '{key}'"))),
        }
    }

    async fn scan(&self, prefix: &str) -> AppResult<Vec<String>> {
        let entries = self.entries.read().await;

        Ok(entries
            .range(prefix.to_owned()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
