//! Redis-backed role store.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tessera_application::RoleStore;
use tessera_core::{AppError, AppResult};
use tracing::debug;

const SCAN_BATCH_SIZE: usize = 500;

/// Redis implementation of the role store port.
///
/// Exclusive writes use `SET NX`; prefix scans walk `SCAN MATCH`.
#[derive(Clone)]
pub struct RedisRoleStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisRoleStore {
    /// Creates a store with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to connect to redis: {error}"))
            })
    }
}

#[async_trait]
impl RoleStore for RedisRoleStore {
    async fn get(&self, key: &str) -> AppResult<Vec<u8>> {
        let mut connection = self.connection().await?;

        let value: Option<Vec<u8>> = connection
            .get(self.key_for(key))
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to read role entry '{key}': {error}"))
            })?;

        value.ok_or_else(|| AppError::NotFound(format!("no role store entry at '{key}'")))
    }

    async fn put(&self, key: &str, value: Vec<u8>, exclusive: bool) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let redis_key = self.key_for(key);

        if exclusive {
            let created: bool = connection
                .set_nx(redis_key, value)
                .await
                .map_err(|error| {
                    AppError::StoreUnavailable(format!(
                        "failed to create role entry '{key}': {error}"
                    ))
                })?;

            if !created {
                return Err(AppError::AlreadyExists(format!(
                    "role store entry '{key}' already exists"
                )));
            }

            return Ok(());
        }

        connection
            .set::<_, _, ()>(redis_key, value)
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to write role entry '{key}': {error}"))
            })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut connection = self.connection().await?;

        let removed: i64 = connection
            .del(self.key_for(key))
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to delete role entry '{key}': {error}"))
            })?;

        if removed == 0 {
            return Err(AppError::NotFound(format!("no role store entry at '{key}'")));
        }

        Ok(())
    }

    async fn scan(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut connection = self.connection().await?;
        let namespace = self.key_for("");
        let pattern = format!("{}*", escape_glob(self.key_for(prefix).as_str()));

        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern.as_str())
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE)
                .query_async(&mut connection)
                .await
                .map_err(|error| {
                    AppError::StoreUnavailable(format!(
                        "failed to scan role entries under '{prefix}': {error}"
                    ))
                })?;

            keys.extend(
                batch
                    .into_iter()
                    .filter_map(|key| key.strip_prefix(namespace.as_str()).map(str::to_owned)),
            );

            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }

        // SCAN may return a key more than once.
        keys.sort();
        keys.dedup();
        debug!(prefix, keys = keys.len(), "scanned redis role entries");
        Ok(keys)
    }
}

fn escape_glob(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        if matches!(character, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}
