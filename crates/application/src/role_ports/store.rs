use async_trait::async_trait;

use tessera_core::AppResult;

/// Key/value store port backing the role indices.
///
/// Implementations report a missing key as `AppError::NotFound`, an exclusive
/// write collision as `AppError::AlreadyExists` and any I/O failure as
/// `AppError::StoreUnavailable`.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Reads the value stored at `key`.
    async fn get(&self, key: &str) -> AppResult<Vec<u8>>;

    /// Writes `value` at `key`.
    ///
    /// With `exclusive` the write is an atomic create-if-absent.
    async fn put(&self, key: &str, value: Vec<u8>, exclusive: bool) -> AppResult<()>;

    /// Removes the value stored at `key`.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Lists every key starting with `prefix`, in no particular order.
    async fn scan(&self, prefix: &str) -> AppResult<Vec<String>>;
}
