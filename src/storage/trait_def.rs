use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// String key to string value storage.
///
/// Two lifetimes are in play: durable stores survive restarts and are
/// shared across contexts, while the in-memory implementation lives only as
/// long as the owning process, standing in for tab-scoped browser storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Initialize the store (create tables, etc.)
    async fn init(&self) -> Result<()>;

    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any existing value
    async fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete the value under `key`, returning whether it existed
    async fn remove(&self, key: &str) -> Result<bool>;
}
