//! Ledger storage effect interface
//!
//! The ledger is append-only: `put` commits a new version of a key and never
//! discards earlier ones. `get` observes the latest committed version.

use crate::errors::DevnetError;
use crate::ledger::LedgerKey;
use async_trait::async_trait;

/// Error type for ledger store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend I/O failed
    #[error("Ledger I/O failed: {0}")]
    Io(String),

    /// Persisted ledger data is unreadable
    #[error("Ledger corrupted: {0}")]
    Corrupted(String),
}

impl From<StoreError> for DevnetError {
    fn from(err: StoreError) -> Self {
        DevnetError::storage(err.to_string())
    }
}

/// Keyed, versioned, append-only record storage
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Latest committed bytes for a key, if any
    async fn get(&self, key: &LedgerKey) -> Result<Option<Vec<u8>>, StoreError>;

    /// Commit a new version for a key
    async fn put(&self, key: &LedgerKey, value: Vec<u8>) -> Result<(), StoreError>;

    /// Whether any version exists for a key
    async fn exists(&self, key: &LedgerKey) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Every committed version for a key, oldest first
    async fn history(&self, key: &LedgerKey) -> Result<Vec<Vec<u8>>, StoreError>;
}
