//! In-memory ledger handler for testing

use async_trait::async_trait;
use devnet_core::{LedgerKey, LedgerStore, Marker, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryLedger {
    versions: HashMap<LedgerKey, Vec<Vec<u8>>>,
    height: u64,
}

/// In-memory append-only ledger
///
/// Clones share the same underlying ledger.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    ledger: Arc<RwLock<MemoryLedger>>,
}

impl MemoryLedgerStore {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence of the last committed put
    pub async fn height(&self) -> Marker {
        Marker::new(self.ledger.read().await.height)
    }

    /// Number of distinct keys with at least one version
    pub async fn key_count(&self) -> usize {
        self.ledger.read().await.versions.len()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn get(&self, key: &LedgerKey) -> Result<Option<Vec<u8>>, StoreError> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .versions
            .get(key)
            .and_then(|versions| versions.last())
            .cloned())
    }

    async fn put(&self, key: &LedgerKey, value: Vec<u8>) -> Result<(), StoreError> {
        let mut ledger = self.ledger.write().await;
        ledger.versions.entry(key.clone()).or_default().push(value);
        ledger.height += 1;
        Ok(())
    }

    async fn exists(&self, key: &LedgerKey) -> Result<bool, StoreError> {
        let ledger = self.ledger.read().await;
        Ok(ledger.versions.contains_key(key))
    }

    async fn history(&self, key: &LedgerKey) -> Result<Vec<Vec<u8>>, StoreError> {
        let ledger = self.ledger.read().await;
        Ok(ledger.versions.get(key).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(part: &str) -> LedgerKey {
        LedgerKey::composite("test", &[part]).unwrap()
    }

    #[tokio::test]
    async fn put_appends_versions() {
        let store = MemoryLedgerStore::new();
        assert!(!store.exists(&key("a")).await.unwrap());

        store.put(&key("a"), vec![1]).await.unwrap();
        store.put(&key("a"), vec![2]).await.unwrap();
        store.put(&key("b"), vec![3]).await.unwrap();

        assert_eq!(store.get(&key("a")).await.unwrap(), Some(vec![2]));
        assert_eq!(store.history(&key("a")).await.unwrap(), vec![vec![1], vec![2]]);
        assert!(store.exists(&key("b")).await.unwrap());
        assert_eq!(store.height().await, Marker::new(3));
        assert_eq!(store.key_count().await, 2);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemoryLedgerStore::new();
        let view = store.clone();
        store.put(&key("a"), vec![9]).await.unwrap();
        assert_eq!(view.get(&key("a")).await.unwrap(), Some(vec![9]));
    }

    #[tokio::test]
    async fn missing_key_has_empty_history() {
        let store = MemoryLedgerStore::new();
        assert_eq!(store.get(&key("x")).await.unwrap(), None);
        assert!(store.history(&key("x")).await.unwrap().is_empty());
    }
}
