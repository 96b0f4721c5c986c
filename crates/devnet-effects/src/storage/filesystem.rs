//! File-backed append-only ledger
//!
//! The ledger is a single JSON-lines log. Each committed put appends one line
//! `{"sequence":n,"key":"..","value":"<hex>"}` and syncs it; committed lines
//! are never rewritten. On open the log is replayed into an in-memory index.
//! Sequence numbers must be contiguous from 1, otherwise the log is treated as
//! corrupted.
//!
//! A line only counts once its terminating newline is on disk. A failed append
//! is rolled back to the previous length, and an unterminated tail left by a
//! crash is truncated on the next open.

use async_trait::async_trait;
use devnet_core::{LedgerKey, LedgerStore, Marker, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize, Deserialize)]
struct LogEntry {
    sequence: u64,
    key: LedgerKey,
    value: String,
}

#[derive(Debug, Default)]
struct LedgerIndex {
    versions: HashMap<LedgerKey, Vec<Vec<u8>>>,
    height: u64,
}

impl LedgerIndex {
    fn apply(&mut self, sequence: u64, key: LedgerKey, value: Vec<u8>) {
        self.versions.entry(key).or_default().push(value);
        self.height = sequence;
    }
}

/// Append-only ledger persisted to a JSON-lines file
#[derive(Debug)]
pub struct FileLedgerStore {
    path: PathBuf,
    index: RwLock<LedgerIndex>,
}

impl FileLedgerStore {
    /// Open the ledger at `path`, creating parent directories as needed
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Io(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let mut index = LedgerIndex::default();
        match fs::read_to_string(&path).await {
            Ok(content) => {
                let committed = replay(&content, &mut index)?;
                if committed < content.len() {
                    warn!(
                        path = %path.display(),
                        torn_bytes = content.len() - committed,
                        "Truncating unterminated ledger tail"
                    );
                    truncate(&path, committed as u64).await?;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "Failed to read ledger {}: {e}",
                    path.display()
                )))
            }
        }

        info!(
            path = %path.display(),
            height = index.height,
            keys = index.versions.len(),
            "Opened file ledger"
        );
        Ok(Self {
            path,
            index: RwLock::new(index),
        })
    }

    /// Location of the ledger log
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sequence of the last committed put
    pub async fn height(&self) -> Marker {
        Marker::new(self.index.read().await.height)
    }
}

/// Replay every newline-terminated line; returns the committed byte length
fn replay(content: &str, index: &mut LedgerIndex) -> Result<usize, StoreError> {
    let committed = content.rfind('\n').map_or(0, |last| last + 1);
    for (line_no, line) in content[..committed].lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: LogEntry = serde_json::from_str(line).map_err(|e| {
            StoreError::Corrupted(format!("line {}: {e}", line_no + 1))
        })?;
        if entry.sequence != index.height + 1 {
            return Err(StoreError::Corrupted(format!(
                "line {}: sequence {} follows {}",
                line_no + 1,
                entry.sequence,
                index.height
            )));
        }
        let value = hex::decode(&entry.value).map_err(|e| {
            StoreError::Corrupted(format!("line {}: {e}", line_no + 1))
        })?;
        index.apply(entry.sequence, entry.key, value);
    }
    Ok(committed)
}

async fn truncate(path: &Path, len: u64) -> Result<(), StoreError> {
    let file = fs::OpenOptions::new()
        .write(true)
        .open(path)
        .await
        .map_err(|e| StoreError::Io(format!("Failed to open {}: {e}", path.display())))?;
    file.set_len(len)
        .await
        .map_err(|e| StoreError::Io(format!("Failed to truncate {}: {e}", path.display())))?;
    file.sync_data()
        .await
        .map_err(|e| StoreError::Io(format!("Failed to sync ledger: {e}")))
}

async fn append(file: &mut fs::File, bytes: &[u8]) -> Result<(), StoreError> {
    file.write_all(bytes)
        .await
        .map_err(|e| StoreError::Io(format!("Failed to append ledger entry: {e}")))?;
    file.sync_data()
        .await
        .map_err(|e| StoreError::Io(format!("Failed to sync ledger: {e}")))
}

#[async_trait]
impl LedgerStore for FileLedgerStore {
    async fn get(&self, key: &LedgerKey) -> Result<Option<Vec<u8>>, StoreError> {
        let index = self.index.read().await;
        Ok(index
            .versions
            .get(key)
            .and_then(|versions| versions.last())
            .cloned())
    }

    async fn put(&self, key: &LedgerKey, value: Vec<u8>) -> Result<(), StoreError> {
        let mut index = self.index.write().await;
        let entry = LogEntry {
            sequence: index.height + 1,
            key: key.clone(),
            value: hex::encode(&value),
        };
        let mut line = serde_json::to_string(&entry)
            .map_err(|e| StoreError::Io(format!("Failed to encode ledger entry: {e}")))?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| StoreError::Io(format!("Failed to open {}: {e}", self.path.display())))?;
        let committed = file
            .metadata()
            .await
            .map_err(|e| StoreError::Io(format!("Failed to stat {}: {e}", self.path.display())))?
            .len();

        if let Err(err) = append(&mut file, line.as_bytes()).await {
            if let Err(rollback) = file.set_len(committed).await {
                warn!(
                    path = %self.path.display(),
                    error = %rollback,
                    "Failed to roll back partial ledger append"
                );
            }
            return Err(err);
        }

        debug!(key = %key, sequence = entry.sequence, "Appended ledger entry");
        index.apply(entry.sequence, entry.key, value);
        Ok(())
    }

    async fn exists(&self, key: &LedgerKey) -> Result<bool, StoreError> {
        Ok(self.index.read().await.versions.contains_key(key))
    }

    async fn history(&self, key: &LedgerKey) -> Result<Vec<Vec<u8>>, StoreError> {
        let index = self.index.read().await;
        Ok(index.versions.get(key).cloned().unwrap_or_default())
    }
}
