//! Ledger keys and storable records
//!
//! Records live in the ledger under a composite key: a namespace naming the
//! record class followed by the record's identity fields. Key construction is
//! deterministic so every peer addresses the same record for the same identity.

use crate::errors::{DevnetError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between composite key segments
pub const KEY_DELIMITER: char = ':';

/// Composite ledger key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerKey(String);

impl LedgerKey {
    /// Build a composite key from a namespace and identity parts
    pub fn composite(namespace: &str, parts: &[&str]) -> Result<Self> {
        if parts.is_empty() {
            return Err(DevnetError::invalid_argument(format!(
                "composite key for '{namespace}' needs at least one identity part"
            )));
        }
        let mut key = validate_segment(namespace, "namespace")?.to_string();
        for part in parts {
            key.push(KEY_DELIMITER);
            key.push_str(validate_segment(part, "key part")?);
        }
        Ok(Self(key))
    }

    /// Parse a key previously rendered with `as_str`
    pub fn parse(raw: &str) -> Result<Self> {
        let mut segments = raw.split(KEY_DELIMITER);
        let namespace = segments.next().unwrap_or_default();
        let parts: Vec<&str> = segments.collect();
        Self::composite(namespace, &parts)
    }

    /// Namespace segment of the key
    pub fn namespace(&self) -> &str {
        self.0.split(KEY_DELIMITER).next().unwrap_or_default()
    }

    /// Identity parts following the namespace
    pub fn parts(&self) -> Vec<&str> {
        self.0.split(KEY_DELIMITER).skip(1).collect()
    }

    /// Borrow the rendered key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_segment<'a>(segment: &'a str, what: &str) -> Result<&'a str> {
    if segment.is_empty() {
        return Err(DevnetError::invalid_argument(format!(
            "{what} of a ledger key must not be empty"
        )));
    }
    if segment.contains(KEY_DELIMITER) {
        return Err(DevnetError::invalid_argument(format!(
            "{what} '{segment}' must not contain '{KEY_DELIMITER}'"
        )));
    }
    Ok(segment)
}

/// Any entity that can be persisted in the ledger
pub trait LedgerStorable: Sized {
    /// Namespace shared by every record of this class
    fn namespace() -> &'static str;

    /// Composite key identifying this record
    fn key(&self) -> Result<LedgerKey>;

    /// Canonical storage bytes
    fn to_bytes(&self) -> Result<Vec<u8>>;

    /// Decode and validate storage bytes
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}
