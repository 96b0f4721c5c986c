//! Ordering markers assigned by the ledger
//!
//! A marker is the ledger's transaction sequence at the time a record was
//! written. Markers are totally ordered and strictly increase across committed
//! transactions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, externally assigned monotonic ordering token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marker(pub u64);

impl Marker {
    /// Marker preceding every transaction
    pub const GENESIS: Marker = Marker(0);

    /// Create a new marker
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the inner sequence value
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Get the next marker in sequence
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

impl From<u64> for Marker {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
