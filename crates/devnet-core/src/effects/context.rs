//! Transaction context
//!
//! The caller's verified identity and the transaction's ordering marker are
//! passed explicitly into every registry operation.

use crate::identifiers::Address;
use crate::marker::Marker;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identity and ordering for one ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionContext {
    /// Authenticated identity of the submitting client
    pub caller: Address,
    /// Ordering marker unique to this transaction
    pub marker: Marker,
}

impl TransactionContext {
    /// Create a context for a caller at a given marker
    pub fn new(caller: impl Into<Address>, marker: Marker) -> Self {
        Self {
            caller: caller.into(),
            marker,
        }
    }
}

/// Source of strictly increasing transaction markers
#[async_trait]
pub trait MarkerSource: Send + Sync {
    /// Allocate the marker for the next transaction
    async fn next_marker(&self) -> Marker;

    /// Build a context for the next transaction submitted by `caller`
    async fn begin(&self, caller: Address) -> TransactionContext {
        TransactionContext {
            caller,
            marker: self.next_marker().await,
        }
    }
}
