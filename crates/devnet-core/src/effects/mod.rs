//! Effect interfaces consumed by the registry
//!
//! Only signatures live here. Handlers are provided by `devnet-effects`.

/// Transaction context and marker allocation
pub mod context;

/// Append-only keyed ledger storage
pub mod ledger;

pub use context::{MarkerSource, TransactionContext};
pub use ledger::{LedgerStore, StoreError};
