//! Devnet Effects - handler implementations
//!
//! Concrete handlers for the effect interfaces declared in `devnet-core`:
//! an in-memory ledger for tests, a file-backed ledger for the CLI, and a
//! sequential marker source.

#![forbid(unsafe_code)]

/// Sequential marker source
pub mod clock;

/// Ledger store handlers
pub mod storage;

pub use clock::SequenceClock;
pub use storage::{FileLedgerStore, MemoryLedgerStore};
