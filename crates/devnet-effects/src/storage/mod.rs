//! Ledger store handlers

mod filesystem;
mod memory;

pub use filesystem::FileLedgerStore;
pub use memory::MemoryLedgerStore;
