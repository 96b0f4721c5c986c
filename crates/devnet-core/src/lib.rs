//! Devnet Core - foundation for the device registry
//!
//! This crate provides the identifier types, unified error, canonical
//! serialization, and effect interfaces shared by every devnet crate. It holds
//! no registry logic and no handler implementations.
//!
//! # Contents
//!
//! - `Address`, `AttributesHash`, `DeviceAddress`: opaque identities
//! - `Marker`: ledger-assigned ordering token
//! - `LedgerKey`, `LedgerStorable`: composite keys and storable records
//! - `LedgerStore`, `MarkerSource`, `TransactionContext`: effect interfaces
//! - `DevnetConfig`: layered file and environment configuration

#![forbid(unsafe_code)]

/// Layered configuration trait
pub mod config;

/// Effect interfaces (no implementations)
pub mod effects;

/// Unified error handling
pub mod errors;

/// Participant, device, and attribute identifiers
pub mod identifiers;

/// Composite keys and storable records
pub mod ledger;

/// Ledger ordering markers
pub mod marker;

/// DAG-CBOR serialization (canonical format)
pub mod serialization;

pub use config::{ConfigFormat, DevnetConfig};
pub use effects::{LedgerStore, MarkerSource, StoreError, TransactionContext};
pub use errors::{DevnetError, ErrorKind, Result as DevnetResult};
pub use identifiers::{Address, AttributesHash, DeviceAddress};
pub use ledger::{LedgerKey, LedgerStorable, KEY_DELIMITER};
pub use marker::Marker;
pub use serialization::{from_slice, to_vec, SerializationError};
