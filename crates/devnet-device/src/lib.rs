//! # Devnet Device - device identity registry
//!
//! Device records move through an ownership-transfer lifecycle on top of an
//! append-only ledger:
//!
//! - **Flags**: `StatusFlags` and the byte-packing `StatusCodec`
//! - **Lifecycle**: `LifecycleState`, forward-only Issued → Trading → Redeemed
//! - **Record**: `DeviceRecord`, the entity and its invariants
//! - **Registry**: `DeviceRegistry`, the issue/transfer/redeem/flag transactions
//!
//! Storage and transaction context come from `devnet-core` effect interfaces;
//! this crate holds no handler implementations.

#![forbid(unsafe_code)]

/// Registry policy configuration
pub mod config;

/// Status flags and their codec
pub mod flags;

/// Lifecycle state machine
pub mod lifecycle;

/// Device record entity
pub mod record;

/// Transaction handlers
pub mod registry;

pub use config::{RegistryConfig, ReissuePolicy, TransferAuthorization};
pub use flags::{parse_flag_value, FlagSchema, StatusCodec, StatusFlag, StatusFlags};
pub use lifecycle::LifecycleState;
pub use record::{DeviceRecord, DEVICE_NAMESPACE, RECORD_SCHEMA_VERSION};
pub use registry::DeviceRegistry;
