//! Unified error system for devnet
//!
//! Every registry operation fails with exactly one `DevnetError`. The variant
//! identifies the failure class, the message names the offending key or field.
//! Errors abort the transaction: nothing is persisted when one is returned.

use serde::{Deserialize, Serialize};

/// Stable tag for each error class, independent of message text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Referenced record does not exist
    NotFound,
    /// Issuance attempted for a key already present
    AlreadyExists,
    /// Lifecycle transition violates the forward-only ordering
    IllegalTransition,
    /// Redeem requested on a terminal record
    AlreadyRedeemed,
    /// Caller-asserted current owner does not match the record
    OwnershipMismatch,
    /// Authenticated caller is not permitted to perform the operation
    Unauthorized,
    /// Owner address is malformed or not acceptable
    InvalidOwner,
    /// Argument is malformed
    InvalidArgument,
    /// Flag set falls outside the declared flag schema
    InvalidFlagSet,
    /// Transaction marker does not advance past the record's last marker
    StaleMarker,
    /// Stored bytes could not be encoded or decoded
    Serialization,
    /// Ledger store failure
    Storage,
    /// Configuration failure
    Config,
}

/// Unified error type for all devnet operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum DevnetError {
    /// Referenced record does not exist
    #[error("Not found: {message}")]
    NotFound {
        /// Describes what was looked up
        message: String,
    },

    /// Issuance attempted for a key already present
    #[error("Already exists: {message}")]
    AlreadyExists {
        /// Describes the conflicting key
        message: String,
    },

    /// Lifecycle transition violates the forward-only ordering
    #[error("Illegal transition: {message}")]
    IllegalTransition {
        /// Describes the rejected transition
        message: String,
    },

    /// Redeem requested on a terminal record
    #[error("Already redeemed: {message}")]
    AlreadyRedeemed {
        /// Describes the redeemed record
        message: String,
    },

    /// Caller-asserted current owner does not match the record
    #[error("Ownership mismatch: {message}")]
    OwnershipMismatch {
        /// Describes the asserted and actual owner
        message: String,
    },

    /// Caller is not permitted to perform the operation
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Describes the rejected caller
        message: String,
    },

    /// Owner address is malformed or not acceptable
    #[error("Invalid owner: {message}")]
    InvalidOwner {
        /// Describes the rejected owner
        message: String,
    },

    /// Argument is malformed
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Describes the rejected argument
        message: String,
    },

    /// Flag set falls outside the declared flag schema
    #[error("Invalid flag set: {message}")]
    InvalidFlagSet {
        /// Describes the offending flag or bits
        message: String,
    },

    /// Transaction marker does not advance past the record's last marker
    #[error("Stale marker: {message}")]
    StaleMarker {
        /// Describes the marker ordering violation
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Describes the encoding failure
        message: String,
    },

    /// Ledger store failure
    #[error("Storage error: {message}")]
    Storage {
        /// Describes the storage failure
        message: String,
    },

    /// Configuration failure
    #[error("Config error: {message}")]
    Config {
        /// Describes the configuration problem
        message: String,
    },
}

impl DevnetError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an already exists error
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    /// Create an illegal transition error
    pub fn illegal_transition(message: impl Into<String>) -> Self {
        Self::IllegalTransition {
            message: message.into(),
        }
    }

    /// Create an already redeemed error
    pub fn already_redeemed(message: impl Into<String>) -> Self {
        Self::AlreadyRedeemed {
            message: message.into(),
        }
    }

    /// Create an ownership mismatch error
    pub fn ownership_mismatch(message: impl Into<String>) -> Self {
        Self::OwnershipMismatch {
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create an invalid owner error
    pub fn invalid_owner(message: impl Into<String>) -> Self {
        Self::InvalidOwner {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invalid flag set error
    pub fn invalid_flag_set(message: impl Into<String>) -> Self {
        Self::InvalidFlagSet {
            message: message.into(),
        }
    }

    /// Create a stale marker error
    pub fn stale_marker(message: impl Into<String>) -> Self {
        Self::StaleMarker {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Stable classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::IllegalTransition { .. } => ErrorKind::IllegalTransition,
            Self::AlreadyRedeemed { .. } => ErrorKind::AlreadyRedeemed,
            Self::OwnershipMismatch { .. } => ErrorKind::OwnershipMismatch,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InvalidOwner { .. } => ErrorKind::InvalidOwner,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InvalidFlagSet { .. } => ErrorKind::InvalidFlagSet,
            Self::StaleMarker { .. } => ErrorKind::StaleMarker,
            Self::Serialization { .. } => ErrorKind::Serialization,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Message carried by this error
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message }
            | Self::AlreadyExists { message }
            | Self::IllegalTransition { message }
            | Self::AlreadyRedeemed { message }
            | Self::OwnershipMismatch { message }
            | Self::Unauthorized { message }
            | Self::InvalidOwner { message }
            | Self::InvalidArgument { message }
            | Self::InvalidFlagSet { message }
            | Self::StaleMarker { message }
            | Self::Serialization { message }
            | Self::Storage { message }
            | Self::Config { message } => message,
        }
    }
}

/// Standard Result type for devnet operations
pub type Result<T> = std::result::Result<T, DevnetError>;

impl From<std::io::Error> for DevnetError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<serde_json::Error> for DevnetError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DevnetError::not_found("device h1");
        assert!(matches!(err, DevnetError::NotFound { .. }));
        assert_eq!(err.to_string(), "Not found: device h1");
        assert_eq!(err.message(), "device h1");
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            DevnetError::already_redeemed("x").kind(),
            ErrorKind::AlreadyRedeemed
        );
        assert_eq!(DevnetError::unauthorized("x").kind(), ErrorKind::Unauthorized);
        assert_eq!(
            DevnetError::invalid_flag_set("x").kind(),
            ErrorKind::InvalidFlagSet
        );
        assert_eq!(DevnetError::stale_marker("x").kind(), ErrorKind::StaleMarker);
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "ledger.jsonl");
        let err = DevnetError::from(io_err);
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
}
