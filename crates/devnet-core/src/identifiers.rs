//! Identifier types used across devnet
//!
//! All identities on the ledger are opaque strings. The newtypes below keep
//! owner addresses, device addresses, and attribute fingerprints from being
//! mixed up at call sites.

use crate::errors::{DevnetError, Result};
use crate::ledger::KEY_DELIMITER;
use crate::marker::Marker;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a ledger participant: issuer, owner, or caller
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wrap a raw address string without validation
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the address carries no usable identity
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Content fingerprint of a device's attributes
///
/// Forms the identity part of the device's ledger key, so it must be
/// non-empty and free of the key delimiter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributesHash(String);

impl AttributesHash {
    /// Parse and validate an attributes hash
    pub fn parse(hash: impl Into<String>) -> Result<Self> {
        let hash = hash.into();
        if hash.trim().is_empty() {
            return Err(DevnetError::invalid_argument(
                "attributesHash must not be empty",
            ));
        }
        if hash.contains(KEY_DELIMITER) {
            return Err(DevnetError::invalid_argument(format!(
                "attributesHash '{hash}' must not contain '{KEY_DELIMITER}'"
            )));
        }
        Ok(Self(hash))
    }

    /// Fingerprint arbitrary attribute bytes with BLAKE3
    pub fn of_attributes(attributes: &[u8]) -> Self {
        Self(hex::encode(blake3::hash(attributes).as_bytes()))
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttributesHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address assigned to a device at issuance
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    const PREFIX: &'static str = "dev-";
    const DIGEST_BYTES: usize = 20;

    /// Derive the device address for an issuance transaction
    ///
    /// Every peer executing the same transaction derives the same address,
    /// and distinct issuance markers yield distinct addresses.
    pub fn derive(hash: &AttributesHash, marker: Marker) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"devnet.device-address");
        hasher.update(hash.as_str().as_bytes());
        hasher.update(&marker.value().to_be_bytes());
        let digest = hasher.finalize();
        Self(format!(
            "{}{}",
            Self::PREFIX,
            hex::encode(&digest.as_bytes()[..Self::DIGEST_BYTES])
        ))
    }

    /// Wrap an already-assigned address, e.g. when decoding a stored record
    pub fn from_assigned(address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(DevnetError::serialization("deviceAddress must not be empty"));
        }
        Ok(Self(address))
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
