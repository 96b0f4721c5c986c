//! Device record entity
//!
//! Fields are private. Every mutator preserves the record invariants:
//! - device address, attributes hash, and issuer never change after issuance
//! - lifecycle state only moves forward (see `LifecycleState`)
//! - the last marker strictly increases with every mutation
//! - a redeemed record is owned by its issuer

use crate::flags::{FlagSchema, StatusCodec, StatusFlag, StatusFlags};
use crate::lifecycle::LifecycleState;
use devnet_core::{
    from_slice, to_vec, Address, AttributesHash, DeviceAddress, DevnetError, DevnetResult,
    LedgerKey, LedgerStorable, Marker,
};
use serde::{Deserialize, Serialize};

/// Ledger namespace of device records
pub const DEVICE_NAMESPACE: &str = "org.devicenet.device";

/// Storage schema version written by this crate
pub const RECORD_SCHEMA_VERSION: u16 = 1;

/// A device identity and its ownership lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    device_address: DeviceAddress,
    issuer_address: Address,
    owner_address: Address,
    attributes_hash: AttributesHash,
    first_marker: Marker,
    last_marker: Marker,
    lifecycle_state: LifecycleState,
    status_flags: StatusFlags,
}

impl DeviceRecord {
    /// Create a freshly issued record
    ///
    /// The owner defaults to the issuer. Both markers are set to the issuing
    /// transaction's marker.
    pub fn issue(
        attributes_hash: AttributesHash,
        issuer: Address,
        owner: Option<Address>,
        flags: StatusFlags,
        marker: Marker,
    ) -> DevnetResult<Self> {
        if issuer.is_empty() {
            return Err(DevnetError::invalid_owner(format!(
                "issuerAddress of device {attributes_hash} must not be empty"
            )));
        }
        let owner = owner.unwrap_or_else(|| issuer.clone());
        if owner.is_empty() {
            return Err(DevnetError::invalid_owner(format!(
                "ownerAddress of device {attributes_hash} must not be empty"
            )));
        }
        Ok(Self {
            device_address: DeviceAddress::derive(&attributes_hash, marker),
            issuer_address: issuer,
            owner_address: owner,
            attributes_hash,
            first_marker: marker,
            last_marker: marker,
            lifecycle_state: LifecycleState::Issued,
            status_flags: flags,
        })
    }

    /// Ledger key of the record for an attributes hash
    pub fn key_for(attributes_hash: &AttributesHash) -> DevnetResult<LedgerKey> {
        LedgerKey::composite(DEVICE_NAMESPACE, &[attributes_hash.as_str()])
    }

    /// Address assigned at issuance
    pub fn device_address(&self) -> &DeviceAddress {
        &self.device_address
    }

    /// Issuing party; the redemption destination
    pub fn issuer_address(&self) -> &Address {
        &self.issuer_address
    }

    /// Current holder
    pub fn owner_address(&self) -> &Address {
        &self.owner_address
    }

    /// Attribute fingerprint identifying the device
    pub fn attributes_hash(&self) -> &AttributesHash {
        &self.attributes_hash
    }

    /// Marker of the issuing transaction
    pub fn first_marker(&self) -> Marker {
        self.first_marker
    }

    /// Marker of the latest mutation
    pub fn last_marker(&self) -> Marker {
        self.last_marker
    }

    /// Current lifecycle state
    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle_state
    }

    /// Decoded status flags
    pub fn status_flags(&self) -> StatusFlags {
        self.status_flags
    }

    /// Whether `address` is the current owner
    pub fn is_owner(&self, address: &Address) -> bool {
        self.owner_address == *address
    }

    /// Whether the device has been redeemed
    pub fn is_redeemed(&self) -> bool {
        self.lifecycle_state.is_terminal()
    }

    /// Replace the owner
    pub fn set_owner(&mut self, address: Address) -> DevnetResult<()> {
        if address.is_empty() {
            return Err(DevnetError::invalid_owner(format!(
                "new owner of device {} must not be empty",
                self.attributes_hash
            )));
        }
        self.owner_address = address;
        Ok(())
    }

    /// Move the lifecycle forward
    pub fn set_lifecycle_state(&mut self, target: LifecycleState) -> DevnetResult<()> {
        self.lifecycle_state
            .ensure_transition(target, &format!("device {}", self.attributes_hash))?;
        self.lifecycle_state = target;
        Ok(())
    }

    /// Read one status flag
    pub fn get_flag(&self, flag: StatusFlag) -> bool {
        self.status_flags.get(flag)
    }

    /// Write one status flag
    pub fn set_flag(&mut self, flag: StatusFlag, value: bool) {
        self.status_flags.set(flag, value);
    }

    /// Return the device to its issuer and close the lifecycle
    pub fn redeem(&mut self) -> DevnetResult<()> {
        self.set_lifecycle_state(LifecycleState::Redeemed)?;
        self.owner_address = self.issuer_address.clone();
        Ok(())
    }

    /// Stamp a mutation with its transaction marker
    pub fn advance_marker(&mut self, marker: Marker) -> DevnetResult<()> {
        self.ensure_marker_advances(marker)?;
        self.last_marker = marker;
        Ok(())
    }

    /// Check that a transaction marker would advance this record
    pub fn ensure_marker_advances(&self, marker: Marker) -> DevnetResult<()> {
        if marker <= self.last_marker {
            return Err(DevnetError::stale_marker(format!(
                "device {}: marker {marker} does not advance past {}",
                self.attributes_hash, self.last_marker
            )));
        }
        Ok(())
    }
}

/// On-ledger representation; flags are codec-encoded
#[derive(Debug, Serialize, Deserialize)]
struct StoredDeviceRecord {
    version: u16,
    namespace: String,
    device_address: String,
    issuer_address: String,
    owner_address: String,
    attributes_hash: String,
    first_marker: u64,
    last_marker: u64,
    lifecycle_state: LifecycleState,
    status_flags: u8,
}

impl From<&DeviceRecord> for StoredDeviceRecord {
    fn from(record: &DeviceRecord) -> Self {
        Self {
            version: RECORD_SCHEMA_VERSION,
            namespace: DEVICE_NAMESPACE.to_string(),
            device_address: record.device_address.as_str().to_string(),
            issuer_address: record.issuer_address.as_str().to_string(),
            owner_address: record.owner_address.as_str().to_string(),
            attributes_hash: record.attributes_hash.as_str().to_string(),
            first_marker: record.first_marker.value(),
            last_marker: record.last_marker.value(),
            lifecycle_state: record.lifecycle_state,
            status_flags: StatusCodec::encode(&record.status_flags),
        }
    }
}

impl TryFrom<StoredDeviceRecord> for DeviceRecord {
    type Error = DevnetError;

    fn try_from(stored: StoredDeviceRecord) -> DevnetResult<Self> {
        if stored.version != RECORD_SCHEMA_VERSION {
            return Err(DevnetError::serialization(format!(
                "unsupported device record version {}",
                stored.version
            )));
        }
        if stored.namespace != DEVICE_NAMESPACE {
            return Err(DevnetError::serialization(format!(
                "record namespace '{}' is not a device record",
                stored.namespace
            )));
        }
        let attributes_hash = AttributesHash::parse(stored.attributes_hash)
            .map_err(|e| DevnetError::serialization(e.message().to_string()))?;
        if stored.first_marker > stored.last_marker {
            return Err(DevnetError::serialization(format!(
                "device {attributes_hash}: firstMarker {} is after lastMarker {}",
                stored.first_marker, stored.last_marker
            )));
        }
        let issuer_address = Address::new(stored.issuer_address);
        let owner_address = Address::new(stored.owner_address);
        if issuer_address.is_empty() || owner_address.is_empty() {
            return Err(DevnetError::serialization(format!(
                "device {attributes_hash}: issuer and owner must not be empty"
            )));
        }
        if stored.lifecycle_state.is_terminal() && owner_address != issuer_address {
            return Err(DevnetError::serialization(format!(
                "device {attributes_hash}: redeemed record is not owned by its issuer"
            )));
        }
        Ok(Self {
            device_address: DeviceAddress::from_assigned(stored.device_address)?,
            issuer_address,
            owner_address,
            attributes_hash,
            first_marker: Marker::new(stored.first_marker),
            last_marker: Marker::new(stored.last_marker),
            lifecycle_state: stored.lifecycle_state,
            status_flags: StatusCodec::decode(stored.status_flags, &FlagSchema::DEVICE)?,
        })
    }
}

impl LedgerStorable for DeviceRecord {
    fn namespace() -> &'static str {
        DEVICE_NAMESPACE
    }

    fn key(&self) -> DevnetResult<LedgerKey> {
        Self::key_for(&self.attributes_hash)
    }

    fn to_bytes(&self) -> DevnetResult<Vec<u8>> {
        Ok(to_vec(&StoredDeviceRecord::from(self))?)
    }

    fn from_bytes(bytes: &[u8]) -> DevnetResult<Self> {
        let stored: StoredDeviceRecord = from_slice(bytes)?;
        Self::try_from(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devnet_core::ErrorKind;

    fn issued() -> DeviceRecord {
        DeviceRecord::issue(
            AttributesHash::parse("h1").unwrap(),
            Address::new("issuer"),
            Some(Address::new("A")),
            StatusFlags::new(true, false),
            Marker::new(1),
        )
        .unwrap()
    }

    #[test]
    fn issue_sets_initial_state() {
        let record = issued();
        assert_eq!(record.lifecycle_state(), LifecycleState::Issued);
        assert!(record.is_owner(&Address::new("A")));
        assert_eq!(record.first_marker(), record.last_marker());
        assert!(record.get_flag(StatusFlag::Active));
        assert!(!record.get_flag(StatusFlag::Stolen));
    }

    #[test]
    fn owner_defaults_to_issuer() {
        let record = DeviceRecord::issue(
            AttributesHash::parse("h2").unwrap(),
            Address::new("issuer"),
            None,
            StatusFlags::default(),
            Marker::new(1),
        )
        .unwrap();
        assert_eq!(record.owner_address(), record.issuer_address());
    }

    #[test]
    fn empty_owner_rejected() {
        let mut record = issued();
        let err = record.set_owner(Address::new("")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOwner);
        assert!(record.is_owner(&Address::new("A")));
    }

    #[test]
    fn lifecycle_cannot_regress() {
        let mut record = issued();
        record.set_lifecycle_state(LifecycleState::Trading).unwrap();
        let err = record
            .set_lifecycle_state(LifecycleState::Issued)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalTransition);
        assert_eq!(record.lifecycle_state(), LifecycleState::Trading);
    }

    #[test]
    fn redeem_returns_device_to_issuer() {
        let mut record = issued();
        record.redeem().unwrap();
        assert!(record.is_redeemed());
        assert_eq!(record.owner_address(), record.issuer_address());
        assert_eq!(
            record.redeem().unwrap_err().kind(),
            ErrorKind::IllegalTransition
        );
    }

    #[test]
    fn marker_must_strictly_advance() {
        let mut record = issued();
        assert_eq!(
            record.advance_marker(Marker::new(1)).unwrap_err().kind(),
            ErrorKind::StaleMarker
        );
        record.advance_marker(Marker::new(5)).unwrap();
        assert_eq!(record.last_marker(), Marker::new(5));
        assert_eq!(record.first_marker(), Marker::new(1));
    }

    #[test]
    fn marker_check_leaves_record_untouched() {
        let record = issued();
        assert_eq!(
            record
                .ensure_marker_advances(Marker::new(1))
                .unwrap_err()
                .kind(),
            ErrorKind::StaleMarker
        );
        record.ensure_marker_advances(Marker::new(2)).unwrap();
        assert_eq!(record.last_marker(), Marker::new(1));
    }

    #[test]
    fn serialization_is_byte_exact() {
        let record = issued();
        let bytes = record.to_bytes().unwrap();
        assert_eq!(bytes, record.to_bytes().unwrap());

        let decoded = DeviceRecord::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn decode_rejects_inconsistent_records() {
        let mut stored = StoredDeviceRecord::from(&issued());
        stored.status_flags = 0b1000;
        let bytes = to_vec(&stored).unwrap();
        assert_eq!(
            DeviceRecord::from_bytes(&bytes).unwrap_err().kind(),
            ErrorKind::InvalidFlagSet
        );

        let mut stored = StoredDeviceRecord::from(&issued());
        stored.lifecycle_state = LifecycleState::Redeemed;
        let bytes = to_vec(&stored).unwrap();
        assert_eq!(
            DeviceRecord::from_bytes(&bytes).unwrap_err().kind(),
            ErrorKind::Serialization
        );

        let mut stored = StoredDeviceRecord::from(&issued());
        stored.namespace = "org.devicenet.other".to_string();
        let bytes = to_vec(&stored).unwrap();
        assert!(DeviceRecord::from_bytes(&bytes).is_err());
    }

    #[test]
    fn key_uses_attributes_hash() {
        let record = issued();
        assert_eq!(record.key().unwrap().as_str(), "org.devicenet.device:h1");
    }
}
