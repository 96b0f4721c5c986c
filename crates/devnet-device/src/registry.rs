//! Device registry transaction handlers
//!
//! Each operation is one ledger transaction: fetch the current record, check
//! preconditions and authorization, mutate an in-memory copy, then write it
//! back with a single `put`. Every check runs before the write, so a failed
//! operation leaves the ledger untouched.

use crate::config::{RegistryConfig, ReissuePolicy};
use crate::flags::{parse_flag_value, StatusFlag, StatusFlags};
use crate::lifecycle::LifecycleState;
use crate::record::{DeviceRecord, DEVICE_NAMESPACE};
use devnet_core::{
    Address, AttributesHash, DevnetError, DevnetResult, LedgerKey, LedgerStorable, LedgerStore,
    TransactionContext,
};
use tracing::{debug, info, warn};

/// Transaction handlers over a ledger store
pub struct DeviceRegistry<S> {
    store: S,
    config: RegistryConfig,
}

impl<S: LedgerStore> DeviceRegistry<S> {
    /// Registry with default policy
    pub fn new(store: S) -> Self {
        Self::with_config(store, RegistryConfig::default())
    }

    /// Registry with explicit policy
    pub fn with_config(store: S, config: RegistryConfig) -> Self {
        Self { store, config }
    }

    /// Active policy
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Underlying ledger store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Issue a new device under its attributes hash
    ///
    /// The caller becomes the issuer. The owner defaults to the issuer when
    /// `owner` is `None`. A redeemed key may be re-issued only by its issuer,
    /// and only under `ReissuePolicy::AfterRedemption`; the new issuance gets
    /// a fresh device address.
    pub async fn issue(
        &self,
        ctx: &TransactionContext,
        attributes_hash: &str,
        initial_flags: StatusFlags,
        owner: Option<&str>,
    ) -> DevnetResult<DeviceRecord> {
        let attributes_hash = AttributesHash::parse(attributes_hash)?;
        let key = DeviceRecord::key_for(&attributes_hash)?;

        if let Some(existing) = self.load(&key).await? {
            let reissuable =
                self.config.reissue == ReissuePolicy::AfterRedemption && existing.is_redeemed();
            if !reissuable {
                return Err(DevnetError::already_exists(format!(
                    "device {key} is already issued as {}",
                    existing.device_address()
                )));
            }
            if existing.issuer_address() != &ctx.caller {
                warn!(key = %key, caller = %ctx.caller, "Re-issue by non-issuer rejected");
                return Err(DevnetError::unauthorized(format!(
                    "device {key}: only issuer '{}' may re-issue a redeemed device",
                    existing.issuer_address()
                )));
            }
            existing.ensure_marker_advances(ctx.marker)?;
        }

        let record = DeviceRecord::issue(
            attributes_hash,
            ctx.caller.clone(),
            owner.map(Address::from),
            initial_flags,
            ctx.marker,
        )?;
        self.persist(&key, &record).await?;

        info!(
            key = %key,
            device = %record.device_address(),
            owner = %record.owner_address(),
            marker = %ctx.marker,
            "Device issued"
        );
        Ok(record)
    }

    /// Hand a device to a new owner
    ///
    /// The first successful transfer moves an issued device into trading.
    pub async fn transfer_ownership(
        &self,
        ctx: &TransactionContext,
        key: &LedgerKey,
        expected_current_owner: &str,
        new_owner: &str,
    ) -> DevnetResult<DeviceRecord> {
        let mut record = self.fetch(key).await?;

        if record.is_redeemed() {
            return Err(DevnetError::illegal_transition(format!(
                "device {key} is redeemed and cannot be transferred"
            )));
        }

        let authorization = self.config.transfer_authorization;
        let expected = Address::from(expected_current_owner);
        if authorization.checks_asserted_owner() && !record.is_owner(&expected) {
            return Err(DevnetError::ownership_mismatch(format!(
                "device {key}: expected owner '{expected}', actual owner '{}'",
                record.owner_address()
            )));
        }
        self.authorize_owner(ctx, key, &record, "transfer")?;

        let new_owner = Address::from(new_owner);
        if new_owner.is_empty() {
            return Err(DevnetError::invalid_owner(format!(
                "device {key}: newOwner must not be empty"
            )));
        }
        if record.is_owner(&new_owner) && !self.config.allow_self_transfer {
            return Err(DevnetError::invalid_owner(format!(
                "device {key}: '{new_owner}' already owns the device"
            )));
        }

        let previous_owner = record.owner_address().clone();
        if record.lifecycle_state() == LifecycleState::Issued {
            record.set_lifecycle_state(LifecycleState::Trading)?;
        }
        record.set_owner(new_owner)?;
        record.advance_marker(ctx.marker)?;
        self.persist(key, &record).await?;

        info!(
            key = %key,
            from = %previous_owner,
            to = %record.owner_address(),
            state = %record.lifecycle_state(),
            marker = %ctx.marker,
            "Device ownership transferred"
        );
        Ok(record)
    }

    /// Return a device to its issuer and close its lifecycle
    ///
    /// `redeeming_owner` must always name the current owner. The configured
    /// policy only decides whether the caller must be the owner as well.
    pub async fn redeem(
        &self,
        ctx: &TransactionContext,
        key: &LedgerKey,
        redeeming_owner: &str,
    ) -> DevnetResult<DeviceRecord> {
        let mut record = self.fetch(key).await?;

        if record.is_redeemed() {
            return Err(DevnetError::already_redeemed(format!(
                "device {key} was redeemed at {}",
                record.last_marker()
            )));
        }

        let redeeming_owner = Address::from(redeeming_owner);
        if !record.is_owner(&redeeming_owner) {
            warn!(key = %key, claimed = %redeeming_owner, "Redeem by non-owner rejected");
            return Err(DevnetError::unauthorized(format!(
                "device {key}: '{redeeming_owner}' is not the current owner"
            )));
        }
        self.authorize_owner(ctx, key, &record, "redeem")?;

        record.redeem()?;
        record.advance_marker(ctx.marker)?;
        self.persist(key, &record).await?;

        info!(
            key = %key,
            issuer = %record.issuer_address(),
            marker = %ctx.marker,
            "Device redeemed"
        );
        Ok(record)
    }

    /// Set a status flag from string arguments
    ///
    /// `flag_name` must name a declared flag and `value` must be `true` or
    /// `false`.
    pub async fn set_flag(
        &self,
        ctx: &TransactionContext,
        key: &LedgerKey,
        flag_name: &str,
        value: &str,
    ) -> DevnetResult<DeviceRecord> {
        let flag: StatusFlag = flag_name.parse()?;
        let value = parse_flag_value(value)?;
        self.set_status(ctx, key, flag, value).await
    }

    /// Set a status flag
    ///
    /// Sensitive flags may only be changed by the current owner.
    pub async fn set_status(
        &self,
        ctx: &TransactionContext,
        key: &LedgerKey,
        flag: StatusFlag,
        value: bool,
    ) -> DevnetResult<DeviceRecord> {
        let mut record = self.fetch(key).await?;

        if self.config.is_sensitive(flag) && !record.is_owner(&ctx.caller) {
            warn!(
                key = %key,
                flag = %flag,
                caller = %ctx.caller,
                "Sensitive flag change by non-owner rejected"
            );
            return Err(DevnetError::unauthorized(format!(
                "device {key}: '{}' may not change flag '{flag}'",
                ctx.caller
            )));
        }

        record.set_flag(flag, value);
        record.advance_marker(ctx.marker)?;
        self.persist(key, &record).await?;

        info!(key = %key, flag = %flag, value, marker = %ctx.marker, "Device flag updated");
        Ok(record)
    }

    /// Current record for a key
    pub async fn get_device(&self, key: &LedgerKey) -> DevnetResult<DeviceRecord> {
        self.fetch(key).await
    }

    /// Every committed version of a record, oldest first
    pub async fn device_history(&self, key: &LedgerKey) -> DevnetResult<Vec<DeviceRecord>> {
        ensure_device_key(key)?;
        let versions = self.store.history(key).await?;
        if versions.is_empty() {
            return Err(DevnetError::not_found(format!("device {key} does not exist")));
        }
        versions
            .iter()
            .map(|bytes| DeviceRecord::from_bytes(bytes))
            .collect()
    }

    fn authorize_owner(
        &self,
        ctx: &TransactionContext,
        key: &LedgerKey,
        record: &DeviceRecord,
        operation: &str,
    ) -> DevnetResult<()> {
        if self.config.transfer_authorization.checks_caller() && !record.is_owner(&ctx.caller) {
            warn!(
                key = %key,
                caller = %ctx.caller,
                operation,
                "Caller is not the device owner"
            );
            return Err(DevnetError::unauthorized(format!(
                "device {key}: caller '{}' is not the current owner",
                ctx.caller
            )));
        }
        Ok(())
    }

    async fn load(&self, key: &LedgerKey) -> DevnetResult<Option<DeviceRecord>> {
        ensure_device_key(key)?;
        debug!(key = %key, "Loading device record");
        match self.store.get(key).await? {
            Some(bytes) => Ok(Some(DeviceRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn fetch(&self, key: &LedgerKey) -> DevnetResult<DeviceRecord> {
        self.load(key)
            .await?
            .ok_or_else(|| DevnetError::not_found(format!("device {key} does not exist")))
    }

    async fn persist(&self, key: &LedgerKey, record: &DeviceRecord) -> DevnetResult<()> {
        let bytes = record.to_bytes()?;
        debug!(key = %key, bytes = bytes.len(), "Persisting device record");
        self.store.put(key, bytes).await?;
        Ok(())
    }
}

fn ensure_device_key(key: &LedgerKey) -> DevnetResult<()> {
    if key.namespace() != DEVICE_NAMESPACE {
        return Err(DevnetError::invalid_argument(format!(
            "key {key} is not in the {DEVICE_NAMESPACE} namespace"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use devnet_core::Marker;
    use devnet_effects::MemoryLedgerStore;

    fn ctx(caller: &str, marker: u64) -> TransactionContext {
        TransactionContext::new(caller, Marker::new(marker))
    }

    #[tokio::test]
    async fn rejects_keys_outside_device_namespace() {
        let registry = DeviceRegistry::new(MemoryLedgerStore::new());
        let key = LedgerKey::composite("org.devicenet.other", &["h1"]).unwrap();
        let err = registry.get_device(&key).await.unwrap_err();
        assert_matches!(err, DevnetError::InvalidArgument { .. });
    }

    #[tokio::test]
    async fn issue_twice_is_rejected() {
        let registry = DeviceRegistry::new(MemoryLedgerStore::new());
        registry
            .issue(&ctx("issuer", 1), "h1", StatusFlags::default(), None)
            .await
            .unwrap();
        let err = registry
            .issue(&ctx("issuer", 2), "h1", StatusFlags::default(), None)
            .await
            .unwrap_err();
        assert_matches!(err, DevnetError::AlreadyExists { .. });
    }

    #[tokio::test]
    async fn stale_marker_persists_nothing() {
        let store = MemoryLedgerStore::new();
        let registry = DeviceRegistry::new(store);
        let record = registry
            .issue(&ctx("A", 5), "h1", StatusFlags::default(), None)
            .await
            .unwrap();
        let key = record.key().unwrap();

        let err = registry
            .transfer_ownership(&ctx("A", 5), &key, "A", "B")
            .await
            .unwrap_err();
        assert_matches!(err, DevnetError::StaleMarker { .. });
        assert_eq!(registry.device_history(&key).await.unwrap().len(), 1);
        assert_eq!(registry.get_device(&key).await.unwrap(), record);
    }
}
