//! Device registry commands

use crate::config::CliConfig;
use anyhow::{anyhow, Result};
use clap::Subcommand;
use devnet_core::{Address, AttributesHash, LedgerKey, MarkerSource, TransactionContext};
use devnet_device::{DeviceRecord, DeviceRegistry, StatusFlags};
use devnet_effects::{FileLedgerStore, SequenceClock};
use serde_json::Value;
use tracing::debug;

/// Operations on device records
#[derive(Debug, Clone, Subcommand)]
pub enum DeviceCommand {
    /// Issue a new device
    Issue {
        /// Attributes hash identifying the device
        #[arg(long)]
        hash: String,
        /// Initial owner, defaults to the caller
        #[arg(long)]
        owner: Option<String>,
        /// Mark the device active
        #[arg(long)]
        active: bool,
        /// Mark the device stolen
        #[arg(long)]
        stolen: bool,
        /// Identity flag JSON, e.g. '{"isActive":true}'; overrides --active/--stolen
        #[arg(long)]
        flags: Option<String>,
    },

    /// Transfer ownership of a device
    Transfer {
        /// Attributes hash identifying the device
        #[arg(long)]
        hash: String,
        /// Owner the caller believes currently holds the device
        #[arg(long)]
        expected_owner: String,
        /// Owner receiving the device
        #[arg(long)]
        new_owner: String,
    },

    /// Redeem a device back to its issuer
    Redeem {
        /// Attributes hash identifying the device
        #[arg(long)]
        hash: String,
        /// Owner redeeming the device
        #[arg(long)]
        owner: String,
    },

    /// Set a status flag
    Flag {
        /// Attributes hash identifying the device
        #[arg(long)]
        hash: String,
        /// Flag name (active, stolen)
        #[arg(long)]
        name: String,
        /// `true` or `false`
        #[arg(long)]
        value: String,
    },

    /// Print the current record
    Show {
        /// Attributes hash identifying the device
        #[arg(long)]
        hash: String,
    },

    /// Print every committed version of a record
    History {
        /// Attributes hash identifying the device
        #[arg(long)]
        hash: String,
    },
}

impl DeviceCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::Issue { .. } => "issue",
            Self::Transfer { .. } => "transfer",
            Self::Redeem { .. } => "redeem",
            Self::Flag { .. } => "flag",
            Self::Show { .. } => "show",
            Self::History { .. } => "history",
        }
    }
}

/// Run one command against the configured ledger and return its JSON output
pub async fn handle_device_command(
    command: DeviceCommand,
    config: &CliConfig,
    caller: Option<&str>,
) -> Result<Value> {
    let store = FileLedgerStore::open(&config.ledger_path).await?;
    let clock = SequenceClock::starting_after(store.height().await);
    let registry = DeviceRegistry::with_config(store, config.registry.clone());
    debug!(command = command.name(), "Running device command");

    let output = match &command {
        DeviceCommand::Issue {
            hash,
            owner,
            active,
            stolen,
            flags,
        } => {
            let ctx = begin(&clock, caller, command.name()).await?;
            let initial = match flags {
                Some(raw) => StatusFlags::from_json(raw)?,
                None => StatusFlags::new(*active, *stolen),
            };
            let record = registry
                .issue(&ctx, hash, initial, owner.as_deref())
                .await?;
            serde_json::to_value(record)?
        }
        DeviceCommand::Transfer {
            hash,
            expected_owner,
            new_owner,
        } => {
            let ctx = begin(&clock, caller, command.name()).await?;
            let record = registry
                .transfer_ownership(&ctx, &device_key(hash)?, expected_owner, new_owner)
                .await?;
            serde_json::to_value(record)?
        }
        DeviceCommand::Redeem { hash, owner } => {
            let ctx = begin(&clock, caller, command.name()).await?;
            let record = registry.redeem(&ctx, &device_key(hash)?, owner).await?;
            serde_json::to_value(record)?
        }
        DeviceCommand::Flag { hash, name, value } => {
            let ctx = begin(&clock, caller, command.name()).await?;
            let record = registry
                .set_flag(&ctx, &device_key(hash)?, name, value)
                .await?;
            serde_json::to_value(record)?
        }
        DeviceCommand::Show { hash } => {
            serde_json::to_value(registry.get_device(&device_key(hash)?).await?)?
        }
        DeviceCommand::History { hash } => {
            serde_json::to_value(registry.device_history(&device_key(hash)?).await?)?
        }
    };
    Ok(output)
}

async fn begin(
    clock: &SequenceClock,
    caller: Option<&str>,
    command: &str,
) -> Result<TransactionContext> {
    let caller = caller
        .map(Address::from)
        .ok_or_else(|| anyhow!("--caller is required for {command}"))?;
    Ok(clock.begin(caller).await)
}

fn device_key(hash: &str) -> Result<LedgerKey> {
    Ok(DeviceRecord::key_for(&AttributesHash::parse(hash)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use devnet_core::{DevnetError, ErrorKind};

    fn config_in(dir: &tempfile::TempDir) -> CliConfig {
        CliConfig {
            ledger_path: dir.path().join("ledger.jsonl"),
            ..CliConfig::default()
        }
    }

    fn kind_of(err: &anyhow::Error) -> Option<ErrorKind> {
        err.downcast_ref::<DevnetError>().map(DevnetError::kind)
    }

    #[tokio::test]
    async fn commands_share_one_ledger_across_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let issued = handle_device_command(
            DeviceCommand::Issue {
                hash: "h1".into(),
                owner: Some("A".into()),
                active: true,
                stolen: false,
                flags: None,
            },
            &config,
            Some("issuer"),
        )
        .await
        .unwrap();
        assert_eq!(issued["ownerAddress"], "A");
        assert_eq!(issued["lifecycleState"], "issued");
        assert_eq!(issued["statusFlags"]["active"], true);
        assert_eq!(issued["lastMarker"], 1);

        let transferred = handle_device_command(
            DeviceCommand::Transfer {
                hash: "h1".into(),
                expected_owner: "A".into(),
                new_owner: "B".into(),
            },
            &config,
            Some("A"),
        )
        .await
        .unwrap();
        assert_eq!(transferred["ownerAddress"], "B");
        assert_eq!(transferred["lifecycleState"], "trading");
        assert_eq!(transferred["lastMarker"], 2);

        let history = handle_device_command(
            DeviceCommand::History { hash: "h1".into() },
            &config,
            None,
        )
        .await
        .unwrap();
        assert_eq!(history.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn identity_flag_json_sets_initial_flags() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let issued = handle_device_command(
            DeviceCommand::Issue {
                hash: "h2".into(),
                owner: None,
                active: false,
                stolen: false,
                flags: Some(r#"{"isActive":true,"isStolen":true}"#.into()),
            },
            &config,
            Some("issuer"),
        )
        .await
        .unwrap();
        assert_eq!(issued["ownerAddress"], "issuer");
        assert_eq!(issued["statusFlags"]["stolen"], true);
    }

    #[tokio::test]
    async fn mutations_require_caller() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let err = handle_device_command(
            DeviceCommand::Redeem {
                hash: "h1".into(),
                owner: "A".into(),
            },
            &config,
            None,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("--caller"));
    }

    #[tokio::test]
    async fn registry_errors_surface_with_kind() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let err = handle_device_command(
            DeviceCommand::Show { hash: "missing".into() },
            &config,
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(kind_of(&err), Some(ErrorKind::NotFound));

        let err = handle_device_command(
            DeviceCommand::Show { hash: "a:b".into() },
            &config,
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(kind_of(&err), Some(ErrorKind::InvalidArgument));
    }
}
