//! CLI configuration
//!
//! Loaded from `--config` (TOML or JSON) when present, then overridden by
//! `DEVNET_*` environment variables.

use devnet_core::config::DevnetConfig;
use devnet_core::{DevnetError, DevnetResult};
use devnet_device::RegistryConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for one CLI invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// JSON-lines ledger file
    pub ledger_path: PathBuf,
    /// Default tracing filter when neither `--verbose` nor `RUST_LOG` is set
    pub log_level: String,
    /// Registry policy
    pub registry: RegistryConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from(".devnet/ledger.jsonl"),
            log_level: "info".to_string(),
            registry: RegistryConfig::default(),
        }
    }
}

impl DevnetConfig for CliConfig {
    fn merge_with_vars<I>(&mut self, vars: I) -> DevnetResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut rest = Vec::new();
        for (key, value) in vars {
            match key.as_str() {
                "LEDGER_PATH" => self.ledger_path = PathBuf::from(value),
                "LOG_LEVEL" => self.log_level = value,
                _ => rest.push((key, value)),
            }
        }
        self.registry.merge_with_vars(rest)
    }

    fn validate(&self) -> DevnetResult<()> {
        if self.ledger_path.as_os_str().is_empty() {
            return Err(DevnetError::config("ledger_path must not be empty"));
        }
        if self.log_level.trim().is_empty() {
            return Err(DevnetError::config("log_level must not be empty"));
        }
        self.registry.validate()
    }
}
