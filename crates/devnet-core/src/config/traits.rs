//! Core configuration traits for devnet
//!
//! Configuration is layered: defaults, then a TOML or JSON file, then
//! `DEVNET_*` environment variables, then validation.

use crate::errors::{DevnetError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Prefix shared by every devnet environment variable
pub const ENV_PREFIX: &str = "DEVNET_";

/// File formats accepted by `load_from_file`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(DevnetError::config(format!(
                "Unsupported config file format: {}",
                path.display()
            ))),
        }
    }
}

/// Core trait for devnet configuration types
pub trait DevnetConfig: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Parse configuration text in the given format
    fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| DevnetError::config(format!("Invalid TOML: {e}"))),
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| DevnetError::config(format!("Invalid JSON: {e}"))),
        }
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            DevnetError::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::parse(&content, format)
    }

    /// Apply overrides from `DEVNET_*` variables, keys given without the prefix
    fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>;

    /// Apply overrides from the process environment
    fn merge_with_env(&mut self) -> Result<()> {
        let vars = std::env::vars().filter_map(|(key, value)| {
            key.strip_prefix(ENV_PREFIX)
                .map(|stripped| (stripped.to_string(), value))
        });
        self.merge_with_vars(vars)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()>;

    /// Defaults, then the file if present, then the environment, validated
    fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::load_from_file(path)?,
            _ => Self::default(),
        };
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }
}

/// Parse a boolean override value
pub fn parse_bool_var(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(DevnetError::config(format!(
            "Invalid boolean in {ENV_PREFIX}{key}: '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct SampleConfig {
        name: String,
        strict: bool,
    }

    impl DevnetConfig for SampleConfig {
        fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
        where
            I: IntoIterator<Item = (String, String)>,
        {
            for (key, value) in vars {
                match key.as_str() {
                    "NAME" => self.name = value,
                    "STRICT" => self.strict = parse_bool_var(&key, &value)?,
                    _ => {}
                }
            }
            Ok(())
        }

        fn validate(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn loads_toml_and_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("sample.toml");
        let mut file = std::fs::File::create(&toml_path).unwrap();
        writeln!(file, "name = \"ledger\"\nstrict = true").unwrap();
        let from_toml = SampleConfig::load_from_file(&toml_path).unwrap();
        assert_eq!(from_toml.name, "ledger");
        assert!(from_toml.strict);

        let json_path = dir.path().join("sample.json");
        std::fs::write(&json_path, r#"{"name":"json"}"#).unwrap();
        let from_json = SampleConfig::load_from_file(&json_path).unwrap();
        assert_eq!(from_json.name, "json");
        assert!(!from_json.strict);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.yaml");
        std::fs::write(&path, "name: x").unwrap();
        assert!(SampleConfig::load_from_file(&path).is_err());
    }

    #[test]
    fn vars_override_values() {
        let mut config = SampleConfig::default();
        config
            .merge_with_vars(vec![
                ("NAME".to_string(), "env".to_string()),
                ("STRICT".to_string(), "yes".to_string()),
            ])
            .unwrap();
        assert_eq!(config.name, "env");
        assert!(config.strict);

        let err = config
            .merge_with_vars(vec![("STRICT".to_string(), "maybe".to_string())])
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Config);
    }
}
