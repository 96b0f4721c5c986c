//! Registry policy configuration

use crate::flags::StatusFlag;
use devnet_core::config::{parse_bool_var, DevnetConfig};
use devnet_core::{DevnetError, DevnetResult};
use serde::{Deserialize, Serialize};

/// What happens when `issue` targets a key that already holds a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReissuePolicy {
    /// Always fail with `AlreadyExists`
    #[default]
    Reject,
    /// Let the issuer start a fresh issuance once the existing device is redeemed
    AfterRedemption,
}

impl std::str::FromStr for ReissuePolicy {
    type Err = DevnetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "after_redemption" => Ok(Self::AfterRedemption),
            _ => Err(DevnetError::config(format!("unknown reissue policy '{s}'"))),
        }
    }
}

/// Which caller checks gate transfer and redeem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferAuthorization {
    /// The owner named in a transfer request must match the record
    AssertedOwner,
    /// The authenticated caller must be the owner
    CallerIdentity,
    /// Both checks apply
    ///
    /// Redeem always checks the owner named in the request; this setting only
    /// decides whether it checks the caller too.
    #[default]
    Both,
}

impl TransferAuthorization {
    /// Check the owner named in a transfer request
    pub fn checks_asserted_owner(self) -> bool {
        matches!(self, Self::AssertedOwner | Self::Both)
    }

    /// Check the authenticated caller
    pub fn checks_caller(self) -> bool {
        matches!(self, Self::CallerIdentity | Self::Both)
    }
}

impl std::str::FromStr for TransferAuthorization {
    type Err = DevnetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asserted_owner" => Ok(Self::AssertedOwner),
            "caller_identity" => Ok(Self::CallerIdentity),
            "both" => Ok(Self::Both),
            _ => Err(DevnetError::config(format!(
                "unknown transfer authorization '{s}'"
            ))),
        }
    }
}

/// Policy knobs of the device registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Re-issuance policy
    pub reissue: ReissuePolicy,
    /// Owner checks for transfer and redeem
    pub transfer_authorization: TransferAuthorization,
    /// Allow transferring a device to its current owner
    pub allow_self_transfer: bool,
    /// Flags only the current owner may change
    pub sensitive_flags: Vec<StatusFlag>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            reissue: ReissuePolicy::Reject,
            transfer_authorization: TransferAuthorization::Both,
            allow_self_transfer: false,
            sensitive_flags: vec![StatusFlag::Stolen],
        }
    }
}

impl RegistryConfig {
    /// Whether changing `flag` requires the caller to be the owner
    pub fn is_sensitive(&self, flag: StatusFlag) -> bool {
        self.sensitive_flags.contains(&flag)
    }
}

impl DevnetConfig for RegistryConfig {
    fn merge_with_vars<I>(&mut self, vars: I) -> DevnetResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                "REISSUE" => self.reissue = value.parse()?,
                "TRANSFER_AUTHORIZATION" => self.transfer_authorization = value.parse()?,
                "ALLOW_SELF_TRANSFER" => self.allow_self_transfer = parse_bool_var(&key, &value)?,
                "SENSITIVE_FLAGS" => {
                    self.sensitive_flags = value
                        .split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::parse::<StatusFlag>)
                        .collect::<DevnetResult<Vec<StatusFlag>>>()
                        .map_err(|e| DevnetError::config(e.message().to_string()))?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn validate(&self) -> DevnetResult<()> {
        let mut seen = Vec::with_capacity(self.sensitive_flags.len());
        for flag in &self.sensitive_flags {
            if seen.contains(flag) {
                return Err(DevnetError::config(format!(
                    "sensitive flag '{flag}' listed more than once"
                )));
            }
            seen.push(*flag);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devnet_core::ConfigFormat;

    #[test]
    fn defaults_guard_stolen_flag() {
        let config = RegistryConfig::default();
        assert!(config.is_sensitive(StatusFlag::Stolen));
        assert!(!config.is_sensitive(StatusFlag::Active));
        assert_eq!(config.reissue, ReissuePolicy::Reject);
        assert!(config.transfer_authorization.checks_caller());
        assert!(config.transfer_authorization.checks_asserted_owner());
    }

    #[test]
    fn parses_toml_table() {
        let config = RegistryConfig::parse(
            r#"
            reissue = "after_redemption"
            transfer_authorization = "caller_identity"
            sensitive_flags = ["stolen", "active"]
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(config.reissue, ReissuePolicy::AfterRedemption);
        assert!(!config.transfer_authorization.checks_asserted_owner());
        assert!(config.is_sensitive(StatusFlag::Active));
        assert!(!config.allow_self_transfer);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = RegistryConfig::default();
        config
            .merge_with_vars(vec![
                ("ALLOW_SELF_TRANSFER".to_string(), "true".to_string()),
                ("SENSITIVE_FLAGS".to_string(), "active, stolen".to_string()),
                ("TRANSFER_AUTHORIZATION".to_string(), "asserted_owner".to_string()),
            ])
            .unwrap();
        assert!(config.allow_self_transfer);
        assert_eq!(
            config.sensitive_flags,
            vec![StatusFlag::Active, StatusFlag::Stolen]
        );
        assert_eq!(
            config.transfer_authorization,
            TransferAuthorization::AssertedOwner
        );

        assert!(config
            .merge_with_vars(vec![("SENSITIVE_FLAGS".to_string(), "lost".to_string())])
            .is_err());
    }

    #[test]
    fn reissue_policy_parses_like_transfer_authorization() {
        assert_eq!(
            " After_Redemption ".parse::<ReissuePolicy>().unwrap(),
            ReissuePolicy::AfterRedemption
        );
        assert_eq!("reject".parse::<ReissuePolicy>().unwrap(), ReissuePolicy::Reject);
        assert!("sometimes".parse::<ReissuePolicy>().is_err());

        let mut config = RegistryConfig::default();
        config
            .merge_with_vars(vec![("REISSUE".to_string(), "after_redemption".to_string())])
            .unwrap();
        assert_eq!(config.reissue, ReissuePolicy::AfterRedemption);
    }

    #[test]
    fn identity_flag_names_work_in_files_and_env() {
        let from_file = RegistryConfig::parse(
            r#"sensitive_flags = ["isStolen", "isActive"]"#,
            ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(
            from_file.sensitive_flags,
            vec![StatusFlag::Stolen, StatusFlag::Active]
        );

        let mut from_env = RegistryConfig::default();
        from_env
            .merge_with_vars(vec![(
                "SENSITIVE_FLAGS".to_string(),
                "isStolen,isActive".to_string(),
            )])
            .unwrap();
        assert_eq!(from_env.sensitive_flags, from_file.sensitive_flags);
    }

    #[test]
    fn duplicate_sensitive_flags_fail_validation() {
        let config = RegistryConfig {
            sensitive_flags: vec![StatusFlag::Stolen, StatusFlag::Stolen],
            ..RegistryConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
