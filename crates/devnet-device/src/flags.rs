//! Device status flags and their compact codec
//!
//! Status flags are independent booleans orthogonal to the lifecycle. For
//! storage they are packed into a single byte, one bit per flag, with bit
//! positions fixed by `FlagSchema::DEVICE`. New flags may only be appended to
//! the schema so existing bit assignments never move.

use devnet_core::{DevnetError, DevnetResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named device status flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFlag {
    /// Device is in service
    #[serde(alias = "isActive")]
    Active,
    /// Device has been reported stolen
    #[serde(alias = "isStolen")]
    Stolen,
}

impl StatusFlag {
    /// Canonical lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Stolen => "stolen",
        }
    }
}

impl fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StatusFlag {
    type Err = DevnetError;

    /// Accepts canonical names and the `isActive`/`isStolen` identity-flag spelling
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "isactive" => Ok(Self::Active),
            "stolen" | "isstolen" => Ok(Self::Stolen),
            _ => Err(DevnetError::invalid_flag_set(format!(
                "unknown status flag '{s}'"
            ))),
        }
    }
}

/// Fixed, ordered flag list; a flag's index is its bit position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSchema {
    flags: &'static [StatusFlag],
}

impl FlagSchema {
    /// Schema of every device record
    pub const DEVICE: FlagSchema = FlagSchema {
        flags: &[StatusFlag::Active, StatusFlag::Stolen],
    };

    /// Flags in bit order
    pub fn flags(&self) -> &'static [StatusFlag] {
        self.flags
    }

    /// Bit position of a flag, if declared
    pub fn position(&self, flag: StatusFlag) -> Option<u32> {
        self.flags
            .iter()
            .position(|declared| *declared == flag)
            .map(|index| index as u32)
    }

    /// Bits owned by declared flags
    pub fn mask(&self) -> u8 {
        self.flags
            .iter()
            .enumerate()
            .fold(0u8, |mask, (index, _)| mask | (1 << index))
    }
}

/// Decoded status flags of one device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusFlags {
    /// Device is in service
    pub active: bool,
    /// Device has been reported stolen
    pub stolen: bool,
}

impl StatusFlags {
    /// Build flags from explicit values
    pub fn new(active: bool, stolen: bool) -> Self {
        Self { active, stolen }
    }

    /// Read one flag
    pub fn get(&self, flag: StatusFlag) -> bool {
        match flag {
            StatusFlag::Active => self.active,
            StatusFlag::Stolen => self.stolen,
        }
    }

    /// Write one flag
    pub fn set(&mut self, flag: StatusFlag, value: bool) {
        match flag {
            StatusFlag::Active => self.active = value,
            StatusFlag::Stolen => self.stolen = value,
        }
    }

    /// Parse an identity-flag JSON object
    ///
    /// Accepts `{"isActive":true,"isStolen":false}` and `{"active":..,"stolen":..}`.
    /// Flags left out decode as `false`.
    pub fn from_json(raw: &str) -> DevnetResult<Self> {
        let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
            DevnetError::invalid_argument(format!("identity flag is not valid JSON: {e}"))
        })?;
        let object = value.as_object().ok_or_else(|| {
            DevnetError::invalid_argument("identity flag must be a JSON object")
        })?;

        let mut named = Vec::with_capacity(object.len());
        for (name, value) in object {
            let value = value.as_bool().ok_or_else(|| {
                DevnetError::invalid_argument(format!(
                    "identity flag '{name}' must be a boolean, got {value}"
                ))
            })?;
            named.push((name.as_str(), value));
        }
        let scalar = StatusCodec::encode_named(named)?;
        StatusCodec::decode(scalar, &FlagSchema::DEVICE)
    }
}

impl fmt::Display for StatusFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "active={} stolen={}", self.active, self.stolen)
    }
}

/// Packs status flags into a single byte and back
pub struct StatusCodec;

impl StatusCodec {
    /// Encode typed flags; every field is declared so this cannot fail
    pub fn encode(flags: &StatusFlags) -> u8 {
        let schema = FlagSchema::DEVICE;
        schema
            .flags()
            .iter()
            .enumerate()
            .filter(|(_, flag)| flags.get(**flag))
            .fold(0u8, |scalar, (index, _)| scalar | (1 << index))
    }

    /// Encode flags given by name; names outside the schema are rejected
    pub fn encode_named<'a, I>(named: I) -> DevnetResult<u8>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let schema = FlagSchema::DEVICE;
        let mut seen = 0u8;
        let mut scalar = 0u8;
        for (name, value) in named {
            let flag: StatusFlag = name.parse()?;
            let position = schema.position(flag).ok_or_else(|| {
                DevnetError::invalid_flag_set(format!("flag '{name}' is not in the schema"))
            })?;
            let bit = 1u8 << position;
            if seen & bit != 0 {
                return Err(DevnetError::invalid_flag_set(format!(
                    "flag '{}' given more than once",
                    flag.name()
                )));
            }
            seen |= bit;
            if value {
                scalar |= bit;
            }
        }
        Ok(scalar)
    }

    /// Decode a stored byte against a schema; undeclared bits are rejected
    pub fn decode(scalar: u8, schema: &FlagSchema) -> DevnetResult<StatusFlags> {
        let stray = scalar & !schema.mask();
        if stray != 0 {
            return Err(DevnetError::invalid_flag_set(format!(
                "status byte {scalar:#010b} sets undeclared bits {stray:#010b}"
            )));
        }
        let mut flags = StatusFlags::default();
        for (index, flag) in schema.flags().iter().enumerate() {
            flags.set(*flag, scalar & (1 << index) != 0);
        }
        Ok(flags)
    }
}

/// Parse a flag value; only `true` and `false` are recognized
pub fn parse_flag_value(raw: &str) -> DevnetResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(DevnetError::invalid_argument(format!(
            "flag value '{raw}' is not a boolean"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devnet_core::ErrorKind;

    #[test]
    fn round_trip_is_exhaustive() {
        let width = FlagSchema::DEVICE.flags().len();
        for scalar in 0u8..(1 << width) {
            let flags = StatusCodec::decode(scalar, &FlagSchema::DEVICE).unwrap();
            assert_eq!(StatusCodec::encode(&flags), scalar);
            assert_eq!(
                StatusCodec::decode(StatusCodec::encode(&flags), &FlagSchema::DEVICE).unwrap(),
                flags
            );
        }
    }

    #[test]
    fn bit_positions_are_stable() {
        assert_eq!(StatusCodec::encode(&StatusFlags::new(true, false)), 0b01);
        assert_eq!(StatusCodec::encode(&StatusFlags::new(false, true)), 0b10);
        assert_eq!(FlagSchema::DEVICE.mask(), 0b11);
    }

    #[test]
    fn undeclared_bits_are_rejected() {
        let err = StatusCodec::decode(0b100, &FlagSchema::DEVICE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFlagSet);
    }

    #[test]
    fn named_encoding_rejects_unknown_and_duplicate_names() {
        let err = StatusCodec::encode_named([("active", true), ("lost", true)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFlagSet);

        let err = StatusCodec::encode_named([("active", true), ("isActive", false)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFlagSet);

        assert_eq!(StatusCodec::encode_named([("stolen", true)]).unwrap(), 0b10);
    }

    #[test]
    fn identity_flag_json_is_accepted() {
        let flags = StatusFlags::from_json(r#"{"isActive":true,"isStolen":false}"#).unwrap();
        assert_eq!(flags, StatusFlags::new(true, false));

        let flags = StatusFlags::from_json(r#"{"stolen":true}"#).unwrap();
        assert_eq!(flags, StatusFlags::new(false, true));

        let err = StatusFlags::from_json(r#"{"isActive":"yes"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = StatusFlags::from_json(r#"{"isBroken":true}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFlagSet);
    }

    #[test]
    fn flag_values_are_strict() {
        assert!(parse_flag_value("true").unwrap());
        assert!(parse_flag_value(" FALSE ").map(|v| !v).unwrap());
        for raw in ["1", "yes", "", "truthy", "null"] {
            assert_eq!(
                parse_flag_value(raw).unwrap_err().kind(),
                ErrorKind::InvalidArgument
            );
        }
    }
}
