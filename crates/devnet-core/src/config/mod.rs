//! Layered configuration

mod traits;

pub use traits::{parse_bool_var, ConfigFormat, DevnetConfig, ENV_PREFIX};
