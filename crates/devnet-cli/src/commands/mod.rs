//! CLI command handlers

pub mod device;
