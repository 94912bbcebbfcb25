//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, LedgerSection, LoggingSection, SeedWallet, SweepSection, WalletsSection,
    load_config, GAS_FEE_ENV,
};
