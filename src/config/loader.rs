//! Configuration Loader
//!
//! Loads and validates sweeper configuration from TOML files.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::application::{SweepConfig, DEFAULT_GAS_FEE};
use crate::domain::{TokenRoles, WalletId, DEFAULT_GAS_TOKEN, DEFAULT_VALUE_TOKEN};

/// Environment variable overriding `sweep.gas_fee`
pub const GAS_FEE_ENV: &str = "SWEEPER_GAS_FEE";

/// Main configuration structure matching sweeper.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sweep: SweepSection,
    pub wallets: WalletsSection,
    #[serde(default)]
    pub ledger: LedgerSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Token roles and fee
#[derive(Debug, Clone, Deserialize)]
pub struct SweepSection {
    /// Token consolidated into the destination
    #[serde(default = "default_value_token")]
    pub value_token: String,
    /// Token that pays the transfer fee
    #[serde(default = "default_gas_token")]
    pub gas_token: String,
    /// Gas required per sweep transfer
    #[serde(default = "default_gas_fee")]
    pub gas_fee: Decimal,
}

impl Default for SweepSection {
    fn default() -> Self {
        Self {
            value_token: default_value_token(),
            gas_token: default_gas_token(),
            gas_fee: default_gas_fee(),
        }
    }
}

fn default_value_token() -> String {
    DEFAULT_VALUE_TOKEN.to_string()
}

fn default_gas_token() -> String {
    DEFAULT_GAS_TOKEN.to_string()
}

fn default_gas_fee() -> Decimal {
    DEFAULT_GAS_FEE
}

/// Wallet roles
#[derive(Debug, Clone, Deserialize)]
pub struct WalletsSection {
    /// Collection wallet receiving swept value
    pub destination: String,
    /// Wallet covering gas shortfalls (defaults to the destination)
    #[serde(default)]
    pub funding: Option<String>,
    /// Wallets to sweep, in order (defaults to every seeded wallet but the destination)
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

/// Wallets seeded into the simulated ledger
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LedgerSection {
    #[serde(default)]
    pub wallets: Vec<SeedWallet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedWallet {
    pub id: String,
    #[serde(default)]
    pub balances: BTreeMap<String, Decimal>,
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
///
/// `SWEEPER_GAS_FEE` overrides the configured fee when set.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;
    config.apply_gas_fee_override(std::env::var(GAS_FEE_ENV).ok())?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Replace the gas fee with a raw override value, if present
    pub fn apply_gas_fee_override(&mut self, raw: Option<String>) -> Result<(), ConfigError> {
        if let Some(raw) = raw {
            let fee = Decimal::from_str(raw.trim()).map_err(|e| {
                ConfigError::ValidationError(format!("{} is not a decimal ({}): {}", GAS_FEE_ENV, raw, e))
            })?;
            self.sweep.gas_fee = fee;
        }
        Ok(())
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate sweep section
        if self.sweep.value_token.is_empty() {
            return Err(ConfigError::ValidationError(
                "value_token cannot be empty".to_string(),
            ));
        }

        if self.sweep.gas_token.is_empty() {
            return Err(ConfigError::ValidationError(
                "gas_token cannot be empty".to_string(),
            ));
        }

        if self.sweep.value_token == self.sweep.gas_token {
            return Err(ConfigError::ValidationError(format!(
                "value_token and gas_token must differ, both are {}",
                self.sweep.value_token
            )));
        }

        if self.sweep.gas_fee < Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "gas_fee must be >= 0, got {}",
                self.sweep.gas_fee
            )));
        }

        // Validate seeded ledger
        let mut seen = HashSet::new();
        for wallet in &self.ledger.wallets {
            if wallet.id.is_empty() {
                return Err(ConfigError::ValidationError(
                    "ledger wallet id cannot be empty".to_string(),
                ));
            }
            if !seen.insert(wallet.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate ledger wallet id {}",
                    wallet.id
                )));
            }
            if let Some((token, amount)) = wallet.balances.iter().find(|(_, a)| **a < Decimal::ZERO) {
                return Err(ConfigError::ValidationError(format!(
                    "wallet {} has negative {} balance {}",
                    wallet.id, token, amount
                )));
            }
        }

        // Validate wallet roles
        if self.wallets.destination.is_empty() {
            return Err(ConfigError::ValidationError(
                "destination cannot be empty".to_string(),
            ));
        }

        let mut referenced = vec![&self.wallets.destination];
        referenced.extend(self.wallets.funding.iter());
        referenced.extend(self.wallets.sources.iter().flatten());
        if let Some(missing) = referenced.into_iter().find(|id| !seen.contains(id.as_str())) {
            return Err(ConfigError::ValidationError(format!(
                "wallet {} is not defined under [[ledger.wallets]]",
                missing
            )));
        }

        Ok(())
    }

    pub fn destination(&self) -> WalletId {
        WalletId::from(self.wallets.destination.as_str())
    }

    /// Funding wallet, falling back to the destination
    pub fn funding_wallet(&self) -> WalletId {
        self.wallets
            .funding
            .as_deref()
            .map(WalletId::from)
            .unwrap_or_else(|| self.destination())
    }

    /// Wallets to sweep, in configured order
    pub fn sources(&self) -> Vec<WalletId> {
        match &self.wallets.sources {
            Some(sources) => sources.iter().map(|id| WalletId::from(id.as_str())).collect(),
            None => self
                .ledger
                .wallets
                .iter()
                .filter(|w| w.id != self.wallets.destination)
                .map(|w| WalletId::from(w.id.as_str()))
                .collect(),
        }
    }
}

impl From<&Config> for SweepConfig {
    fn from(config: &Config) -> Self {
        SweepConfig {
            tokens: TokenRoles::new(config.sweep.value_token.as_str(), config.sweep.gas_token.as_str()),
            gas_fee: config.sweep.gas_fee,
        }
    }
}
