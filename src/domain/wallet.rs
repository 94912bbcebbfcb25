//! Wallet and Token Identifiers
//!
//! Opaque identifiers the sweeper passes to the ledger. Balances themselves
//! live in the ledger; nothing here holds or mutates them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default symbol of the asset being consolidated
pub const DEFAULT_VALUE_TOKEN: &str = "USDT";

/// Default symbol of the asset that pays transfer fees
pub const DEFAULT_GAS_TOKEN: &str = "ETH";

/// Opaque wallet identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(String);

impl WalletId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WalletId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for WalletId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Token symbol as understood by the ledger (e.g. "USDT", "ETH")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSymbol(String);

impl TokenSymbol {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenSymbol {
    fn from(symbol: &str) -> Self {
        Self(symbol.to_string())
    }
}

impl From<String> for TokenSymbol {
    fn from(symbol: String) -> Self {
        Self(symbol)
    }
}

/// The two fixed token roles of a sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRoles {
    /// Asset being consolidated into the destination
    pub value: TokenSymbol,
    /// Asset required to pay the per-transfer fee
    pub gas: TokenSymbol,
}

impl TokenRoles {
    pub fn new(value: impl Into<TokenSymbol>, gas: impl Into<TokenSymbol>) -> Self {
        Self {
            value: value.into(),
            gas: gas.into(),
        }
    }
}

impl Default for TokenRoles {
    fn default() -> Self {
        Self::new(DEFAULT_VALUE_TOKEN, DEFAULT_GAS_TOKEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_id_display() {
        let id = WalletId::from("wallet-7");
        assert_eq!(id.to_string(), "wallet-7");
        assert_eq!(id.as_str(), "wallet-7");
    }

    #[test]
    fn test_wallet_id_serializes_as_plain_string() {
        let id = WalletId::new("main");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"main\"");

        let parsed: WalletId = serde_json::from_str("\"main\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_default_token_roles() {
        let roles = TokenRoles::default();
        assert_eq!(roles.value, TokenSymbol::from("USDT"));
        assert_eq!(roles.gas, TokenSymbol::from("ETH"));
    }
}
