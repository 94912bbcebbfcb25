//! Ledger Port
//!
//! The balance-and-transfer authority the sweeper depends on. Each individual
//! call is expected to be atomic; nothing is assumed across calls.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{TokenSymbol, WalletId};

/// Errors returned by a ledger transfer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    #[error("Insufficient {token} in wallet {wallet}: available {available}, required {required}")]
    InsufficientFunds {
        wallet: WalletId,
        token: TokenSymbol,
        available: Decimal,
        required: Decimal,
    },

    #[error("Invalid transfer amount: {0}")]
    InvalidAmount(Decimal),
}

/// Balance-and-transfer capability consumed by the sweep orchestrator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerPort: Send + Sync {
    /// Balance of `token` held by `wallet`
    ///
    /// Never fails: unknown wallets and absent tokens read as zero.
    async fn get_balance(&self, wallet: &WalletId, token: &TokenSymbol) -> Decimal;

    /// Move `amount` of `token` from `from` to `to`
    ///
    /// Fails with [`LedgerError::InsufficientFunds`] when `from` holds less
    /// than `amount`, or [`LedgerError::WalletNotFound`] for unknown ids.
    /// Any transfer fee is the ledger's concern.
    async fn send(
        &self,
        from: &WalletId,
        to: &WalletId,
        token: &TokenSymbol,
        amount: Decimal,
    ) -> Result<(), LedgerError>;
}
