//! Domain Layer - Core types for the wallet sweeper
//!
//! Pure types with no ledger access. Balances are owned by whatever sits
//! behind the ledger port; the domain only names wallets and tokens and
//! describes what a sweep pass did.

pub mod wallet;
pub mod report;

pub use wallet::{TokenRoles, TokenSymbol, WalletId, DEFAULT_GAS_TOKEN, DEFAULT_VALUE_TOKEN};
pub use report::{SweepReport, TransferStage, WalletOutcome, WalletReport};
