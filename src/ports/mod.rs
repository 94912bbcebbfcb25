//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, the sweeper reaches the outside world
//! only through these traits:
//! - Ledger balances and transfers

pub mod ledger;

pub use ledger::{LedgerError, LedgerPort};

#[cfg(test)]
pub use ledger::MockLedgerPort;
