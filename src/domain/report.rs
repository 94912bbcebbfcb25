//! Sweep Report
//!
//! Per-wallet outcomes of one sweep pass. A pass never fails because of a
//! single wallet; every skip or failure is recorded here instead.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::wallet::WalletId;

/// Which transfer of a wallet's processing failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStage {
    /// Gas top-up from the funding wallet
    TopUp,
    /// Value transfer to the destination
    Sweep,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStage::TopUp => write!(f, "TOP-UP"),
            TransferStage::Sweep => write!(f, "SWEEP"),
        }
    }
}

/// What happened to one source wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WalletOutcome {
    /// Entire value balance moved to the destination
    Swept {
        amount: Decimal,
        /// Gas received from the funding wallet first, if any
        topped_up: Option<Decimal>,
    },
    /// Wallet is the destination itself
    SkippedDestination,
    /// Value balance was zero (or negative)
    NoValueToSweep,
    /// Funding wallet could not cover the gas shortfall
    InsufficientGas { available: Decimal, required: Decimal },
    /// Gas re-read after a top-up was still below the fee
    GasStillInsufficient {
        balance: Decimal,
        required: Decimal,
        topped_up: Option<Decimal>,
    },
    /// Ledger rejected a transfer
    TransferFailure {
        stage: TransferStage,
        reason: String,
        /// Gas already received before a failed sweep transfer
        topped_up: Option<Decimal>,
    },
}

impl WalletOutcome {
    pub fn is_swept(&self) -> bool {
        matches!(self, WalletOutcome::Swept { .. })
    }

    /// Gas the funding wallet sent for this wallet, whatever happened next
    pub fn topped_up(&self) -> Option<Decimal> {
        match self {
            WalletOutcome::Swept { topped_up, .. }
            | WalletOutcome::GasStillInsufficient { topped_up, .. }
            | WalletOutcome::TransferFailure { topped_up, .. } => *topped_up,
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            WalletOutcome::InsufficientGas { .. }
                | WalletOutcome::GasStillInsufficient { .. }
                | WalletOutcome::TransferFailure { .. }
        )
    }
}

impl fmt::Display for WalletOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletOutcome::Swept { amount, topped_up: Some(gas) } => {
                return write!(f, "swept {} (gas topped up by {})", amount, gas)
            }
            WalletOutcome::Swept { amount, topped_up: None } => {
                return write!(f, "swept {}", amount)
            }
            WalletOutcome::SkippedDestination => return write!(f, "skipped (destination)"),
            WalletOutcome::NoValueToSweep => return write!(f, "skipped (nothing to sweep)"),
            WalletOutcome::InsufficientGas { available, required } => {
                return write!(
                    f,
                    "skipped (funding wallet has {} gas, needs {})",
                    available, required
                )
            }
            WalletOutcome::GasStillInsufficient { balance, required, .. } => write!(
                f,
                "skipped (gas {} still below fee {})",
                balance, required
            )?,
            WalletOutcome::TransferFailure { stage, reason, .. } => {
                write!(f, "{} failed: {}", stage, reason)?
            }
        }
        // Failures after a top-up still cost the funding wallet
        match self {
            WalletOutcome::GasStillInsufficient { topped_up: Some(gas), .. }
            | WalletOutcome::TransferFailure { topped_up: Some(gas), .. } => {
                write!(f, " (gas topped up by {})", gas)
            }
            _ => Ok(()),
        }
    }
}

/// Outcome for one occurrence of a wallet in the source list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletReport {
    pub wallet: WalletId,
    #[serde(flatten)]
    pub outcome: WalletOutcome,
}

/// Result of one full sweep pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub destination: WalletId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per source, in processing order
    pub wallets: Vec<WalletReport>,
}

impl SweepReport {
    pub fn new(destination: WalletId) -> Self {
        let now = Utc::now();
        Self {
            destination,
            started_at: now,
            finished_at: now,
            wallets: Vec::new(),
        }
    }

    pub fn record(&mut self, wallet: WalletId, outcome: WalletOutcome) {
        self.wallets.push(WalletReport { wallet, outcome });
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    pub fn swept_count(&self) -> usize {
        self.wallets.iter().filter(|w| w.outcome.is_swept()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.wallets.iter().filter(|w| w.outcome.is_failure()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.wallets.len() - self.swept_count() - self.failed_count()
    }

    /// Sum of value moved to the destination
    pub fn total_swept(&self) -> Decimal {
        self.wallets
            .iter()
            .filter_map(|w| match w.outcome {
                WalletOutcome::Swept { amount, .. } => Some(amount),
                _ => None,
            })
            .sum()
    }

    /// Sum of gas sent by the funding wallet, including wallets that then failed
    pub fn total_topped_up(&self) -> Decimal {
        self.wallets.iter().filter_map(|w| w.outcome.topped_up()).sum()
    }

    pub fn outcome_for(&self, wallet: &WalletId) -> Option<&WalletOutcome> {
        self.wallets
            .iter()
            .find(|w| &w.wallet == wallet)
            .map(|w| &w.outcome)
    }
}
