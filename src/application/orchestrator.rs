//! Sweep Orchestrator
//!
//! Consolidates the value-token balance of many source wallets into one
//! destination wallet. Wallets short on gas are topped up from a funding
//! wallet first.
//!
//! Wallets are processed strictly one after another. A later wallet therefore
//! sees the funding balance already reduced by earlier top-ups, and the
//! funding wallet can never be overspent by two top-ups racing each other.
//! A single wallet's failure never aborts the pass.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::domain::{
    SweepReport, TokenRoles, TokenSymbol, TransferStage, WalletId, WalletOutcome,
};
use crate::ports::{LedgerError, LedgerPort};

/// Gas-token amount required to authorize one sweep transfer
pub const DEFAULT_GAS_FEE: Decimal = dec!(0.01);

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Per-wallet failure, converted into a [`WalletOutcome`] and never propagated
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Funding wallet {funder} has insufficient {token} ({available}) to provide {required}")]
    InsufficientGas {
        funder: WalletId,
        token: TokenSymbol,
        available: Decimal,
        required: Decimal,
    },

    #[error("{stage} transfer from {from} failed: {source}")]
    TransferFailure {
        stage: TransferStage,
        from: WalletId,
        #[source]
        source: LedgerError,
    },
}

impl From<SweepError> for WalletOutcome {
    fn from(err: SweepError) -> Self {
        match err {
            SweepError::InsufficientGas { available, required, .. } => {
                WalletOutcome::InsufficientGas { available, required }
            }
            SweepError::TransferFailure { stage, source, .. } => WalletOutcome::TransferFailure {
                stage,
                reason: source.to_string(),
                topped_up: None,
            },
        }
    }
}

/// Fixed sweep parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    pub tokens: TokenRoles,
    pub gas_fee: Decimal,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            tokens: TokenRoles::default(),
            gas_fee: DEFAULT_GAS_FEE,
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.gas_fee < Decimal::ZERO {
            return Err(OrchestratorError::Config(format!(
                "gas_fee must be >= 0, got {}",
                self.gas_fee
            )));
        }
        if self.tokens.value == self.tokens.gas {
            return Err(OrchestratorError::Config(format!(
                "value and gas token must differ, both are {}",
                self.tokens.value
            )));
        }
        Ok(())
    }
}

/// Sweeps value tokens into a destination, funding gas shortfalls
pub struct SweepOrchestrator<L: LedgerPort> {
    ledger: Arc<L>,
    funding_wallet: WalletId,
    config: SweepConfig,
    /// Held for the whole of one pass; overlapping passes queue up
    pass_lock: Arc<Mutex<()>>,
}

impl<L: LedgerPort> SweepOrchestrator<L> {
    /// Create new orchestrator
    ///
    /// `funding_wallet` covers gas shortfalls. It is often the same wallet as
    /// the sweep destination, but the two are passed separately.
    pub fn new(
        ledger: Arc<L>,
        funding_wallet: WalletId,
        config: SweepConfig,
    ) -> Result<Self, OrchestratorError> {
        config.validate()?;

        Ok(Self {
            ledger,
            funding_wallet,
            config,
            pass_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn funding_wallet(&self) -> &WalletId {
        &self.funding_wallet
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Run one sweep pass over `sources`, in order
    ///
    /// Duplicate ids are processed once per occurrence. The destination is
    /// always skipped. Only the value balance observed when a wallet's turn
    /// starts is swept; funds arriving later wait for the next pass.
    pub async fn sweep_all(&self, sources: &[WalletId], destination: &WalletId) -> SweepReport {
        let _pass = self.pass_lock.lock().await;

        info!(
            "Starting sweep of {} wallet(s) into {} (gas fee {} {})",
            sources.len(),
            destination,
            self.config.gas_fee,
            self.config.tokens.gas
        );

        let mut report = SweepReport::new(destination.clone());
        for wallet in sources {
            let outcome = self.sweep_wallet(wallet, destination).await;
            report.record(wallet.clone(), outcome);
        }
        let report = report.finish();

        info!(
            "Sweep complete: {} swept ({} {}), {} skipped, {} failed",
            report.swept_count(),
            report.total_swept(),
            self.config.tokens.value,
            report.skipped_count(),
            report.failed_count()
        );
        report
    }

    /// Top up `target` with exactly `amount` gas from `funder`
    ///
    /// Returns `false` without transferring anything if the funder is short,
    /// or if the ledger rejects the transfer. Never a partial top-up.
    pub async fn top_up(&self, target: &WalletId, funder: &WalletId, amount: Decimal) -> bool {
        self.try_top_up(target, funder, amount).await.is_ok()
    }

    async fn try_top_up(
        &self,
        target: &WalletId,
        funder: &WalletId,
        amount: Decimal,
    ) -> Result<(), SweepError> {
        let gas = &self.config.tokens.gas;
        let available = self.ledger.get_balance(funder, gas).await;

        if available < amount {
            let err = SweepError::InsufficientGas {
                funder: funder.clone(),
                token: gas.clone(),
                available,
                required: amount,
            };
            warn!("Cannot top up wallet {}: {}", target, err);
            return Err(err);
        }

        match self.ledger.send(funder, target, gas, amount).await {
            Ok(()) => {
                info!("Topped up {} {} to wallet {} for gas", amount, gas, target);
                Ok(())
            }
            Err(e) => {
                let err = SweepError::TransferFailure {
                    stage: TransferStage::TopUp,
                    from: funder.clone(),
                    source: e,
                };
                error!("Failed to top up gas for wallet {}: {}", target, err);
                Err(err)
            }
        }
    }

    async fn sweep_wallet(&self, wallet: &WalletId, destination: &WalletId) -> WalletOutcome {
        if wallet == destination {
            debug!("Skipping destination wallet {}", wallet);
            return WalletOutcome::SkippedDestination;
        }

        let tokens = &self.config.tokens;
        let fee = self.config.gas_fee;

        let value = self.ledger.get_balance(wallet, &tokens.value).await;
        if value <= Decimal::ZERO {
            debug!("Wallet {} has no {} to sweep", wallet, tokens.value);
            return WalletOutcome::NoValueToSweep;
        }

        let mut gas = self.ledger.get_balance(wallet, &tokens.gas).await;
        let mut topped_up = None;

        if gas < fee {
            let shortfall = fee - gas;
            if let Err(e) = self.try_top_up(wallet, &self.funding_wallet, shortfall).await {
                return e.into();
            }
            topped_up = Some(shortfall);
            // The ledger is the source of truth, not our arithmetic
            gas = self.ledger.get_balance(wallet, &tokens.gas).await;
        }

        if gas < fee {
            warn!(
                "Wallet {} still has {} {} after top-up, below fee {}",
                wallet, gas, tokens.gas, fee
            );
            return WalletOutcome::GasStillInsufficient { balance: gas, required: fee, topped_up };
        }

        match self.ledger.send(wallet, destination, &tokens.value, value).await {
            Ok(()) => {
                info!("Successfully swept {} {} from wallet {}", value, tokens.value, wallet);
                WalletOutcome::Swept { amount: value, topped_up }
            }
            Err(e) => {
                let reason = e.to_string();
                let err = SweepError::TransferFailure {
                    stage: TransferStage::Sweep,
                    from: wallet.clone(),
                    source: e,
                };
                error!("Failed to sweep wallet {}: {}", wallet, err);
                // The top-up already happened and still counts against the funder
                WalletOutcome::TransferFailure { stage: TransferStage::Sweep, reason, topped_up }
            }
        }
    }
}

impl<L: LedgerPort> Clone for SweepOrchestrator<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            funding_wallet: self.funding_wallet.clone(),
            config: self.config.clone(),
            pass_lock: Arc::clone(&self.pass_lock),
        }
    }
}
