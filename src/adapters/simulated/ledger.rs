//! Simulated Ledger
//!
//! In-memory ledger for dry runs and tests. Tracks per-wallet token balances,
//! charges a fixed gas fee on every non-gas transfer and keeps a transfer log.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{TokenSymbol, WalletId};
use crate::ports::{LedgerError, LedgerPort};

/// Token balances of a single wallet
pub type Balances = HashMap<TokenSymbol, Decimal>;

/// A transfer the ledger accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Sequential id, starting at 1
    pub id: u64,
    pub from: WalletId,
    pub to: WalletId,
    pub token: TokenSymbol,
    pub amount: Decimal,
    /// Gas burned from the sender for this transfer
    pub fee: Decimal,
}

#[derive(Debug, Default)]
struct LedgerState {
    wallets: HashMap<WalletId, Balances>,
    transfers: Vec<TransferRecord>,
}

/// In-memory ledger with a fixed per-transfer fee
///
/// Sending the gas token itself is fee-free, so a funding wallet pays exactly
/// the top-up amount. Every other transfer burns `transfer_fee` of the gas
/// token from the sender.
#[derive(Debug)]
pub struct SimulatedLedger {
    transfer_fee: Decimal,
    gas_token: TokenSymbol,
    state: RwLock<LedgerState>,
    next_wallet: AtomicU64,
}

impl SimulatedLedger {
    pub fn new(transfer_fee: Decimal, gas_token: impl Into<TokenSymbol>) -> Self {
        Self {
            transfer_fee,
            gas_token: gas_token.into(),
            state: RwLock::new(LedgerState::default()),
            next_wallet: AtomicU64::new(1),
        }
    }

    pub fn transfer_fee(&self) -> Decimal {
        self.transfer_fee
    }

    pub fn gas_token(&self) -> &TokenSymbol {
        &self.gas_token
    }

    /// Create a wallet with a generated id (`wallet-1`, `wallet-2`, ...)
    pub async fn create_wallet<I, T>(&self, balances: I) -> WalletId
    where
        I: IntoIterator<Item = (T, Decimal)>,
        T: Into<TokenSymbol>,
    {
        let mut state = self.state.write().await;
        let id = loop {
            let n = self.next_wallet.fetch_add(1, Ordering::Relaxed);
            let candidate = WalletId::new(format!("wallet-{}", n));
            if !state.wallets.contains_key(&candidate) {
                break candidate;
            }
        };

        let balances: Balances = balances.into_iter().map(|(t, a)| (t.into(), a)).collect();
        state.wallets.insert(id.clone(), balances);
        debug!("Created wallet {}", id);
        id
    }

    /// Register a wallet under a fixed id, replacing any existing balances
    pub async fn insert_wallet<I, T>(&self, id: WalletId, balances: I)
    where
        I: IntoIterator<Item = (T, Decimal)>,
        T: Into<TokenSymbol>,
    {
        let balances: Balances = balances.into_iter().map(|(t, a)| (t.into(), a)).collect();
        self.state.write().await.wallets.insert(id, balances);
    }

    pub async fn contains(&self, wallet: &WalletId) -> bool {
        self.state.read().await.wallets.contains_key(wallet)
    }

    /// Every wallet's balances, ordered by wallet id
    pub async fn snapshot(&self) -> BTreeMap<WalletId, BTreeMap<TokenSymbol, Decimal>> {
        self.state
            .read()
            .await
            .wallets
            .iter()
            .map(|(id, balances)| {
                let ordered: BTreeMap<TokenSymbol, Decimal> =
                    balances.iter().map(|(t, a)| (t.clone(), *a)).collect();
                (id.clone(), ordered)
            })
            .collect()
    }

    /// Transfers accepted so far, oldest first
    pub async fn transfers(&self) -> Vec<TransferRecord> {
        self.state.read().await.transfers.clone()
    }

    fn fee_for(&self, token: &TokenSymbol) -> Decimal {
        if token == &self.gas_token {
            Decimal::ZERO
        } else {
            self.transfer_fee
        }
    }
}

fn balance_of(balances: &Balances, token: &TokenSymbol) -> Decimal {
    balances.get(token).copied().unwrap_or(Decimal::ZERO)
}

#[async_trait]
impl LedgerPort for SimulatedLedger {
    async fn get_balance(&self, wallet: &WalletId, token: &TokenSymbol) -> Decimal {
        self.state
            .read()
            .await
            .wallets
            .get(wallet)
            .map(|balances| balance_of(balances, token))
            .unwrap_or(Decimal::ZERO)
    }

    async fn send(
        &self,
        from: &WalletId,
        to: &WalletId,
        token: &TokenSymbol,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let fee = self.fee_for(token);
        let mut state = self.state.write().await;

        if !state.wallets.contains_key(to) {
            return Err(LedgerError::WalletNotFound(to.clone()));
        }
        let sender = state
            .wallets
            .get_mut(from)
            .ok_or_else(|| LedgerError::WalletNotFound(from.clone()))?;

        // Validate both debits before touching anything
        let available = balance_of(sender, token);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                wallet: from.clone(),
                token: token.clone(),
                available,
                required: amount,
            });
        }
        let gas_available = balance_of(sender, &self.gas_token);
        if gas_available < fee {
            return Err(LedgerError::InsufficientFunds {
                wallet: from.clone(),
                token: self.gas_token.clone(),
                available: gas_available,
                required: fee,
            });
        }

        *sender.entry(token.clone()).or_insert(Decimal::ZERO) -= amount;
        if !fee.is_zero() {
            *sender.entry(self.gas_token.clone()).or_insert(Decimal::ZERO) -= fee;
        }

        // Re-borrow for the receiver; `from` and `to` may be the same wallet
        if let Some(receiver) = state.wallets.get_mut(to) {
            *receiver.entry(token.clone()).or_insert(Decimal::ZERO) += amount;
        }

        let id = state.transfers.len() as u64 + 1;
        state.transfers.push(TransferRecord {
            id,
            from: from.clone(),
            to: to.clone(),
            token: token.clone(),
            amount,
            fee,
        });

        debug!("Ledger transfer #{}: {} {} {} -> {} (fee {})", id, amount, token, from, to, fee);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const ETH: &str = "ETH";
    const USDT: &str = "USDT";

    fn eth() -> TokenSymbol {
        TokenSymbol::from(ETH)
    }

    fn usdt() -> TokenSymbol {
        TokenSymbol::from(USDT)
    }

    fn create_test_ledger() -> SimulatedLedger {
        SimulatedLedger::new(dec!(0.01), ETH)
    }

    #[tokio::test]
    async fn test_create_wallet_assigns_sequential_ids() {
        let ledger = create_test_ledger();

        let a = ledger.create_wallet([(ETH, dec!(1))]).await;
        let b = ledger.create_wallet([(ETH, dec!(2))]).await;

        assert_eq!(a, WalletId::from("wallet-1"));
        assert_eq!(b, WalletId::from("wallet-2"));
        assert_eq!(ledger.get_balance(&b, &eth()).await, dec!(2));
    }

    #[tokio::test]
    async fn test_create_wallet_skips_taken_ids() {
        let ledger = create_test_ledger();
        ledger.insert_wallet(WalletId::from("wallet-1"), [(ETH, dec!(5))]).await;

        let created = ledger.create_wallet([(ETH, dec!(1))]).await;

        assert_eq!(created, WalletId::from("wallet-2"));
        assert_eq!(ledger.get_balance(&WalletId::from("wallet-1"), &eth()).await, dec!(5));
    }

    #[tokio::test]
    async fn test_contains_only_registered_wallets() {
        let ledger = create_test_ledger();
        let wallet = ledger.create_wallet([(ETH, dec!(1))]).await;

        assert_eq!(ledger.gas_token(), &eth());
        assert!(ledger.contains(&wallet).await);
        assert!(!ledger.contains(&WalletId::from("ghost")).await);

        // Reading an unknown wallet does not register it
        ledger.get_balance(&WalletId::from("ghost"), &eth()).await;
        assert!(!ledger.contains(&WalletId::from("ghost")).await);
    }

    #[tokio::test]
    async fn test_absent_balances_read_as_zero() {
        let ledger = create_test_ledger();
        let wallet = ledger.create_wallet([(ETH, dec!(1))]).await;

        assert_eq!(ledger.get_balance(&wallet, &usdt()).await, Decimal::ZERO);
        assert_eq!(
            ledger.get_balance(&WalletId::from("ghost"), &eth()).await,
            Decimal::ZERO
        );
    }

    #[tokio::test]
    async fn test_value_transfer_burns_fee() {
        let ledger = create_test_ledger();
        let from = ledger.create_wallet([(ETH, dec!(0.1)), (USDT, dec!(100))]).await;
        let to = ledger.create_wallet([(ETH, dec!(1))]).await;

        ledger.send(&from, &to, &usdt(), dec!(100)).await.unwrap();

        assert_eq!(ledger.get_balance(&from, &usdt()).await, dec!(0));
        assert_eq!(ledger.get_balance(&from, &eth()).await, dec!(0.09));
        assert_eq!(ledger.get_balance(&to, &usdt()).await, dec!(100));
        assert_eq!(ledger.get_balance(&to, &eth()).await, dec!(1));

        let transfers = ledger.transfers().await;
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].fee, dec!(0.01));
    }

    #[tokio::test]
    async fn test_gas_transfer_is_fee_free() {
        let ledger = create_test_ledger();
        let funder = ledger.create_wallet([(ETH, dec!(1))]).await;
        let target = ledger.create_wallet([(ETH, dec!(0.005))]).await;

        ledger.send(&funder, &target, &eth(), dec!(0.005)).await.unwrap();

        assert_eq!(ledger.get_balance(&funder, &eth()).await, dec!(0.995));
        assert_eq!(ledger.get_balance(&target, &eth()).await, dec!(0.01));
    }

    #[tokio::test]
    async fn test_insufficient_token_balance_rejected() {
        let ledger = create_test_ledger();
        let from = ledger.create_wallet([(ETH, dec!(1)), (USDT, dec!(10))]).await;
        let to = ledger.create_wallet(Vec::<(TokenSymbol, Decimal)>::new()).await;

        let result = ledger.send(&from, &to, &usdt(), dec!(11)).await;

        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds { ref token, .. }) if token == &usdt()
        ));
        assert_eq!(ledger.get_balance(&from, &usdt()).await, dec!(10));
        assert!(ledger.transfers().await.is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_gas_for_fee_rejected_without_changes() {
        let ledger = create_test_ledger();
        let from = ledger.create_wallet([(ETH, dec!(0.009)), (USDT, dec!(10))]).await;
        let to = ledger.create_wallet(Vec::<(TokenSymbol, Decimal)>::new()).await;

        let result = ledger.send(&from, &to, &usdt(), dec!(10)).await;

        assert_eq!(
            result,
            Err(LedgerError::InsufficientFunds {
                wallet: from.clone(),
                token: eth(),
                available: dec!(0.009),
                required: dec!(0.01),
            })
        );
        assert_eq!(ledger.get_balance(&from, &usdt()).await, dec!(10));
        assert_eq!(ledger.get_balance(&from, &eth()).await, dec!(0.009));
        assert_eq!(ledger.get_balance(&to, &usdt()).await, dec!(0));
    }

    #[tokio::test]
    async fn test_unknown_wallets_rejected() {
        let ledger = create_test_ledger();
        let known = ledger.create_wallet([(ETH, dec!(1))]).await;
        let ghost = WalletId::from("ghost");

        assert_eq!(
            ledger.send(&ghost, &known, &eth(), dec!(0.1)).await,
            Err(LedgerError::WalletNotFound(ghost.clone()))
        );
        assert_eq!(
            ledger.send(&known, &ghost, &eth(), dec!(0.1)).await,
            Err(LedgerError::WalletNotFound(ghost))
        );
        assert_eq!(ledger.get_balance(&known, &eth()).await, dec!(1));
    }

    #[tokio::test]
    async fn test_negative_amount_rejected() {
        let ledger = create_test_ledger();
        let a = ledger.create_wallet([(ETH, dec!(1))]).await;
        let b = ledger.create_wallet([(ETH, dec!(1))]).await;

        let result = ledger.send(&a, &b, &eth(), dec!(-0.5)).await;

        assert_eq!(result, Err(LedgerError::InvalidAmount(dec!(-0.5))));
    }

    #[tokio::test]
    async fn test_snapshot_is_ordered() {
        let ledger = create_test_ledger();
        ledger.insert_wallet(WalletId::from("b"), [(ETH, dec!(2))]).await;
        ledger.insert_wallet(WalletId::from("a"), [(ETH, dec!(1))]).await;

        let snapshot = ledger.snapshot().await;
        let ids: Vec<_> = snapshot.keys().map(|id| id.as_str().to_string()).collect();

        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(snapshot[&WalletId::from("a")][&eth()], dec!(1));
    }
}
