//! Simulated Adapter
//!
//! In-memory ledger used by the CLI dry runs and by tests.

mod ledger;

pub use ledger::{Balances, SimulatedLedger, TransferRecord};
