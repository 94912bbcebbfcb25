//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Simulated: in-memory ledger
//! - CLI: Command-line interface handlers

pub mod simulated;
pub mod cli;

pub use simulated::SimulatedLedger;
pub use cli::CliApp;
