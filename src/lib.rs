//! Wallet Sweeper Library
//!
//! Consolidates value-token balances held across many custodial wallets into
//! one collection wallet, covering gas shortfalls from a funding wallet first.
//!
//! # Modules
//!
//! - `domain`: Wallet and token identifiers, sweep reports
//! - `ports`: Trait abstractions (LedgerPort)
//! - `adapters`: External implementations (simulated ledger, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Sweep orchestrator

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
