//! Wallet Sweeper
//!
//! Consolidates value-token balances into one collection wallet.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (SWEEPER_GAS_FEE and RUST_LOG may live here)
    dotenvy::dotenv().ok();

    let app = sweeper::adapters::cli::init();
    sweeper::adapters::cli::execute(app).await
}
