//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the wallet sweeper.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::simulated::SimulatedLedger;
use crate::application::{SweepConfig, SweepOrchestrator};
use crate::config::{load_config, Config};
use crate::domain::{SweepReport, TokenSymbol, WalletId};
use crate::ports::LedgerPort;

/// Wallet Sweeper - consolidate value tokens into one collection wallet
#[derive(Parser, Debug)]
#[command(
    name = "wallet-sweeper",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Consolidates value-token balances into one collection wallet",
    long_about = "Sweeps the value-token balance of every source wallet into a destination \
                  wallet, topping up missing gas from a funding wallet first. Runs against \
                  an in-memory ledger seeded from the config file."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one sweep pass
    Sweep(SweepCmd),

    /// Show seeded wallet balances
    Status(StatusCmd),
}

/// Output format for command results
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Run one sweep pass
#[derive(Parser, Debug)]
pub struct SweepCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/sweeper.toml")]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Sweep only these wallets, in this order (repeatable)
    #[arg(short, long = "wallet", value_name = "ID")]
    pub wallets: Vec<String>,
}

/// Show balances
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/sweeper.toml")]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config_path = match &app.command {
        Command::Sweep(cmd) => &cmd.config,
        Command::Status(cmd) => &cmd.config,
    };
    let config = load(config_path)?;

    // Flags win over the configured level
    let level = log_level(app.verbose, app.debug, &config.logging.level);
    init_logging(level)?;
    tracing::info!("Config: {}", config_path.display());

    match app.command {
        Command::Sweep(cmd) => sweep_command(cmd, config).await,
        Command::Status(cmd) => status_command(cmd, config).await,
    }
}

fn log_level<'a>(verbose: bool, debug: bool, configured: &'a str) -> &'a str {
    if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured
    }
}

/// Initialize logging system
fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

fn load(path: &Path) -> Result<Config> {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
    load_config(&expanded).with_context(|| format!("Failed to load configuration from {}", expanded))
}

/// Build the in-memory ledger described by the config
pub async fn seed_ledger(config: &Config) -> SimulatedLedger {
    let ledger = SimulatedLedger::new(config.sweep.gas_fee, config.sweep.gas_token.as_str());
    for wallet in &config.ledger.wallets {
        let balances = wallet
            .balances
            .iter()
            .map(|(token, amount)| (TokenSymbol::from(token.as_str()), *amount));
        ledger.insert_wallet(WalletId::from(wallet.id.as_str()), balances).await;
    }
    ledger
}

/// Ids in `wallets` the ledger has never seen, in order
async fn unknown_wallets(ledger: &SimulatedLedger, wallets: &[WalletId]) -> Vec<WalletId> {
    let mut unknown = Vec::new();
    for wallet in wallets {
        if !ledger.contains(wallet).await {
            unknown.push(wallet.clone());
        }
    }
    unknown
}

/// Handle sweep command
async fn sweep_command(cmd: SweepCmd, config: Config) -> Result<()> {
    let orchestrator = SweepOrchestrator::new(
        Arc::new(seed_ledger(&config).await),
        config.funding_wallet(),
        SweepConfig::from(&config),
    )
    .context("Failed to create orchestrator")?;
    let ledger = orchestrator.ledger();

    let sources = if cmd.wallets.is_empty() {
        config.sources()
    } else {
        cmd.wallets.iter().map(|id| WalletId::from(id.as_str())).collect()
    };
    for wallet in unknown_wallets(ledger, &sources).await {
        tracing::warn!("Wallet {} is not in the ledger and reads as empty", wallet);
    }

    let report = orchestrator.sweep_all(&sources, &config.destination()).await;
    let balances = ledger.snapshot().await;

    match cmd.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "report": report,
                "balances": balances,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            print_report(&report, &orchestrator);
            println!();
            print_balances(&balances);
        }
    }

    Ok(())
}

/// Handle status command
async fn status_command(cmd: StatusCmd, config: Config) -> Result<()> {
    let ledger = seed_ledger(&config).await;
    let balances = ledger.snapshot().await;

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&balances)?),
        OutputFormat::Text => {
            println!("Destination: {}", config.destination());
            println!("Funding:     {}", config.funding_wallet());
            println!("Gas fee:     {} {}", ledger.transfer_fee(), ledger.gas_token());
            println!();
            print_balances(&balances);
        }
    }

    Ok(())
}

fn print_report<L: LedgerPort>(report: &SweepReport, orchestrator: &SweepOrchestrator<L>) {
    let tokens = &orchestrator.config().tokens;
    println!(
        "Sweep into {} (gas funded by {})",
        report.destination,
        orchestrator.funding_wallet()
    );
    for entry in &report.wallets {
        println!("  {:<20} {}", entry.wallet.to_string(), entry.outcome);
    }
    println!(
        "Swept {} {} from {} wallet(s); {} skipped, {} failed; {} {} topped up",
        report.total_swept(),
        tokens.value,
        report.swept_count(),
        report.skipped_count(),
        report.failed_count(),
        report.total_topped_up(),
        tokens.gas
    );
}

fn print_balances(balances: &BTreeMap<WalletId, BTreeMap<TokenSymbol, Decimal>>) {
    println!("Balances:");
    for (wallet, tokens) in balances {
        let line = tokens
            .iter()
            .map(|(token, amount)| format!("{} {}", amount, token))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {:<20} {}", wallet.to_string(), line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_config() -> Config {
        toml::from_str(
            r#"
[wallets]
destination = "main"

[[ledger.wallets]]
id = "main"
balances = { ETH = 1 }

[[ledger.wallets]]
id = "hot"
balances = { ETH = 0.005, USDT = 80 }
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_sweep_command() {
        let app = CliApp::try_parse_from([
            "wallet-sweeper",
            "--verbose",
            "sweep",
            "--config",
            "my.toml",
            "--wallet",
            "a",
            "--wallet",
            "b",
        ])
        .unwrap();

        assert!(app.verbose);
        match app.command {
            Command::Sweep(cmd) => {
                assert_eq!(cmd.config, PathBuf::from("my.toml"));
                assert_eq!(cmd.wallets, vec!["a", "b"]);
                assert_eq!(cmd.format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_status_defaults() {
        let app = CliApp::try_parse_from(["wallet-sweeper", "status", "-f", "json"]).unwrap();

        match app.command {
            Command::Status(cmd) => {
                assert_eq!(cmd.config, PathBuf::from("config/sweeper.toml"));
                assert_eq!(cmd.format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unrecognised_format_rejected() {
        let result = CliApp::try_parse_from(["wallet-sweeper", "sweep", "--format", "yaml"]);
        assert!(result.is_err());

        let result = CliApp::try_parse_from(["wallet-sweeper", "status", "-f", "JSON"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_level_precedence() {
        assert_eq!(log_level(true, true, "error"), "debug");
        assert_eq!(log_level(true, false, "error"), "info");
        assert_eq!(log_level(false, false, "error"), "error");
    }

    #[tokio::test]
    async fn test_seed_ledger_from_config() {
        let config = test_config();
        let ledger = seed_ledger(&config).await;

        assert_eq!(ledger.transfer_fee(), dec!(0.01));
        assert_eq!(
            ledger
                .get_balance(&WalletId::from("hot"), &TokenSymbol::from("USDT"))
                .await,
            dec!(80)
        );
        assert_eq!(
            ledger
                .get_balance(&WalletId::from("main"), &TokenSymbol::from("USDT"))
                .await,
            Decimal::ZERO
        );
    }

    #[tokio::test]
    async fn test_unknown_wallets_listed_in_order() {
        let ledger = seed_ledger(&test_config()).await;
        let wallets = [
            WalletId::from("ghost-b"),
            WalletId::from("hot"),
            WalletId::from("ghost-a"),
        ];

        let unknown = unknown_wallets(&ledger, &wallets).await;

        assert_eq!(unknown, vec![WalletId::from("ghost-b"), WalletId::from("ghost-a")]);
    }
}
