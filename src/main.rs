//! Trade Router CLI
//!
//! Loads router settings from TOML (with `.env` overrides), seeds an
//! in-memory ledger from a scenario file and submits its trades, printing
//! one JSON line per trade to stdout. Logs go to stderr.
//!
//! Usage:
//!   trade-router simulate --config config/router.toml --scenario config/scenario.toml
//!   trade-router simulate ... --dry-run
//!   trade-router show-config --config config/router.toml
//!
//! Created: 2026-10-15

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;
use trade_router::config::load_config;
use trade_router::scenario::Scenario;
use trade_router::{Ledger, Router, UniswapCaller};

/// Trade router: fee extraction, slippage bounds and signed authorizations
#[derive(Parser)]
#[command(name = "trade-router")]
struct Args {
    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed a ledger from a scenario and run its trades
    Simulate {
        /// Router configuration file
        #[arg(short, long, env = "ROUTER_CONFIG", default_value = "config/router.toml")]
        config: PathBuf,

        /// Scenario file (balances, pairs, allowances, trades)
        #[arg(short, long)]
        scenario: PathBuf,

        /// Revert every trade after computing its receipt
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the resolved configuration
    ShowConfig {
        #[arg(short, long, env = "ROUTER_CONFIG", default_value = "config/router.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false);
    if args.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match args.command {
        Command::Simulate { config, scenario, dry_run } => run_simulation(config, scenario, dry_run).await,
        Command::ShowConfig { config } => show_config(config),
    }
}

async fn run_simulation(config: PathBuf, scenario: PathBuf, dry_run: bool) -> Result<()> {
    let app = load_config(&config)?;
    let scenario = Scenario::load(&scenario)?;

    let ledger = Arc::new(Mutex::new(Ledger::new(app.settings.wrapped_native)));
    let router_address = app.settings.address;
    let router = Router::new(app.settings, ledger.clone())?
        .with_executor(app.uniswap_caller, Arc::new(UniswapCaller::new()));

    info!(
        router = %router_address,
        trades = scenario.trades.len(),
        dry_run,
        "Trade router starting"
    );

    // Settlement takes a std mutex; keep it off the async workers
    let outcomes = tokio::task::spawn_blocking(move || {
        {
            let mut state = ledger
                .lock()
                .map_err(|_| anyhow::anyhow!("ledger lock poisoned"))?;
            scenario.seed(&mut state, router_address)?;
        }
        scenario.run(&router, app.uniswap_caller, dry_run)
    })
    .await
    .context("scenario task panicked")??;

    let settled = outcomes.iter().filter(|o| o.error.is_none()).count();
    for outcome in &outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }

    info!(settled, rejected = outcomes.len() - settled, "Scenario complete");
    Ok(())
}

fn show_config(config: PathBuf) -> Result<()> {
    let app = load_config(&config)?;
    let settings = &app.settings;

    let view = serde_json::json!({
        "router": settings.address.to_string(),
        "owner": settings.owner.to_string(),
        "wrapped_native": settings.wrapped_native.to_string(),
        "chain_id": settings.chain_id,
        "domain": {
            "name": settings.domain_name,
            "version": settings.domain_version,
        },
        "protocol_fee_default": {
            "share": settings.protocol_fee_default.share.to_decimal().map(|d| d.to_string()),
            "beneficiary": settings.protocol_fee_default.beneficiary.to_string(),
        },
        "fee_signer": settings.fee_signer.map(|a| a.to_string()),
        "executors": {
            "uniswap_caller": app.uniswap_caller.to_string(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
