//! BTC up/down relative-value bot entry point.

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use polymarket_rv::api::{create_router, AppState};
use polymarket_rv::config::Config;
use polymarket_rv::market::{Cadence, MarketLocator, PolymarketClient};
use polymarket_rv::metrics;
use polymarket_rv::quote::QuoteService;
use polymarket_rv::runner::Runner;
use polymarket_rv::signing::address_from_private_key;
use polymarket_rv::trading::{LiveGateway, OrderGateway, SimulatedGateway};
use polymarket_rv::utils::{shutdown_requested, spawn_shutdown_listener};

/// BTC up/down relative-value bot.
#[derive(Parser, Debug)]
#[command(name = "polymarket-rv")]
#[command(about = "Relative-value and momentum bot for Polymarket BTC up/down markets")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the trading loop (default).
    Run {
        /// Simulate orders instead of sending them.
        #[arg(long)]
        dry_run: bool,

        /// HTTP server port for health/status/metrics (0 disables).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Resolve the current 15-minute and 1-hour markets and print their quotes.
    ResolveMarkets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config, args.verbose)?;

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(config),
        Some(Command::ResolveMarkets) => cmd_resolve_markets(config).await,
        Some(Command::Run { dry_run, port }) => cmd_run(config, dry_run, port).await,
        None => cmd_run(config, false, None).await,
    }
}

/// Stdout plus an append-only log file, filtered by `RUST_LOG`.
fn init_logging(config: &Config, verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("polymarket_rv=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.rust_log))
    };

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("Failed to open log file {}", config.log_file))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Arc::new(log_file)),
        )
        .init();

    Ok(())
}

/// Check configuration validity.
fn cmd_check_config(config: Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("BTC UP/DOWN RV BOT - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    let creds = config.credentials()?;
    let address = address_from_private_key(&creds.private_key)?;

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Signer Address: {}", address);
    println!("  Funder Address: {}", config.funder_display());
    println!("  Signature Type: {}", config.signature_type());
    println!("  Momentum: {} shares @ {} in last {} min", config.shares_to_buy, config.buy_price, config.buy_in_last_minutes);
    println!(
        "  RV: open {} / close {}, {} shares per leg, cooldown {}s",
        config.rv_open_threshold,
        config.rv_close_threshold,
        config.rv_leg_size,
        config.rv_cooldown_seconds
    );
    println!("  Poll Interval: {}s", config.check_interval_seconds);
    println!("  Dry Run: {}", config.dry_run);
    println!("  Log File: {}", config.log_file);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Resolve both current markets and print their quotes.
async fn cmd_resolve_markets(config: Config) -> anyhow::Result<()> {
    let client = PolymarketClient::new(&config)?;
    let locator = MarketLocator::new(client.clone());
    let quotes = QuoteService::new(client);
    let now = Utc::now();

    for cadence in [Cadence::FifteenMinute, Cadence::OneHour] {
        println!("----------------------------------------------------------------------");
        match locator.resolve(cadence, now).await? {
            Some(market) => {
                let yes = quotes.get_quote(&market.yes_token_id).await;
                let no = quotes.get_quote(&market.no_token_id).await;
                println!("[{}] {}", cadence, market.slug);
                println!("  Question: {}", market.question);
                println!(
                    "  Time remaining: {}s",
                    market.seconds_remaining(now.timestamp()).unwrap_or(0)
                );
                println!("  YES {}: bid {} ask {} mid {}", market.yes_token_id, yes.bid, yes.ask, yes.mid);
                println!("  NO  {}: bid {} ask {} mid {}", market.no_token_id, no.bid, no.ask, no.mid);
            }
            None => println!("[{}] no active market", cadence),
        }
    }

    Ok(())
}

/// Run the trading loop until Ctrl-C / SIGTERM.
async fn cmd_run(mut config: Config, dry_run: bool, port: Option<u16>) -> anyhow::Result<()> {
    if dry_run {
        config.dry_run = true;
    }
    if let Some(port) = port {
        config.port = port;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    let client = PolymarketClient::new(&config).context("Failed to create Polymarket client")?;

    let mut app_state = AppState::new();
    match metrics::install_recorder() {
        Ok(handle) => app_state = app_state.with_metrics(handle),
        Err(e) => warn!("{}", e),
    }
    metrics::init_metrics();

    info!("========================================");
    info!("BTC UP/DOWN RV BOT STARTED");
    info!("========================================");
    info!("Mode: {}", if config.dry_run { "DRY RUN" } else { "LIVE TRADING" });
    info!("Funder: {}", config.funder_display());
    info!(
        "RV: open {} / close {} / cooldown {}s / {} shares",
        config.rv_open_threshold,
        config.rv_close_threshold,
        config.rv_cooldown_seconds,
        config.rv_leg_size
    );
    info!(
        "Momentum: last {} min / {} shares @ {}",
        config.buy_in_last_minutes, config.shares_to_buy, config.buy_price
    );
    info!("========================================");

    let shutdown = spawn_shutdown_listener();

    if config.port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await?;
        info!("HTTP server listening on {}", addr);

        let router = create_router(app_state.clone());
        let server_shutdown = shutdown_requested(shutdown.clone());
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(server_shutdown)
                .await
            {
                error!("HTTP server error: {}", e);
            }
        });
    }

    if config.dry_run {
        run_loop(&config, client, SimulatedGateway::new(), app_state, shutdown).await;
    } else {
        let gateway = LiveGateway::new(client.clone());
        run_loop(&config, client, gateway, app_state, shutdown).await;
    }

    info!("Bot stopped");
    Ok(())
}

async fn run_loop<G: OrderGateway>(
    config: &Config,
    client: PolymarketClient,
    gateway: G,
    app_state: AppState,
    shutdown: watch::Receiver<bool>,
) {
    let mut runner = Runner::new(config, client.clone(), client, gateway).with_status(app_state);
    runner.run(shutdown_requested(shutdown)).await;
}
