//! Bandwatch CLI: band/RSI monitor for one crypto pair.
//!
//! Commands:
//! - `watch`: poll the exchange, recompute indicators, dispatch alerts
//! - `snapshot`: fetch once and print the indicator snapshot and decisions
//! - `config`: print the effective configuration as TOML

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use bandwatch_core::alert::{AlertDispatcher, LogDispatcher, TwilioCredentials, TwilioDispatcher};
use bandwatch_core::config::{AlertConfig, MonitorConfig};
use bandwatch_core::data::{BinanceProvider, CircuitBreaker, MarketDataProvider};
use bandwatch_core::engine::{CycleReport, Monitor};

#[derive(Parser)]
#[command(
    name = "bandwatch",
    version,
    about = "Bandwatch: Bollinger/RSI alert monitor"
)]
struct Cli {
    /// Log level filter (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the polling loop and dispatch alerts.
    Watch {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured symbol (e.g., BTC/USDT).
        #[arg(long)]
        symbol: Option<String>,

        /// Print alerts instead of sending them.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Stop after this many cycles.
        #[arg(long)]
        max_cycles: Option<u64>,
    },
    /// Fetch once and print the snapshot, signal, trend and summary.
    Snapshot {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured symbol.
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Print the effective configuration as TOML.
    Config {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Watch {
            config,
            symbol,
            dry_run,
            max_cycles,
        } => run_watch(config.as_deref(), symbol, dry_run, max_cycles),
        Commands::Snapshot { config, symbol } => run_snapshot(config.as_deref(), symbol),
        Commands::Config { config } => run_config(config.as_deref()),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(filter)
        .init();
}

fn load_config(path: Option<&Path>, symbol: Option<String>) -> Result<MonitorConfig> {
    let mut config = match path {
        Some(path) => MonitorConfig::from_file(path)?,
        None => MonitorConfig::default(),
    };
    if let Some(symbol) = symbol {
        config.symbol = symbol;
        config.validate()?;
    }
    Ok(config)
}

fn build_dispatcher(config: &MonitorConfig, dry_run: bool) -> Result<Box<dyn AlertDispatcher>> {
    if dry_run {
        return Ok(Box::new(LogDispatcher));
    }
    match &config.alert {
        AlertConfig::Log => Ok(Box::new(LogDispatcher)),
        AlertConfig::Twilio { from, to } => {
            let credentials = TwilioCredentials::from_env()
                .context("twilio alerts need credentials in the environment")?;
            Ok(Box::new(TwilioDispatcher::new(
                credentials,
                from.clone(),
                to.clone(),
            )?))
        }
    }
}

fn build_provider() -> Result<BinanceProvider> {
    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    Ok(BinanceProvider::new(circuit_breaker)?)
}

fn run_watch(
    config_path: Option<&Path>,
    symbol: Option<String>,
    dry_run: bool,
    max_cycles: Option<u64>,
) -> Result<()> {
    let config = load_config(config_path, symbol)?;
    let dispatcher = build_dispatcher(&config, dry_run)?;
    let provider = build_provider()?;
    let mut monitor = Monitor::new(&config)?;

    info!(
        symbol = %config.symbol,
        interval = %config.interval,
        capacity = config.capacity,
        dispatcher = dispatcher.name(),
        "starting monitor"
    );

    let mut cycle: u64 = 0;
    loop {
        if max_cycles.is_some_and(|max| cycle >= max) {
            break;
        }
        cycle += 1;

        let now = Utc::now();
        let limit = monitor.bars_needed(now);
        match provider.fetch(&config.symbol, config.interval, limit) {
            Ok(fetched) => {
                monitor.ingest(fetched.bars);
            }
            Err(e) => warn!(error = %e, cycle, "fetch failed; evaluating the unchanged window"),
        }

        let report = monitor.evaluate(now);
        let outcome = Monitor::dispatch(&report, dispatcher.as_ref());
        debug!(cycle, sent = outcome.sent, failed = outcome.failed, "cycle complete");
        log_trend(&report);

        if max_cycles.is_some_and(|max| cycle >= max) {
            break;
        }
        std::thread::sleep(config.poll_interval());
    }

    Ok(())
}

fn run_snapshot(config_path: Option<&Path>, symbol: Option<String>) -> Result<()> {
    let config = load_config(config_path, symbol)?;
    let provider = build_provider()?;
    let mut monitor = Monitor::new(&config)?;

    let fetched = provider
        .fetch(&config.symbol, config.interval, config.capacity)
        .with_context(|| format!("failed to fetch bars for {}", config.symbol))?;
    let (ingest, report) = monitor.run_cycle(fetched.bars, Utc::now());

    println!("Symbol: {}", report.symbol);
    println!("Bars: {} ({} rejected)", monitor.window().len(), ingest.rejected);
    if let Some(opened) = report.latest_bar.and_then(|b| b.open_time()) {
        println!("Latest bar: {opened}");
    }
    println!("Snapshot: {}", serde_json::to_string_pretty(&report.snapshot)?);
    println!("Signal: {}", report.signal);
    match report.trend {
        Some(trend) => println!("Trend: {trend}"),
        None => println!("Trend: n/a"),
    }
    if let Some(summary) = &report.summary {
        println!();
        println!("{}", summary.render());
    }

    Ok(())
}

fn run_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path, None)?;
    print!("{}", config.to_toml()?);
    Ok(())
}

fn log_trend(report: &CycleReport) {
    match report.trend {
        Some(trend) => info!(
            symbol = %report.symbol,
            %trend,
            close = ?report.latest_close(),
            "trend"
        ),
        None => debug!(symbol = %report.symbol, "trend: not enough closes"),
    }
}
