//! Confluence CLI — scan, level inspection, and config commands.
//!
//! Commands:
//! - `scan` — load CSV frames, analyze, run the signal pipeline, notify on stdout
//! - `levels` — print swing count and Fibonacci levels for one CSV file
//! - `config` — print the effective configuration and its id

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use confluence_core::analysis::Analyzer;
use confluence_core::config::ScannerConfig;
use confluence_core::data::{load_csv, load_frames};
use confluence_core::notify::{price_precision, Format, Notifier};
use confluence_core::pipeline::{Outcome, SignalPipeline};
use confluence_core::swing::{detect_swings, fibonacci_for, FibSetup};

#[derive(Parser)]
#[command(
    name = "confluence",
    about = "Confluence — multi-timeframe trading signal scanner"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a symbol on every interval and print accepted signals.
    Scan {
        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding `{symbol}_{timeframe}.csv` files.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Symbol to scan. Defaults to `operation.default_symbol`.
        #[arg(long)]
        symbol: Option<String>,

        /// Current price. Defaults to the latest entry-timeframe close.
        #[arg(long)]
        price: Option<f64>,

        /// Run a single tick and exit.
        #[arg(long, default_value_t = false)]
        once: bool,

        /// Print signals as JSON lines instead of Markdown.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print swing points and Fibonacci levels for one OHLCV CSV file.
    Levels {
        /// Path to the CSV file.
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print the effective configuration as TOML with its config id.
    Config {
        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            config,
            data_dir,
            symbol,
            price,
            once,
            json,
        } => run_scan(config.as_deref(), &data_dir, symbol, price, once, json),
        Commands::Levels { csv } => run_levels(&csv),
        Commands::Config { config } => run_config(config.as_deref()),
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ScannerConfig> {
    match path {
        Some(p) => ScannerConfig::load(p)
            .with_context(|| format!("loading config from {}", p.display())),
        None => Ok(ScannerConfig::default()),
    }
}

fn run_scan(
    config_path: Option<&Path>,
    data_dir: &Path,
    symbol: Option<String>,
    price: Option<f64>,
    once: bool,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    if let Some(p) = price {
        if !p.is_finite() || p <= 0.0 {
            bail!("--price must be a positive number, got {p}");
        }
    }
    let symbol = symbol.unwrap_or_else(|| config.operation.default_symbol.clone());
    let analyzer = Analyzer::new(config.indicators.clone());
    let pipeline = SignalPipeline::from_config(&config)?;
    let format = if json { Format::Json } else { Format::Markdown };
    let mut notifier = Notifier::from_config(io::stdout(), &config, format);
    let interval = Duration::from_secs(config.operation.run_interval_minutes * 60);

    tracing::info!(
        config_id = %config.config_id(),
        %symbol,
        timeframes = %config.timeframes.summary(),
        "scanner started"
    );

    loop {
        tracing::info!(%symbol, "starting analysis cycle");
        let tick = scan_once(&config, &analyzer, &pipeline, &mut notifier, data_dir, &symbol, price);
        match tick {
            Ok(Outcome::Accepted(_)) => {}
            Ok(Outcome::NoSignal(gate)) => tracing::info!(%gate, "no valid signal this cycle"),
            Err(e) if once => return Err(e),
            Err(e) => tracing::error!(error = %format!("{e:#}"), "analysis cycle failed"),
        }
        if once {
            return Ok(());
        }
        tracing::info!(minutes = config.operation.run_interval_minutes, "cycle finished, sleeping");
        std::thread::sleep(interval);
    }
}

fn scan_once<W: Write>(
    config: &ScannerConfig,
    analyzer: &Analyzer,
    pipeline: &SignalPipeline,
    notifier: &mut Notifier<W>,
    data_dir: &Path,
    symbol: &str,
    price: Option<f64>,
) -> Result<Outcome> {
    let frames = load_frames(data_dir, symbol, &config.timeframes)
        .with_context(|| format!("loading frames for {symbol}"))?;
    let current_price = match price {
        Some(p) => p,
        None => match frames.entry.last() {
            Some(c) => c.close,
            None => bail!("entry series for {symbol} is empty"),
        },
    };

    let snapshot = analyzer
        .analyze(symbol, frames, current_price)
        .with_context(|| format!("analyzing {symbol}"))?;
    let now = Utc::now();
    let outcome = pipeline.run_at(&snapshot, now);
    if let Outcome::Accepted(signal) = &outcome {
        notifier
            .notify(signal, now)
            .context("writing signal notification")?;
    }
    Ok(outcome)
}

fn run_levels(path: &Path) -> Result<()> {
    let candles = load_csv(path).with_context(|| format!("reading {}", path.display()))?;
    let swings = detect_swings(&candles);
    let highs = swings.iter().filter(|s| s.high.is_some()).count();
    let lows = swings.iter().filter(|s| s.low.is_some()).count();

    println!("Candles: {}", candles.len());
    println!("Swing highs: {highs}");
    println!("Swing lows: {lows}");

    match fibonacci_for(&candles) {
        FibSetup::Insufficient => println!("Fibonacci: insufficient swings"),
        FibSetup::Ready(fib) => {
            let p = price_precision(fib.high);
            println!("Trend: {:?}", fib.trend);
            println!("High: {:.p$}", fib.high);
            println!("Low: {:.p$}", fib.low);
            for (ratio, price) in fib.retracements() {
                println!("Retracement {ratio:.3}: {price:.p$}");
            }
            for (ratio, price) in fib.extensions() {
                println!("Extension {ratio:.3}: {price:.p$}");
            }
        }
    }
    Ok(())
}

fn run_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    let text = config.to_toml_string().context("serializing config")?;
    println!("# config_id = {}", config.config_id());
    print!("{text}");
    Ok(())
}
