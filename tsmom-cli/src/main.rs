//! TSMOM CLI: analyze, scan, download and cache management commands.
//!
//! Commands:
//! - `analyze`: pick lookback windows, simulate the five curves, print a recommendation
//! - `scan`: show the best-scoring lookback windows for an instrument
//! - `download`: fetch daily prices from Yahoo Finance into the Parquet store
//! - `cache status`: report stored symbols, date ranges and sizes
//! - `cache clean`: remove symbols not refreshed recently
//!
//! Logging goes to stderr through `tracing`; set `RUST_LOG` to change the level.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tsmom_core::data::{
    download_symbols, CircuitBreaker, ConsoleProgress, DataProvider, ParquetPriceStore,
    YahooProvider,
};
use tsmom_core::scan::select_from_map;
use tsmom_runner::config::{MAX_YEARS, MIN_YEARS};
use tsmom_runner::data_loader::normalize_symbol;
use tsmom_runner::{
    analyze_symbol, load_prices, par_scan_windows, save_artifacts, DisplayProfile, LoadOptions,
    PriceCache, TextRenderer, TsmomConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tsmom",
    about = "TSMOM Lab: time-series momentum window scan and signal simulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the commands that load prices.
#[derive(clap::Args)]
struct LoadArgs {
    /// Lookback horizon in years (1-20). Defaults to the config value.
    #[arg(long, value_parser = clap::value_parser!(u32).range(MIN_YEARS as i64..=MAX_YEARS as i64))]
    years: Option<u32>,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Offline mode: no network access.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Use synthetic data as fallback.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Price store directory. Defaults to the config value (./data).
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an instrument and print the five-curve summary.
    Analyze {
        /// Yahoo Finance symbol (e.g. SPY, 2330.TW, ^GSPC). Defaults to the config instrument.
        symbol: Option<String>,

        #[command(flatten)]
        load: LoadArgs,

        /// Give a directional call even when the strategy trails buy and hold.
        #[arg(long, default_value_t = false)]
        no_gate: bool,

        /// Display profile: full or compact.
        #[arg(long)]
        profile: Option<String>,

        /// Write curves.csv and manifest.json under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Show the top-scoring lookback windows.
    Scan {
        /// Yahoo Finance symbol. Defaults to the config instrument.
        symbol: Option<String>,

        #[command(flatten)]
        load: LoadArgs,

        /// Number of windows to list.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Download daily prices from Yahoo Finance into the price store.
    Download {
        /// Symbols to download (e.g., SPY QQQ 2330.TW).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Years of history to fetch.
        #[arg(long, default_value_t = MAX_YEARS,
              value_parser = clap::value_parser!(u32).range(MIN_YEARS as i64..=MAX_YEARS as i64))]
        years: u32,

        /// Force re-download even if stored.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Price store directory.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Price store management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report stored symbols, date ranges and sizes.
    Status {
        /// Price store directory.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Remove symbols not refreshed within the given number of days.
    Clean {
        /// Remove symbols last fetched more than this many days ago.
        #[arg(long, default_value_t = 30)]
        unused_days: u64,

        /// Price store directory.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Actually delete (without this flag, only previews what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            symbol,
            load,
            no_gate,
            profile,
            output_dir,
        } => run_analyze(symbol, load, no_gate, profile, output_dir),
        Commands::Scan { symbol, load, top } => run_scan(symbol, load, top),
        Commands::Download {
            symbols,
            years,
            force,
            cache_dir,
        } => run_download(symbols, years, force, cache_dir),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => run_cache_status(&cache_dir),
            CacheAction::Clean {
                unused_days,
                cache_dir,
                confirm,
            } => run_cache_clean(&cache_dir, unused_days, confirm),
        },
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn resolve_config(load: &LoadArgs) -> Result<TsmomConfig> {
    let mut config = match &load.config {
        Some(path) => TsmomConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TsmomConfig::default(),
    };
    if let Some(years) = load.years {
        config.years = years;
    }
    if let Some(dir) = &load.cache_dir {
        config.data.cache_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn resolve_symbol(symbol: Option<String>, config: &TsmomConfig) -> Result<String> {
    match symbol.or_else(|| config.instrument.clone()) {
        Some(s) if !s.trim().is_empty() => Ok(normalize_symbol(&s)),
        _ => bail!("no symbol given and no instrument in the config"),
    }
}

fn load_options(config: &TsmomConfig, load: &LoadArgs) -> LoadOptions {
    let mut opts = LoadOptions::new(config.years, chrono::Local::now().date_naive());
    opts.offline = load.offline;
    opts.synthetic = load.synthetic;
    opts.max_age = config
        .data
        .max_cache_age_hours
        .map(|h| chrono::Duration::hours(h as i64));
    opts
}

/// Yahoo provider unless offline.
fn make_provider(offline: bool) -> Result<Option<YahooProvider>> {
    if offline {
        return Ok(None);
    }
    let circuit_breaker = Arc::new(CircuitBreaker::for_yahoo());
    Ok(Some(YahooProvider::new(circuit_breaker)?))
}

fn run_analyze(
    symbol: Option<String>,
    load: LoadArgs,
    no_gate: bool,
    profile: Option<String>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let mut config = resolve_config(&load)?;
    if no_gate {
        config.report.gate_on_benchmark = false;
    }
    if let Some(name) = profile {
        config.report.profile = match DisplayProfile::named(&name) {
            Some(p) => p,
            None => bail!("unknown profile '{name}' (expected full or compact)"),
        };
        // The profile's horizon applies unless given explicitly.
        if load.years.is_none() {
            config.years = config.report.profile.default_years;
        }
    }
    let symbol = resolve_symbol(symbol, &config)?;

    let store = ParquetPriceStore::new(&config.data.cache_dir);
    let provider = make_provider(load.offline)?;
    let mut cache = PriceCache::with_max_age(
        config
            .data
            .max_cache_age_hours
            .map(|h| chrono::Duration::hours(h as i64)),
    );
    let opts = load_options(&config, &load);

    let run = analyze_symbol(
        &symbol,
        &config,
        &mut cache,
        Some(&store),
        provider.as_ref().map(|p| p as &dyn DataProvider),
        &opts,
    )?;

    let renderer = TextRenderer::new(&config.render, &config.report.profile);
    print!("{}", renderer.render(&run.report));

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(
            &run.report,
            &run.result,
            &config.render,
            &run.loaded.dataset_hash,
            &run.config_hash,
            &dir,
        )?;
        println!("\nArtifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn run_scan(symbol: Option<String>, load: LoadArgs, top: usize) -> Result<()> {
    let config = resolve_config(&load)?;
    let symbol = resolve_symbol(symbol, &config)?;

    let store = ParquetPriceStore::new(&config.data.cache_dir);
    let provider = make_provider(load.offline)?;
    let mut cache = PriceCache::new();
    let opts = load_options(&config, &load);

    let loaded = load_prices(
        &symbol,
        &mut cache,
        Some(&store),
        provider.as_ref().map(|p| p as &dyn DataProvider),
        &opts,
    )?;
    let scan = &config.analysis.scan;
    let map = par_scan_windows(&loaded.series.log_returns(), scan);
    let windows = select_from_map(&map, scan);

    println!(
        "{symbol}: {} bars, windows {}..={}",
        loaded.series.len(),
        scan.min_window,
        scan.max_window
    );
    println!();
    println!("{:>6} {:>12} {:>14}", "Window", "Score", "Neighborhood");
    println!("{}", "-".repeat(34));
    for (w, score) in map.top(top) {
        let neighborhood = map
            .neighborhood_mean(w, scan.neighborhood_half_width)
            .unwrap_or(f64::NAN);
        println!("{w:>6} {score:>12.4} {neighborhood:>14.4}");
    }
    println!();
    println!("Peak window:   {}", windows.peak);
    println!("Robust window: {}", windows.robust);

    Ok(())
}

fn run_download(symbols: Vec<String>, years: u32, force: bool, cache_dir: PathBuf) -> Result<()> {
    let end = chrono::Local::now().date_naive();
    let start = LoadOptions::new(years, end).start();

    let circuit_breaker = Arc::new(CircuitBreaker::for_yahoo());
    let provider = YahooProvider::new(circuit_breaker)?;
    let store = ParquetPriceStore::new(cache_dir);
    let progress = ConsoleProgress;

    let normalized: Vec<String> = symbols.iter().map(|s| normalize_symbol(s)).collect();
    let sym_refs: Vec<&str> = normalized.iter().map(|s| s.as_str()).collect();

    let summary = download_symbols(&provider, &store, &sym_refs, start, end, force, &progress);

    if summary.all_succeeded() {
        return Ok(());
    }
    let failed: Vec<String> = summary
        .errors
        .iter()
        .map(|(symbol, err)| format!("{symbol} ({err})"))
        .collect();
    bail!(
        "{} of {} downloads failed: {}",
        summary.failed,
        summary.total,
        failed.join(", ")
    )
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    let store = ParquetPriceStore::new(cache_dir);
    let entries = store.list();
    if entries.is_empty() {
        println!("no stored prices under {}", cache_dir.display());
        return Ok(());
    }

    let rows: Vec<_> = entries
        .iter()
        .map(|m| (m, store.size_of(&m.symbol)))
        .collect();
    let total: u64 = rows.iter().map(|(_, size)| size).sum();
    println!(
        "{}: {} symbols, {}",
        cache_dir.display(),
        rows.len(),
        format_size(total)
    );
    println!(
        "\n{:<10} {:<10} {:<10} {:>7} {:<16} {:>9}",
        "SYMBOL", "FROM", "TO", "BARS", "FETCHED", "SIZE"
    );
    for (meta, size) in rows {
        println!(
            "{:<10} {:<10} {:<10} {:>7} {:<16} {:>9}",
            meta.symbol,
            meta.start_date,
            meta.end_date,
            meta.row_count,
            meta.cached_at.format("%Y-%m-%d %H:%M"),
            format_size(size)
        );
    }
    Ok(())
}

fn run_cache_clean(cache_dir: &Path, unused_days: u64, confirm: bool) -> Result<()> {
    let store = ParquetPriceStore::new(cache_dir);
    let cutoff = chrono::Local::now().naive_local() - chrono::Duration::days(unused_days as i64);
    let stale: Vec<_> = store
        .list()
        .into_iter()
        .filter(|m| m.cached_at < cutoff)
        .collect();

    if stale.is_empty() {
        println!("nothing fetched more than {unused_days} days ago");
        return Ok(());
    }

    for meta in &stale {
        println!(
            "{:<10} fetched {}  {}",
            meta.symbol,
            meta.cached_at.format("%Y-%m-%d"),
            format_size(store.size_of(&meta.symbol))
        );
    }
    if !confirm {
        println!("{} stale symbol(s); pass --confirm to delete them", stale.len());
        return Ok(());
    }

    for meta in &stale {
        store
            .remove(&meta.symbol)
            .with_context(|| format!("removing {}", meta.symbol))?;
    }
    println!("deleted {} symbol(s)", stale.len());
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
