//! Price loading for one instrument.
//!
//! Resolution order:
//! 1. In-memory [`PriceCache`] hit → use it (a not-found marker fails fast)
//! 2. Fresh Parquet store entry (or any entry when offline) → use it
//! 3. Provider available and online → fetch, canonicalize, write the store
//! 4. `synthetic` enabled → seeded random walk, tagged as synthetic
//! 5. Otherwise → fail with a clear error
//!
//! Synthetic data is a developer-only debug mode. Reports built on it are
//! tagged so they are never mistaken for real analysis.

use crate::cache::{CachedPrices, PriceCache};
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, info, warn};
use tsmom_core::data::{
    canonicalize_quotes, DataError, DataProvider, DataSource, ParquetPriceStore, StoreMeta,
};
use tsmom_core::domain::SeriesError;
use tsmom_core::fingerprint::dataset_hash;
use tsmom_core::PriceSeries;

/// Slack between the requested start and the first stored quote, so weekends
/// and holidays at the start of the range still count as covered.
const START_SLACK_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("instrument not found: {symbol} (use the provider's symbol format, e.g. 2330.TW, ^GSPC)")]
    InstrumentNotFound { symbol: String },

    #[error(
        "no cached data for '{symbol}' and no network access (use --synthetic for synthetic data)"
    )]
    NoCachedDataOffline { symbol: String },

    #[error("no cached data for '{symbol}' and download failed: {reason}")]
    DownloadFailed { symbol: String, reason: String },

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("invalid price series: {0}")]
    Series(#[from] SeriesError),
}

/// Options controlling how prices are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Lookback horizon in years, counted back from `end`.
    pub years: u32,
    /// Last date of the requested range.
    pub end: NaiveDate,
    /// If true, never make network requests.
    pub offline: bool,
    /// If true, generate synthetic prices when real data is unavailable.
    pub synthetic: bool,
    /// Skip both caches and refetch.
    pub force: bool,
    /// Store entries older than this are refetched; `None` means "fetched today".
    pub max_age: Option<Duration>,
}

impl LoadOptions {
    pub fn new(years: u32, end: NaiveDate) -> Self {
        Self {
            years,
            end,
            offline: false,
            synthetic: false,
            force: false,
            max_age: None,
        }
    }

    /// First date of the requested range.
    pub fn start(&self) -> NaiveDate {
        self.end
            .checked_sub_months(Months::new(12 * self.years))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// A loaded price series with provenance.
#[derive(Debug, Clone)]
pub struct LoadedPrices {
    pub series: PriceSeries,
    pub source: DataSource,
    /// BLAKE3 over dates and prices.
    pub dataset_hash: String,
}

impl LoadedPrices {
    fn new(series: PriceSeries, source: DataSource) -> Self {
        let dataset_hash = dataset_hash(&series);
        Self {
            series,
            source,
            dataset_hash,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Canonical form of a user-entered symbol.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Load daily prices for `symbol` over the configured horizon.
pub fn load_prices(
    symbol: &str,
    cache: &mut PriceCache,
    store: Option<&ParquetPriceStore>,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
) -> Result<LoadedPrices, LoadError> {
    let symbol = normalize_symbol(symbol);
    let start = opts.start();

    // Step 1: memory cache
    if !opts.force {
        match cache.get(&symbol, opts.years) {
            Some(CachedPrices::Found(series)) => {
                debug!(%symbol, years = opts.years, "memory cache hit");
                return Ok(LoadedPrices::new(series, DataSource::MemoryCache));
            }
            Some(CachedPrices::NotFound) => {
                debug!(%symbol, "cached not-found marker");
                return Err(LoadError::InstrumentNotFound { symbol });
            }
            None => {}
        }
    }

    // Step 2: Parquet store
    if let Some(store) = store {
        if !opts.force {
            if let Some(meta) = store.get_meta(&symbol) {
                if opts.offline || is_fresh(&meta, start, now(), opts.max_age) {
                    match load_from_store(store, &symbol, start) {
                        Ok(series) => {
                            debug!(%symbol, rows = series.len(), "store hit");
                            cache.insert(&symbol, opts.years, CachedPrices::Found(series.clone()));
                            return Ok(LoadedPrices::new(series, DataSource::ParquetStore));
                        }
                        Err(e) => warn!(%symbol, error = %e, "stored data unusable"),
                    }
                }
            }
        }
    }

    // Step 3: provider
    let mut failure: Option<DataError> = None;
    if !opts.offline {
        if let Some(provider) = provider.filter(|p| p.is_available()) {
            info!(%symbol, provider = provider.name(), %start, end = %opts.end, "fetching prices");
            match fetch_and_store(provider, store, &symbol, start, opts.end) {
                Ok(series) => {
                    cache.insert(&symbol, opts.years, CachedPrices::Found(series.clone()));
                    return Ok(LoadedPrices::new(series, DataSource::YahooFinance));
                }
                Err(DataError::SymbolNotFound { .. }) if !opts.synthetic => {
                    cache.insert(&symbol, opts.years, CachedPrices::NotFound);
                    return Err(LoadError::InstrumentNotFound { symbol });
                }
                Err(e) => {
                    warn!(%symbol, error = %e, "fetch failed");
                    failure = Some(e);
                }
            }
        }
    }

    // Step 4: synthetic
    if opts.synthetic {
        warn!(%symbol, "generating synthetic data; results will be tagged as synthetic");
        let series = generate_synthetic_series(&symbol, start, opts.end)?;
        return Ok(LoadedPrices::new(series, DataSource::Synthetic));
    }

    // Step 5: fail
    if opts.offline {
        return Err(LoadError::NoCachedDataOffline { symbol });
    }
    Err(LoadError::DownloadFailed {
        symbol,
        reason: failure.map_or_else(|| "no data provider available".into(), |e| e.to_string()),
    })
}

/// Store entry usable without refetching.
fn is_fresh(
    meta: &StoreMeta,
    start: NaiveDate,
    now: NaiveDateTime,
    max_age: Option<Duration>,
) -> bool {
    let recent = match max_age {
        Some(age) => now - meta.cached_at <= age,
        None => meta.cached_at.date() == now.date(),
    };
    recent && meta.start_date <= start + Duration::days(START_SLACK_DAYS)
}

fn load_from_store(
    store: &ParquetPriceStore,
    symbol: &str,
    start: NaiveDate,
) -> Result<PriceSeries, DataError> {
    let quotes = store.load(symbol)?;
    Ok(canonicalize_quotes(symbol, quotes)?.since(start))
}

fn fetch_and_store(
    provider: &dyn DataProvider,
    store: Option<&ParquetPriceStore>,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, DataError> {
    let fetched = provider.fetch(symbol, start, end)?;
    let series = canonicalize_quotes(symbol, fetched.quotes.clone())?;
    if let Some(store) = store {
        // A failed write only costs a refetch next time.
        if let Err(e) = store.write(symbol, &fetched.quotes, provider.name()) {
            warn!(%symbol, error = %e, "failed to write price store");
        }
    }
    Ok(series.since(start))
}

/// Seeded random walk over weekdays in `[start, end]`, starting at 100.
///
/// The seed is derived from the symbol, so the same symbol always produces
/// the same path.
pub fn generate_synthetic_series(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, SeriesError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut points = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;
    while current <= end {
        let weekday = current.weekday();
        if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
            price *= 1.0 + rng.gen_range(-0.02..0.02);
            points.push((current, price));
        }
        current += Duration::days(1);
    }

    PriceSeries::from_points(symbol, points)
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
