//! Multi-symbol download into the Parquet store.

use super::canonicalize::canonicalize_quotes;
use super::provider::{DataError, DataProvider, DownloadProgress};
use super::store::{CoverageResult, ParquetPriceStore};
use chrono::NaiveDate;
use tracing::info;

/// Fetch each symbol, check it canonicalizes, and store the raw quotes.
///
/// Symbols already covered by the store are skipped unless `force` is set.
/// Once the provider stops accepting requests the remaining symbols are
/// marked failed without being attempted.
pub fn download_symbols(
    provider: &dyn DataProvider,
    store: &ParquetPriceStore,
    symbols: &[&str],
    start: NaiveDate,
    end: NaiveDate,
    force: bool,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let mut summary = DownloadSummary::new(symbols.len());
    let mut remaining = symbols.iter().enumerate();

    for (position, &symbol) in remaining.by_ref() {
        progress.started(symbol, position, summary.total);

        let covered =
            !force && store.covers_range(symbol, start, end) == CoverageResult::FullyCovered;
        let outcome = if covered {
            Ok(())
        } else {
            download_single(provider, store, symbol, start, end)
        };
        progress.finished(symbol, &outcome);
        summary.record(symbol, outcome);

        if !covered && !provider.is_available() {
            break;
        }
    }

    // provider went away mid-batch
    for (_, &symbol) in remaining {
        summary.record(symbol, Err(DataError::CircuitBreakerTripped));
    }

    progress.batch_finished(&summary);
    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "download batch finished"
    );
    summary
}

fn download_single(
    provider: &dyn DataProvider,
    store: &ParquetPriceStore,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), DataError> {
    let fetched = provider.fetch(symbol, start, end)?;
    canonicalize_quotes(symbol, fetched.quotes.clone())?;
    store.write(symbol, &fetched.quotes, provider.name())
}

/// Outcome of a batch download.
#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    fn new(total: usize) -> Self {
        Self {
            total,
            succeeded: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    fn record(&mut self, symbol: &str, outcome: Result<(), DataError>) {
        match outcome {
            Ok(()) => self.succeeded += 1,
            Err(e) => {
                self.failed += 1;
                self.errors.push((symbol.to_string(), e));
            }
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
