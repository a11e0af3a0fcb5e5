//! Price sources and the errors they report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::download::DownloadSummary;

/// One daily row from a provider. Missing values are `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    pub date: NaiveDate,
    pub close: f64,
    pub adj_close: f64,
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("no price history for '{symbol}'")]
    SymbolNotFound { symbol: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("provider is throttling requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("provider rejected the request with HTTP {status}")]
    Rejected { status: u16 },

    #[error("unexpected provider response: {0}")]
    MalformedResponse(String),

    #[error("provider is blocked for now (circuit breaker open)")]
    CircuitBreakerTripped,

    #[error("price store: {0}")]
    CacheError(String),

    #[error("invalid price data: {0}")]
    ValidationError(String),

    #[error("parquet: {0}")]
    ParquetError(String),

    #[error("'{symbol}' is not in the price store; run `tsmom download {symbol}`")]
    NoStoredData { symbol: String },

    #[error("stored history for '{symbol}' has gaps and must be fetched again")]
    IncompleteStore { symbol: String },

    #[error("{0}")]
    Other(String),
}

impl DataError {
    /// Worth another attempt against the same provider.
    pub fn is_transient(&self) -> bool {
        match self {
            DataError::Network(_) | DataError::RateLimited { .. } => true,
            DataError::Rejected { status } => *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub quotes: Vec<RawQuote>,
    pub source: DataSource,
}

/// Where a loaded series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    ParquetStore,
    MemoryCache,
    Synthetic,
}

/// Remote daily price history. Storage layers wrap providers, never the
/// other way round.
pub trait DataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Quotes for `symbol` between `start` and `end`, both inclusive.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;

    /// False while the provider is refusing requests.
    fn is_available(&self) -> bool;
}

/// Hooks for a batch download.
pub trait DownloadProgress: Send {
    fn started(&self, symbol: &str, position: usize, total: usize);

    fn finished(&self, symbol: &str, outcome: &Result<(), DataError>);

    fn batch_finished(&self, summary: &DownloadSummary);
}

/// Prints one line per symbol to the terminal.
pub struct ConsoleProgress;

impl DownloadProgress for ConsoleProgress {
    fn started(&self, symbol: &str, position: usize, total: usize) {
        print!("({}/{total}) {symbol:<12}", position + 1);
    }

    fn finished(&self, _symbol: &str, outcome: &Result<(), DataError>) {
        match outcome {
            Ok(()) => println!("done"),
            Err(e) => println!("failed: {e}"),
        }
    }

    fn batch_finished(&self, summary: &DownloadSummary) {
        println!(
            "{} of {} symbols stored, {} failed",
            summary.succeeded, summary.total, summary.failed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(DataError::Network("reset".into()).is_transient());
        assert!(DataError::Rejected { status: 502 }.is_transient());
        assert!(!DataError::Rejected { status: 401 }.is_transient());
        assert!(!DataError::CircuitBreakerTripped.is_transient());
        assert!(!DataError::SymbolNotFound { symbol: "X".into() }.is_transient());
    }

    #[test]
    fn missing_store_entry_suggests_download() {
        let msg = DataError::NoStoredData { symbol: "SPY".into() }.to_string();
        assert!(msg.contains("tsmom download SPY"));
    }
}
