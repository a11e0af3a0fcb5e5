//! Price history retrieval, canonicalization and on-disk storage.

pub mod canonicalize;
pub mod circuit_breaker;
pub mod download;
pub mod provider;
pub mod store;
pub mod yahoo;

pub use canonicalize::canonicalize_quotes;
pub use circuit_breaker::CircuitBreaker;
pub use download::{download_symbols, DownloadSummary};
pub use provider::{
    ConsoleProgress, DataError, DataProvider, DataSource, DownloadProgress, FetchResult, RawQuote,
};
pub use store::{CoverageResult, ParquetPriceStore, StoreMeta};
pub use yahoo::YahooProvider;
