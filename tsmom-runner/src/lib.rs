//! TSMOM Runner: analysis orchestration on top of `tsmom-core`.
//!
//! This crate provides:
//! - Price loading with memory cache, Parquet store, download and synthetic fallback
//! - Parallel window scan
//! - Single-instrument analysis producing a report and recommendation
//! - Run configuration file (TOML)
//! - Curve styling, text rendering and artifact export

pub mod analyze;
pub mod cache;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod render;
pub mod report;
pub mod sweep;

pub use analyze::{analyze_symbol, AnalysisRun, AnalyzeError};
pub use cache::{CacheKey, CacheStats, CachedPrices, PriceCache};
pub use config::{ConfigError, DataConfig, TsmomConfig};
pub use data_loader::{load_prices, LoadError, LoadOptions, LoadedPrices};
pub use export::{load_manifest, save_artifacts, Manifest};
pub use render::{CurveStyle, LineStyle, RenderConfig, TextRenderer};
pub use report::{recommend, DisplayProfile, Recommendation, Report, ReportConfig};
pub use sweep::par_scan_windows;
