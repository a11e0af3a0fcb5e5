//! TSMOM Core: domain types, indicators, window scan, signal simulator, data layer.
//!
//! This crate holds everything that turns a daily price history into the
//! five strategy curves:
//! - Domain types (price and return series, equity curves)
//! - Rolling indicators (sums, sample std, sign momentum, vol targeting)
//! - Lookback window scan with peak and neighborhood-robust selection
//! - Signal simulator with an injectable long-only policy
//! - Price providers, canonicalization and the Parquet price store

pub mod config;
pub mod data;
pub mod domain;
pub mod fingerprint;
pub mod indicators;
pub mod policy;
pub mod scan;
pub mod simulate;

pub use config::{AnalysisConfig, InvalidConfig};
pub use domain::{CurveKind, EquityCurve, PriceSeries, ReturnSeries};
pub use policy::{LongOnlyPolicy, SymbolTokenPolicy};
pub use scan::{PerformanceMap, ScanConfig, SelectedWindows};
pub use simulate::{AnalysisResult, SimulationConfig, Simulator};

/// Scan, select and simulate one price series with `config`.
pub fn analyze(prices: &PriceSeries, config: &AnalysisConfig) -> AnalysisResult {
    let windows = scan::select_windows(&prices.log_returns(), &config.scan);
    config.simulator().simulate(prices, windows)
}
