//! Single-instrument analysis: load, scan, select, simulate, report.

use crate::cache::PriceCache;
use crate::config::{validate_years, ConfigError, TsmomConfig};
use crate::data_loader::{load_prices, LoadError, LoadOptions, LoadedPrices};
use crate::report::Report;
use crate::sweep::par_scan_windows;
use thiserror::Error;
use tracing::info;
use tsmom_core::data::{DataProvider, ParquetPriceStore};
use tsmom_core::fingerprint::config_hash;
use tsmom_core::scan::{select_from_map, PerformanceMap};
use tsmom_core::AnalysisResult;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Everything produced by one `analyze_symbol` call.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub loaded: LoadedPrices,
    pub performance: PerformanceMap,
    pub result: AnalysisResult,
    pub report: Report,
    /// BLAKE3 of the analysis config.
    pub config_hash: String,
}

/// Analyze one instrument end to end.
///
/// An unknown instrument fails the whole run; no partial result is returned.
pub fn analyze_symbol(
    symbol: &str,
    config: &TsmomConfig,
    cache: &mut PriceCache,
    store: Option<&ParquetPriceStore>,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
) -> Result<AnalysisRun, AnalyzeError> {
    config.analysis.validate().map_err(ConfigError::from)?;
    validate_years(opts.years)?;

    let loaded = load_prices(symbol, cache, store, provider, opts)?;
    let series = &loaded.series;
    let (Some(last_date), Some(last_price)) = (series.last_date(), series.last_price()) else {
        return Err(LoadError::InstrumentNotFound {
            symbol: series.symbol().to_string(),
        }
        .into());
    };

    let performance = par_scan_windows(&series.log_returns(), &config.analysis.scan);
    let windows = select_from_map(&performance, &config.analysis.scan);
    info!(
        symbol = series.symbol(),
        bars = series.len(),
        peak = windows.peak,
        robust = windows.robust,
        "selected lookback windows"
    );

    let result = config.analysis.simulator().simulate(series, windows);
    let report = Report::new(
        &result,
        last_date,
        last_price,
        &config.report,
        loaded.is_synthetic(),
    );

    Ok(AnalysisRun {
        config_hash: config_hash(&config.analysis),
        loaded,
        performance,
        result,
        report,
    })
}
