//! Parallel window scan.

use rayon::prelude::*;
use tsmom_core::scan::{window_score, PerformanceMap, ScanConfig};
use tsmom_core::ReturnSeries;

/// Score every configured window on the rayon pool.
///
/// Windows are independent, so the result is identical to
/// [`tsmom_core::scan::scan_windows`].
pub fn par_scan_windows(returns: &ReturnSeries, config: &ScanConfig) -> PerformanceMap {
    let values = returns.values();
    config
        .windows()
        .into_par_iter()
        .map(|w| (w, window_score(values, w)))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}
