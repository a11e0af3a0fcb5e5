//! Realized volatility and the volatility-targeting exposure overlay.

use super::rolling::rolling_std;

/// Trailing annualized volatility: rolling sample std × √`annualization`.
pub fn annualized_volatility(returns: &[f64], window: usize, annualization: f64) -> Vec<f64> {
    let factor = annualization.sqrt();
    rolling_std(returns, window)
        .into_iter()
        .map(|s| s * factor)
        .collect()
}

/// Fraction of full notional implied by `target / vol`, clipped to `[0, 1]`.
///
/// Zero, negative, or undefined volatility yields 0 exposure, never infinity.
pub fn vol_scale(volatility: &[f64], target: f64) -> Vec<f64> {
    volatility
        .iter()
        .map(|&vol| {
            let ratio = target / vol;
            if ratio.is_finite() {
                ratio.clamp(0.0, 1.0)
            } else {
                0.0
            }
        })
        .collect()
}
