//! Sign-of-momentum signal with a one-period decision lag.

use super::rolling::rolling_sum;

/// Direction of a value: -1, 0 or +1. `NaN` maps to 0 (flat).
pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Shift forward by one period; the first slot takes `fill`.
///
/// Output `t` is input `t - 1`, i.e. what was known at yesterday's close.
pub fn lag(values: &[f64], fill: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    std::iter::once(fill)
        .chain(values[..values.len() - 1].iter().copied())
        .collect()
}

/// Position held on each bar by the sign-momentum rule with lookback `window`.
///
/// `signal[t] = sign(sum(returns[t - window..t]))`: the trailing sum through
/// `t - 1`, so the return of bar `t` never feeds its own position. Bars without
/// a full window are flat.
pub fn momentum_signal(returns: &[f64], window: usize) -> Vec<f64> {
    let momentum = rolling_sum(returns, window);
    let direction: Vec<f64> = momentum.into_iter().map(sign).collect();
    lag(&direction, 0.0)
}
