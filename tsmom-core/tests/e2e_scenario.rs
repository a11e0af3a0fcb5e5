//! End-to-end scenario: a 500-bar series that trends up then reverses.
//!
//! The first 250 bars carry a log return of +0.001, the rest -0.001. A short
//! lookback catches the reversal quickly, so the selected windows should sit
//! well below the trend length and the full-exposure robust curve should beat
//! buy-and-hold, which ends roughly flat.

use chrono::NaiveDate;
use tsmom_core::domain::CurveKind;
use tsmom_core::scan::{scan_windows, select_windows, ScanConfig};
use tsmom_core::{analyze, AnalysisConfig, PriceSeries};

fn trend_reversal() -> PriceSeries {
    let base = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let mut price = 100.0;
    let points = (0..500).map(|i| {
        if i > 0 {
            let step: f64 = if i <= 250 { 0.001 } else { -0.001 };
            price *= step.exp();
        }
        (base + chrono::Duration::days(i as i64), price)
    });
    PriceSeries::from_points("SCENARIO", points.collect::<Vec<_>>()).unwrap()
}

#[test]
fn selects_short_windows_on_reversal() {
    let prices = trend_reversal();
    let windows = select_windows(&prices.log_returns(), &ScanConfig::default());
    assert!(windows.peak < 250, "peak = {}", windows.peak);
    assert!(windows.robust < 250, "robust = {}", windows.robust);
}

#[test]
fn turbo_robust_beats_hold_and_curves_stay_positive() {
    let prices = trend_reversal();
    let result = analyze(&prices, &AnalysisConfig::default());

    assert!(result.turbo_robust.final_value() > result.hold.final_value());
    for curve in result.curves() {
        assert_eq!(curve.len(), 499, "{}", curve.kind);
        assert!(curve.values.iter().all(|&v| v > 0.0), "{}", curve.kind);
    }
    assert_eq!(result.curve(CurveKind::Hold).kind, CurveKind::Hold);
    // Still in the downtrend at the end: short unless clipped.
    assert_eq!(result.current_position, -1.0);
    assert!(!result.long_only);
}

#[test]
fn hold_curve_is_exp_of_cumulative_returns() {
    let prices = trend_reversal();
    let result = analyze(&prices, &AnalysisConfig::default());
    let expected: Vec<f64> = prices
        .log_returns()
        .cumulative()
        .into_iter()
        .map(f64::exp)
        .collect();
    assert_eq!(result.hold.values, expected);
    assert_eq!(result.hold.dates, prices.dates()[1..].to_vec());
}

#[test]
fn current_vol_is_near_zero_for_constant_moves() {
    let prices = trend_reversal();
    let result = analyze(&prices, &AnalysisConfig::default());
    // Last 60 returns are all -0.001 up to rounding.
    let vol = result.current_vol.unwrap();
    assert!(vol.abs() < 1e-9, "vol = {vol}");
}

#[test]
fn peak_is_best_scoring_window() {
    let prices = trend_reversal();
    let config = ScanConfig::default();
    let map = scan_windows(&prices.log_returns(), &config);
    assert_eq!(map.len(), 245);
    let windows = select_windows(&prices.log_returns(), &config);
    let best = map.iter().map(|(_, s)| s).fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(map.get(windows.peak), Some(best));
}
