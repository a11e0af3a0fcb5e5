//! Look-ahead contamination tests for signals and the volatility overlay.
//!
//! No position or scale applied at bar t may depend on the return of bar t or
//! later. Two methods:
//! - compute on a truncated series and on the full series; the shared prefix
//!   must be identical
//! - perturb return t; everything at or before t must be unchanged

use tsmom_core::indicators::momentum_signal;
use tsmom_core::scan::SelectedWindows;
use tsmom_core::{SimulationConfig, Simulator};

/// Deterministic pseudo-random returns from a simple LCG.
fn make_returns(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((seed >> 33) % 2001) as f64 / 1000.0 * 0.02 - 0.02
        })
        .collect()
}

fn assert_prefix_equal(name: &str, a: &[f64], b: &[f64], len: usize) {
    for i in 0..len {
        let (x, y) = (a[i], b[i]);
        assert!(
            x == y || (x.is_nan() && y.is_nan()),
            "{name}: bar {i} differs ({x} vs {y})"
        );
    }
}

#[test]
fn signal_prefix_is_stable_under_truncation() {
    let full = make_returns(300);
    for window in [1, 10, 60, 254] {
        let truncated = momentum_signal(&full[..150], window);
        let complete = momentum_signal(&full, window);
        assert_eq!(truncated.len(), 150);
        assert_prefix_equal(&format!("signal w={window}"), &truncated, &complete, 150);
    }
}

#[test]
fn perturbing_a_return_never_moves_its_own_signal() {
    let base = make_returns(200);
    for t in [0, 10, 11, 50, 199] {
        let mut shocked = base.clone();
        shocked[t] = 0.5;
        for window in [3, 10, 40] {
            let a = momentum_signal(&base, window);
            let b = momentum_signal(&shocked, window);
            assert_prefix_equal(&format!("t={t} w={window}"), &a, &b, t + 1);
        }
    }
}

#[test]
fn scale_and_signals_ignore_the_current_bar() {
    let sim = Simulator::new(SimulationConfig::default());
    let windows = SelectedWindows { peak: 20, robust: 45 };
    let base = make_returns(250);
    let t = 120;
    let mut shocked = base.clone();
    shocked[t] = -0.4;

    assert_prefix_equal("scale", &sim.lagged_scale(&base), &sim.lagged_scale(&shocked), t + 1);

    let a = sim.signals("SPY", &base, windows);
    let b = sim.signals("SPY", &shocked, windows);
    assert_prefix_equal("robust", &a.robust, &b.robust, t + 1);
    assert_prefix_equal("peak", &a.peak, &b.peak, t + 1);
    // The shock does reach the next bar's scale.
    assert_ne!(sim.lagged_scale(&base)[t + 1], sim.lagged_scale(&shocked)[t + 1]);
}
