//! Rolling-window transforms over return series.
//!
//! Every function maps a slice to a vector of the same length. Entries without
//! enough history are `NaN`; callers resolve `NaN` explicitly (signals treat it
//! as flat, the volatility overlay as zero exposure).
//!
//! No output at index `t` depends on inputs after `t`, except where a function
//! documents a one-period lag, which only looks further back.

pub mod momentum;
pub mod rolling;
pub mod volatility;

pub use momentum::{lag, momentum_signal, sign};
pub use rolling::{rolling_std, rolling_sum};
pub use volatility::{annualized_volatility, vol_scale};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
