//! Signal simulator: five equity curves from one price series.
//!
//! Given the peak and robust lookbacks, the simulator builds both momentum
//! signals, applies the long-only override, derives the lagged volatility
//! overlay, and compounds five strategy return streams:
//!
//! | curve          | per-bar log return                    |
//! |----------------|---------------------------------------|
//! | `safe_robust`  | `sig_robust × lagged_scale × r`       |
//! | `turbo_robust` | `sig_robust × r`                      |
//! | `safe_peak`    | `sig_peak × lagged_scale × r`         |
//! | `turbo_peak`   | `sig_peak × r`                        |
//! | `hold`         | `r`                                   |
//!
//! Signals and the scale both use information through the previous bar only.

use crate::domain::{CurveKind, EquityCurve, PriceSeries};
use crate::indicators::{annualized_volatility, lag, momentum_signal, vol_scale};
use crate::policy::LongOnlyPolicy;
use crate::scan::SelectedWindows;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Volatility-targeting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Bars in the trailing volatility estimate.
    pub vol_window: usize,
    /// Target annualized volatility.
    pub target_vol: f64,
    /// Periods per year.
    pub annualization: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            vol_window: 60,
            target_vol: 0.40,
            annualization: 252.0,
        }
    }
}

/// Everything one analysis produces for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub symbol: String,
    pub windows: SelectedWindows,
    pub safe_robust: EquityCurve,
    pub turbo_robust: EquityCurve,
    pub safe_peak: EquityCurve,
    pub turbo_peak: EquityCurve,
    pub hold: EquityCurve,
    /// Latest trailing annualized volatility; `None` before the window fills.
    pub current_vol: Option<f64>,
    /// Latest raw robust position (-1, 0 or +1), before any scaling.
    pub current_position: f64,
    /// Whether the long-only override clipped short signals.
    pub long_only: bool,
}

impl AnalysisResult {
    pub fn curve(&self, kind: CurveKind) -> &EquityCurve {
        match kind {
            CurveKind::SafeRobust => &self.safe_robust,
            CurveKind::TurboRobust => &self.turbo_robust,
            CurveKind::SafePeak => &self.safe_peak,
            CurveKind::TurboPeak => &self.turbo_peak,
            CurveKind::Hold => &self.hold,
        }
    }

    /// All five curves in [`CurveKind::ALL`] order.
    pub fn curves(&self) -> [&EquityCurve; 5] {
        CurveKind::ALL.map(|k| self.curve(k))
    }
}

/// Position schedules for both selected windows.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalPair {
    pub robust: Vec<f64>,
    pub peak: Vec<f64>,
}

/// Turns selected windows and a price series into an [`AnalysisResult`].
#[derive(Clone, Default)]
pub struct Simulator {
    config: SimulationConfig,
    policy: Option<Arc<dyn LongOnlyPolicy>>,
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("config", &self.config)
            .field("policy", &self.policy.is_some())
            .finish()
    }
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            policy: None,
        }
    }

    /// Install the long-only policy. Without one, shorts are never clipped.
    pub fn with_policy(mut self, policy: Option<Arc<dyn LongOnlyPolicy>>) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn is_long_only(&self, symbol: &str) -> bool {
        self.policy
            .as_ref()
            .is_some_and(|p| p.is_long_only(symbol))
    }

    /// Lagged momentum signals for both windows, with the override applied.
    pub fn signals(&self, symbol: &str, returns: &[f64], windows: SelectedWindows) -> SignalPair {
        let mut robust = momentum_signal(returns, windows.robust);
        let mut peak = momentum_signal(returns, windows.peak);
        if self.is_long_only(symbol) {
            for s in robust.iter_mut().chain(peak.iter_mut()) {
                *s = s.max(0.0);
            }
        }
        SignalPair { robust, peak }
    }

    /// Volatility overlay applied to bar `t`, decided from bar `t - 1`.
    pub fn lagged_scale(&self, returns: &[f64]) -> Vec<f64> {
        self.lagged_scale_from(&self.volatility(returns))
    }

    fn volatility(&self, returns: &[f64]) -> Vec<f64> {
        annualized_volatility(returns, self.config.vol_window, self.config.annualization)
    }

    fn lagged_scale_from(&self, vol: &[f64]) -> Vec<f64> {
        lag(&vol_scale(vol, self.config.target_vol), 0.0)
    }

    pub fn simulate(&self, prices: &PriceSeries, windows: SelectedWindows) -> AnalysisResult {
        let returns = prices.log_returns();
        let r = returns.values();
        let dates = returns.dates();

        let signals = self.signals(prices.symbol(), r, windows);
        let vol = self.volatility(r);
        let scale = self.lagged_scale_from(&vol);

        let scaled = |sig: &[f64]| -> Vec<f64> {
            sig.iter()
                .zip(&scale)
                .zip(r)
                .map(|((s, k), r)| s * k * r)
                .collect()
        };
        let full = |sig: &[f64]| -> Vec<f64> { sig.iter().zip(r).map(|(s, r)| s * r).collect() };

        AnalysisResult {
            symbol: prices.symbol().to_string(),
            windows,
            safe_robust: EquityCurve::from_log_returns(
                CurveKind::SafeRobust,
                dates,
                &scaled(&signals.robust),
            ),
            turbo_robust: EquityCurve::from_log_returns(
                CurveKind::TurboRobust,
                dates,
                &full(&signals.robust),
            ),
            safe_peak: EquityCurve::from_log_returns(
                CurveKind::SafePeak,
                dates,
                &scaled(&signals.peak),
            ),
            turbo_peak: EquityCurve::from_log_returns(
                CurveKind::TurboPeak,
                dates,
                &full(&signals.peak),
            ),
            hold: EquityCurve::from_log_returns(CurveKind::Hold, dates, r),
            current_vol: vol.last().copied().filter(|v| v.is_finite()),
            current_position: signals.robust.last().copied().unwrap_or(0.0),
            long_only: self.is_long_only(prices.symbol()),
        }
    }
}
