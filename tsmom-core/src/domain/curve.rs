//! Equity curves produced by the simulator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five strategy variants simulated from one price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// Robust window, volatility-scaled exposure.
    SafeRobust,
    /// Robust window, full exposure.
    TurboRobust,
    /// Peak window, volatility-scaled exposure.
    SafePeak,
    /// Peak window, full exposure.
    TurboPeak,
    /// Buy-and-hold baseline.
    Hold,
}

impl CurveKind {
    pub const ALL: [CurveKind; 5] = [
        CurveKind::SafeRobust,
        CurveKind::TurboRobust,
        CurveKind::SafePeak,
        CurveKind::TurboPeak,
        CurveKind::Hold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurveKind::SafeRobust => "safe_robust",
            CurveKind::TurboRobust => "turbo_robust",
            CurveKind::SafePeak => "safe_peak",
            CurveKind::TurboPeak => "turbo_peak",
            CurveKind::Hold => "hold",
        }
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compounded growth of one unit, aligned with the return series.
///
/// The implicit value before the first element is 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    pub kind: CurveKind,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl EquityCurve {
    /// `exp` of the running sum of per-bar strategy log returns.
    pub fn from_log_returns(kind: CurveKind, dates: &[NaiveDate], log_returns: &[f64]) -> Self {
        let values = log_returns
            .iter()
            .scan(0.0, |acc, r| {
                *acc += r;
                Some(acc.exp())
            })
            .collect();
        Self {
            kind,
            dates: dates.to_vec(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Last value, or 1 when the curve has no observations.
    pub fn final_value(&self) -> f64 {
        self.values.last().copied().unwrap_or(1.0)
    }

    /// Headline return in percent: `(final - 1) * 100`.
    pub fn total_return_pct(&self) -> f64 {
        (self.final_value() - 1.0) * 100.0
    }
}
