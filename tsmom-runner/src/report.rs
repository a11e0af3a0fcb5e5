//! Presentation-ready summary of one analysis and the position recommendation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tsmom_core::domain::CurveKind;
use tsmom_core::scan::SelectedWindows;
use tsmom_core::AnalysisResult;

/// What the full-exposure robust strategy says to do now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// The strategy finished below buy-and-hold; prefer holding or another instrument.
    NotRecommended,
    Long,
    Short,
    Flat,
}

impl Recommendation {
    /// Suggested exposure in percent of capital.
    pub fn exposure_pct(&self) -> f64 {
        match self {
            Recommendation::Long | Recommendation::Short => 100.0,
            Recommendation::NotRecommended | Recommendation::Flat => 0.0,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Recommendation::NotRecommended => "not recommended (trails buy and hold)",
            Recommendation::Long => "long",
            Recommendation::Short => "short",
            Recommendation::Flat => "flat",
        };
        f.write_str(s)
    }
}

/// Decide the recommendation.
///
/// With the gate on, a full-exposure robust curve that ends below buy-and-hold
/// overrides the position. Otherwise the sign of the latest robust position wins.
pub fn recommend(result: &AnalysisResult, gate_on_benchmark: bool) -> Recommendation {
    if gate_on_benchmark && result.turbo_robust.final_value() < result.hold.final_value() {
        return Recommendation::NotRecommended;
    }
    if result.current_position > 0.0 {
        Recommendation::Long
    } else if result.current_position < 0.0 {
        Recommendation::Short
    } else {
        Recommendation::Flat
    }
}

/// Which curves and metrics a front end shows.
///
/// `full` matches the research view, `compact` the trimmed dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayProfile {
    pub name: String,
    pub default_years: u32,
    pub curves: Vec<CurveKind>,
    pub show_windows: bool,
    pub show_volatility: bool,
    pub show_excess_return: bool,
}

impl DisplayProfile {
    pub fn full() -> Self {
        Self {
            name: "full".into(),
            default_years: 20,
            curves: CurveKind::ALL.to_vec(),
            show_windows: true,
            show_volatility: true,
            show_excess_return: true,
        }
    }

    pub fn compact() -> Self {
        Self {
            name: "compact".into(),
            default_years: 10,
            curves: vec![CurveKind::TurboRobust, CurveKind::SafeRobust, CurveKind::Hold],
            show_windows: true,
            show_volatility: false,
            show_excess_return: true,
        }
    }

    /// Look up a built-in profile by name.
    pub fn named(name: &str) -> Option<Self> {
        match name {
            "full" => Some(Self::full()),
            "compact" => Some(Self::compact()),
            _ => None,
        }
    }

    pub fn shows(&self, kind: CurveKind) -> bool {
        self.curves.contains(&kind)
    }
}

impl Default for DisplayProfile {
    fn default() -> Self {
        Self::full()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Refuse a directional call when the strategy trails buy-and-hold.
    pub gate_on_benchmark: bool,
    pub profile: DisplayProfile,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            gate_on_benchmark: true,
            profile: DisplayProfile::default(),
        }
    }
}

/// Headline numbers for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub symbol: String,
    pub last_date: NaiveDate,
    pub last_price: f64,
    pub windows: SelectedWindows,
    /// `(final - 1) * 100` per curve.
    pub headline_returns: BTreeMap<CurveKind, f64>,
    /// Full-exposure robust return minus buy-and-hold return, in points.
    pub excess_return_pct: f64,
    pub current_vol_pct: Option<f64>,
    pub current_position: f64,
    pub recommendation: Recommendation,
    pub long_only: bool,
    pub synthetic: bool,
}

impl Report {
    pub fn new(
        result: &AnalysisResult,
        last_date: NaiveDate,
        last_price: f64,
        config: &ReportConfig,
        synthetic: bool,
    ) -> Self {
        let headline_returns: BTreeMap<CurveKind, f64> = result
            .curves()
            .iter()
            .map(|c| (c.kind, c.total_return_pct()))
            .collect();
        let excess_return_pct =
            result.turbo_robust.total_return_pct() - result.hold.total_return_pct();

        Self {
            symbol: result.symbol.clone(),
            last_date,
            last_price,
            windows: result.windows,
            headline_returns,
            excess_return_pct,
            current_vol_pct: result.current_vol.map(|v| v * 100.0),
            current_position: result.current_position,
            recommendation: recommend(result, config.gate_on_benchmark),
            long_only: result.long_only,
            synthetic,
        }
    }

    pub fn headline_return_pct(&self, kind: CurveKind) -> Option<f64> {
        self.headline_returns.get(&kind).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsmom_core::domain::EquityCurve;

    fn result_with(turbo_final: f64, hold_final: f64, position: f64) -> AnalysisResult {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let curve = |kind, v: f64| EquityCurve {
            kind,
            dates: vec![date],
            values: vec![v],
        };
        AnalysisResult {
            symbol: "SPY".into(),
            windows: SelectedWindows { peak: 12, robust: 14 },
            safe_robust: curve(CurveKind::SafeRobust, 1.1),
            turbo_robust: curve(CurveKind::TurboRobust, turbo_final),
            safe_peak: curve(CurveKind::SafePeak, 1.0),
            turbo_peak: curve(CurveKind::TurboPeak, 1.0),
            hold: curve(CurveKind::Hold, hold_final),
            current_vol: Some(0.2),
            current_position: position,
            long_only: false,
        }
    }

    #[test]
    fn gate_overrides_position_when_trailing_hold() {
        let r = result_with(1.2, 1.5, 1.0);
        assert_eq!(recommend(&r, true), Recommendation::NotRecommended);
        assert_eq!(recommend(&r, false), Recommendation::Long);
    }

    #[test]
    fn position_sign_sets_direction() {
        assert_eq!(recommend(&result_with(2.0, 1.0, 1.0), true), Recommendation::Long);
        assert_eq!(recommend(&result_with(2.0, 1.0, -1.0), true), Recommendation::Short);
        assert_eq!(recommend(&result_with(2.0, 1.0, 0.0), true), Recommendation::Flat);
        assert_eq!(Recommendation::Short.exposure_pct(), 100.0);
        assert_eq!(Recommendation::Flat.exposure_pct(), 0.0);
    }

    #[test]
    fn report_headlines() {
        let r = result_with(1.5, 1.25, 1.0);
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let report = Report::new(&r, date, 512.3, &ReportConfig::default(), false);

        assert!((report.headline_return_pct(CurveKind::TurboRobust).unwrap() - 50.0).abs() < 1e-9);
        assert!((report.headline_return_pct(CurveKind::Hold).unwrap() - 25.0).abs() < 1e-9);
        assert!((report.excess_return_pct - 25.0).abs() < 1e-9);
        assert!((report.current_vol_pct.unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(report.headline_returns.len(), 5);
        assert_eq!(report.recommendation, Recommendation::Long);
    }

    #[test]
    fn profiles() {
        assert_eq!(DisplayProfile::default(), DisplayProfile::full());
        let compact = DisplayProfile::named("compact").unwrap();
        assert!(compact.shows(CurveKind::Hold));
        assert!(!compact.shows(CurveKind::TurboPeak));
        assert!(DisplayProfile::named("other").is_none());
    }
}
