//! Curve styling and the plain-text renderer.
//!
//! Styling lives in an explicit [`RenderConfig`] that callers pass to the
//! renderer and to artifact export; nothing is held in global state.

use crate::report::{DisplayProfile, Report};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tsmom_core::domain::CurveKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

/// How one curve is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveStyle {
    pub kind: CurveKind,
    pub label: String,
    /// Any color name or `#rrggbb` understood by the plotting front end.
    pub color: String,
    pub line: LineStyle,
    pub width: f64,
    pub alpha: f64,
}

impl CurveStyle {
    fn new(kind: CurveKind, label: &str, color: &str, line: LineStyle, width: f64, alpha: f64) -> Self {
        Self {
            kind,
            label: label.to_string(),
            color: color.to_string(),
            line,
            width,
            alpha,
        }
    }
}

/// Per-curve styling, in drawing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub curves: Vec<CurveStyle>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        use LineStyle::*;
        Self {
            curves: vec![
                CurveStyle::new(CurveKind::TurboRobust, "Robust, full exposure", "blue", Solid, 2.5, 1.0),
                CurveStyle::new(CurveKind::SafeRobust, "Robust, vol-targeted", "red", Solid, 2.0, 0.9),
                CurveStyle::new(CurveKind::SafePeak, "Peak, vol-targeted", "orange", Dotted, 1.5, 0.6),
                CurveStyle::new(CurveKind::TurboPeak, "Peak, full exposure", "purple", Dotted, 1.5, 0.6),
                CurveStyle::new(CurveKind::Hold, "Buy and hold", "gray", Dashed, 2.0, 0.6),
            ],
        }
    }
}

impl RenderConfig {
    pub fn style(&self, kind: CurveKind) -> Option<&CurveStyle> {
        self.curves.iter().find(|s| s.kind == kind)
    }

    /// Configured label, or the curve's identifier when unstyled.
    pub fn label(&self, kind: CurveKind) -> &str {
        self.style(kind).map_or(kind.as_str(), |s| s.label.as_str())
    }
}

/// Renders a [`Report`] as a terminal summary.
#[derive(Debug, Clone)]
pub struct TextRenderer<'a> {
    render: &'a RenderConfig,
    profile: &'a DisplayProfile,
}

impl<'a> TextRenderer<'a> {
    pub fn new(render: &'a RenderConfig, profile: &'a DisplayProfile) -> Self {
        Self { render, profile }
    }

    pub fn render(&self, report: &Report) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}  (data through {}, last price {:.2}{})",
            report.symbol,
            report.last_date,
            report.last_price,
            if report.synthetic { ", SYNTHETIC" } else { "" }
        );
        out.push('\n');

        // Curves in styling order, then any shown curve the styling omits.
        let mut kinds: Vec<CurveKind> = self
            .render
            .curves
            .iter()
            .map(|s| s.kind)
            .filter(|k| self.profile.shows(*k))
            .collect();
        for k in &self.profile.curves {
            if !kinds.contains(k) {
                kinds.push(*k);
            }
        }
        let width = kinds
            .iter()
            .map(|k| self.render.label(*k).chars().count())
            .max()
            .unwrap_or(0);
        for kind in kinds {
            if let Some(pct) = report.headline_return_pct(kind) {
                let _ = writeln!(out, "  {:<width$}  {:>9.1}%", self.render.label(kind), pct);
            }
        }
        if self.profile.show_excess_return {
            let _ = writeln!(
                out,
                "  {:<width$}  {:>+9.1}%",
                "vs buy and hold",
                report.excess_return_pct
            );
        }
        out.push('\n');

        if self.profile.show_windows {
            let _ = writeln!(
                out,
                "  Lookback: robust {} bars, peak {} bars",
                report.windows.robust, report.windows.peak
            );
        }
        if self.profile.show_volatility {
            match report.current_vol_pct {
                Some(v) => {
                    let _ = writeln!(out, "  Current volatility: {v:.1}%");
                }
                None => {
                    let _ = writeln!(out, "  Current volatility: n/a");
                }
            }
        }
        let _ = writeln!(
            out,
            "  Recommendation: {} (exposure {:.0}%){}",
            report.recommendation,
            report.recommendation.exposure_pct(),
            if report.long_only { " [long-only]" } else { "" }
        );
        out
    }
}
