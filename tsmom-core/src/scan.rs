//! Lookback window scan and selection.
//!
//! Every candidate window is scored by the total log return the sign-momentum
//! rule would have realized over the whole history (fully invested, unscaled).
//! Two windows are picked from the resulting [`PerformanceMap`]:
//!
//! - `peak`: the single best score.
//! - `robust`: the best mean score over the window and its neighbors within
//!   `neighborhood_half_width`. Neighborhoods shrink at the edges of the range
//!   rather than being padded.
//!
//! Ties go to the smaller window in both cases.

use crate::domain::ReturnSeries;
use crate::indicators::momentum_signal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Window scan settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Smallest candidate lookback (inclusive).
    pub min_window: usize,
    /// Largest candidate lookback (inclusive).
    pub max_window: usize,
    /// Neighbors on each side averaged for the robust pick.
    pub neighborhood_half_width: usize,
    /// Used for both picks when the range is empty.
    pub fallback_window: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_window: 10,
            max_window: 254,
            neighborhood_half_width: 2,
            fallback_window: 60,
        }
    }
}

impl ScanConfig {
    pub fn windows(&self) -> RangeInclusive<usize> {
        self.min_window..=self.max_window
    }

    pub fn is_empty(&self) -> bool {
        self.min_window > self.max_window
    }
}

/// The two lookbacks chosen by the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedWindows {
    pub peak: usize,
    pub robust: usize,
}

/// Score per candidate window, ordered by window length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMap {
    scores: BTreeMap<usize, f64>,
}

impl PerformanceMap {
    pub fn get(&self, window: usize) -> Option<f64> {
        self.scores.get(&window).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// `(window, score)` in ascending window order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.scores.iter().map(|(&w, &s)| (w, s))
    }

    /// Mean score of `window` and the present neighbors within `half_width`.
    pub fn neighborhood_mean(&self, window: usize, half_width: usize) -> Option<f64> {
        let lo = window.saturating_sub(half_width);
        let hi = window.saturating_add(half_width);
        let (sum, count) = self
            .scores
            .range(lo..=hi)
            .fold((0.0, 0usize), |(sum, count), (_, &s)| (sum + s, count + 1));
        (count > 0).then(|| sum / count as f64)
    }

    /// Window with the highest raw score; first wins on ties.
    pub fn peak(&self) -> Option<usize> {
        first_argmax(self.iter())
    }

    /// Window with the highest neighborhood mean; first wins on ties.
    pub fn robust(&self, half_width: usize) -> Option<usize> {
        first_argmax(
            self.scores
                .keys()
                .filter_map(|&w| self.neighborhood_mean(w, half_width).map(|m| (w, m))),
        )
    }

    /// The `n` best windows by raw score, best first.
    pub fn top(&self, n: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

impl FromIterator<(usize, f64)> for PerformanceMap {
    fn from_iter<I: IntoIterator<Item = (usize, f64)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

fn first_argmax(candidates: impl Iterator<Item = (usize, f64)>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (window, score) in candidates {
        if score.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((window, score));
        }
    }
    best.map(|(w, _)| w)
}

/// Total log return of the sign-momentum rule with lookback `window`.
///
/// Bars whose product is undefined contribute nothing.
pub fn window_score(returns: &[f64], window: usize) -> f64 {
    momentum_signal(returns, window)
        .iter()
        .zip(returns)
        .map(|(pos, r)| pos * r)
        .filter(|x| x.is_finite())
        .sum()
}

/// Score every window in the configured range.
pub fn scan_windows(returns: &ReturnSeries, config: &ScanConfig) -> PerformanceMap {
    let values = returns.values();
    config
        .windows()
        .map(|w| (w, window_score(values, w)))
        .collect()
}

/// Pick `peak` and `robust` from a scored map.
///
/// An empty map yields `fallback_window` for both.
pub fn select_from_map(map: &PerformanceMap, config: &ScanConfig) -> SelectedWindows {
    SelectedWindows {
        peak: map.peak().unwrap_or(config.fallback_window),
        robust: map
            .robust(config.neighborhood_half_width)
            .unwrap_or(config.fallback_window),
    }
}

/// Scan and select in one step.
pub fn select_windows(returns: &ReturnSeries, config: &ScanConfig) -> SelectedWindows {
    select_from_map(&scan_windows(returns, config), config)
}
