//! Deterministic BLAKE3 fingerprints of inputs.
//!
//! A run is identified by the dataset it saw and the configuration it used.
//! Both hashes feed field bytes in a fixed order, so they are stable across
//! platforms and serde versions.

use crate::config::AnalysisConfig;
use crate::domain::PriceSeries;

/// Hash of symbol, dates and prices.
pub fn dataset_hash(prices: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(prices.symbol().as_bytes());
    for (date, price) in prices.dates().iter().zip(prices.prices()) {
        hasher.update(date.to_string().as_bytes());
        hasher.update(&price.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Hash of every analysis parameter.
pub fn config_hash(config: &AnalysisConfig) -> String {
    let mut hasher = blake3::Hasher::new();
    let scan = &config.scan;
    for v in [
        scan.min_window,
        scan.max_window,
        scan.neighborhood_half_width,
        scan.fallback_window,
        config.simulation.vol_window,
    ] {
        hasher.update(&(v as u64).to_le_bytes());
    }
    hasher.update(&config.simulation.target_vol.to_le_bytes());
    hasher.update(&config.simulation.annualization.to_le_bytes());
    for token in &config.policy.long_only_tokens {
        hasher.update(token.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex().to_string()
}
