//! In-memory price cache owned by the orchestrator.
//!
//! Entries are keyed by upper-cased symbol and lookback years. An entry
//! expires when the trading day rolls over (it was fetched on an earlier
//! calendar day) or, when configured, once it is older than the max age.
//! A symbol the provider did not recognize is cached as [`CachedPrices::NotFound`]
//! so repeated lookups do not hit the network.

use chrono::{Duration, NaiveDateTime};
use std::collections::HashMap;
use tsmom_core::PriceSeries;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub years: u32,
}

impl CacheKey {
    pub fn new(symbol: &str, years: u32) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            years,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachedPrices {
    Found(PriceSeries),
    NotFound,
}

#[derive(Debug, Clone)]
struct Entry {
    value: CachedPrices,
    fetched_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
}

#[derive(Debug, Default)]
pub struct PriceCache {
    entries: HashMap<CacheKey, Entry>,
    max_age: Option<Duration>,
    stats: CacheStats,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also expire entries older than `max_age`, even within one trading day.
    pub fn with_max_age(max_age: Option<Duration>) -> Self {
        Self {
            max_age,
            ..Self::default()
        }
    }

    pub fn get(&mut self, symbol: &str, years: u32) -> Option<CachedPrices> {
        self.get_at(symbol, years, now())
    }

    /// Look up as of `now`, dropping the entry if it has expired.
    pub fn get_at(&mut self, symbol: &str, years: u32, now: NaiveDateTime) -> Option<CachedPrices> {
        let key = CacheKey::new(symbol, years);
        let Some(entry) = self.entries.get(&key) else {
            self.stats.misses += 1;
            return None;
        };

        if self.is_expired(entry, now) {
            self.entries.remove(&key);
            self.stats.expired += 1;
            self.stats.misses += 1;
            return None;
        }

        self.stats.hits += 1;
        Some(entry.value.clone())
    }

    fn is_expired(&self, entry: &Entry, now: NaiveDateTime) -> bool {
        if entry.fetched_at.date() != now.date() {
            return true;
        }
        self.max_age.is_some_and(|age| now - entry.fetched_at > age)
    }

    pub fn insert(&mut self, symbol: &str, years: u32, value: CachedPrices) {
        self.insert_at(symbol, years, value, now());
    }

    pub fn insert_at(&mut self, symbol: &str, years: u32, value: CachedPrices, fetched_at: NaiveDateTime) {
        self.entries
            .insert(CacheKey::new(symbol, years), Entry { value, fetched_at });
    }

    /// Drop every horizon cached for `symbol`.
    pub fn invalidate(&mut self, symbol: &str) {
        let symbol = symbol.trim().to_uppercase();
        self.entries.retain(|k, _| k.symbol != symbol);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn series() -> PriceSeries {
        PriceSeries::from_points(
            "SPY",
            [(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 500.0)],
        )
        .unwrap()
    }

    #[test]
    fn key_is_case_insensitive() {
        let mut cache = PriceCache::new();
        cache.insert_at("spy", 5, CachedPrices::Found(series()), at(4, 9));
        assert!(matches!(cache.get_at("SPY", 5, at(4, 15)), Some(CachedPrices::Found(_))));
        assert!(cache.get_at("SPY", 10, at(4, 15)).is_none());
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1, expired: 0 });
    }

    #[test]
    fn expires_on_trading_day_rollover() {
        let mut cache = PriceCache::new();
        cache.insert_at("SPY", 5, CachedPrices::Found(series()), at(4, 23));
        assert!(cache.get_at("SPY", 5, at(5, 0)).is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expired, 1);
    }

    #[test]
    fn expires_after_max_age() {
        let mut cache = PriceCache::with_max_age(Some(Duration::hours(2)));
        cache.insert_at("SPY", 5, CachedPrices::Found(series()), at(4, 9));
        assert!(cache.get_at("SPY", 5, at(4, 10)).is_some());
        assert!(cache.get_at("SPY", 5, at(4, 12)).is_none());
    }

    #[test]
    fn not_found_marker_is_cached() {
        let mut cache = PriceCache::new();
        cache.insert_at("NOPE", 20, CachedPrices::NotFound, at(4, 9));
        assert_eq!(cache.get_at("nope", 20, at(4, 9)), Some(CachedPrices::NotFound));
    }

    #[test]
    fn invalidate_and_clear() {
        let mut cache = PriceCache::new();
        cache.insert_at("SPY", 5, CachedPrices::Found(series()), at(4, 9));
        cache.insert_at("SPY", 10, CachedPrices::Found(series()), at(4, 9));
        cache.insert_at("QQQ", 5, CachedPrices::NotFound, at(4, 9));
        cache.invalidate("spy");
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
