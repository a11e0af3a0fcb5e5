//! Raw quotes → [`PriceSeries`].
//!
//! Steps, in order:
//! 1. sort by date, keep the first row of any duplicated date;
//! 2. pick the adjusted close column when it has any value, else the close;
//! 3. forward-fill missing (or non-positive) prices from the last good one;
//! 4. drop leading rows that have nothing to fill from.
//!
//! A symbol with no usable price at all is reported as not found.

use super::provider::{DataError, RawQuote};
use crate::domain::PriceSeries;

/// Which column the series was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceColumn {
    AdjClose,
    Close,
}

fn usable(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Prefer adjusted closes; fall back to closes when the column is empty.
pub fn select_column(quotes: &[RawQuote]) -> Option<PriceColumn> {
    if quotes.iter().any(|q| usable(q.adj_close)) {
        Some(PriceColumn::AdjClose)
    } else if quotes.iter().any(|q| usable(q.close)) {
        Some(PriceColumn::Close)
    } else {
        None
    }
}

/// Clean provider output into a validated price series.
pub fn canonicalize_quotes(
    symbol: &str,
    mut quotes: Vec<RawQuote>,
) -> Result<PriceSeries, DataError> {
    quotes.sort_by_key(|q| q.date);
    quotes.dedup_by_key(|q| q.date);

    let column = select_column(&quotes).ok_or_else(|| DataError::SymbolNotFound {
        symbol: symbol.to_string(),
    })?;

    let mut dates = Vec::with_capacity(quotes.len());
    let mut prices = Vec::with_capacity(quotes.len());
    let mut last_good: Option<f64> = None;

    for q in &quotes {
        let raw = match column {
            PriceColumn::AdjClose => q.adj_close,
            PriceColumn::Close => q.close,
        };
        let price = if usable(raw) { Some(raw) } else { last_good };
        if let Some(p) = price {
            dates.push(q.date);
            prices.push(p);
            last_good = Some(p);
        }
    }

    PriceSeries::new(symbol, dates, prices).map_err(|e| DataError::ValidationError(e.to_string()))
}
