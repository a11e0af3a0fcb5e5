//! Price and log-return series for a single instrument.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("dates and prices differ in length ({dates} vs {prices})")]
    LengthMismatch { dates: usize, prices: usize },

    #[error("dates not strictly increasing at index {index} ({date})")]
    Unordered { index: usize, date: NaiveDate },

    #[error("price on {date} must be finite and positive, got {price}")]
    InvalidPrice { date: NaiveDate, price: f64 },
}

/// Daily prices of one instrument, strictly increasing dates, positive prices.
///
/// Gaps (non-trading days) are simply absent. The series is read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
}

impl PriceSeries {
    pub fn new(
        symbol: impl Into<String>,
        dates: Vec<NaiveDate>,
        prices: Vec<f64>,
    ) -> Result<Self, SeriesError> {
        if dates.len() != prices.len() {
            return Err(SeriesError::LengthMismatch {
                dates: dates.len(),
                prices: prices.len(),
            });
        }
        for (i, (&date, &price)) in dates.iter().zip(&prices).enumerate() {
            if !price.is_finite() || price <= 0.0 {
                return Err(SeriesError::InvalidPrice { date, price });
            }
            if i > 0 && dates[i - 1] >= date {
                return Err(SeriesError::Unordered { index: i, date });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            dates,
            prices,
        })
    }

    /// Build from `(date, price)` pairs.
    pub fn from_points(
        symbol: impl Into<String>,
        points: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self, SeriesError> {
        let (dates, prices) = points.into_iter().unzip();
        Self::new(symbol, dates, prices)
    }

    /// An empty series, used when a provider returned nothing usable.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            dates: Vec::new(),
            prices: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn last_price(&self) -> Option<f64> {
        self.prices.last().copied()
    }

    /// Keep only observations on or after `start`.
    pub fn since(&self, start: NaiveDate) -> Self {
        let from = self.dates.partition_point(|d| *d < start);
        Self {
            symbol: self.symbol.clone(),
            dates: self.dates[from..].to_vec(),
            prices: self.prices[from..].to_vec(),
        }
    }

    /// Natural-log returns between consecutive observations.
    pub fn log_returns(&self) -> ReturnSeries {
        ReturnSeries::from_prices(self)
    }
}

/// Log returns derived from a [`PriceSeries`].
///
/// `values[i] = ln(price[i + 1] / price[i])`, dated at `price` index `i + 1`.
/// The undefined leading return is not stored; its date is kept as `origin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    origin: Option<NaiveDate>,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    pub fn from_prices(prices: &PriceSeries) -> Self {
        let values = prices
            .prices
            .windows(2)
            .map(|w| (w[1] / w[0]).ln())
            .collect();
        Self {
            origin: prices.first_date(),
            dates: prices.dates.iter().skip(1).copied().collect(),
            values,
        }
    }

    /// Date of the first price, i.e. the point where every curve equals 1.
    pub fn origin(&self) -> Option<NaiveDate> {
        self.origin
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Running sum of the returns; `exp` of element `i` is `price[i + 1] / price[0]`.
    pub fn cumulative(&self) -> Vec<f64> {
        self.values
            .iter()
            .scan(0.0, |acc, r| {
                *acc += r;
                Some(*acc)
            })
            .collect()
    }
}
