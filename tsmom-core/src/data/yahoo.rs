//! Daily closes from Yahoo Finance's v8 chart endpoint.
//!
//! The endpoint is unofficial. A 403 means the client has been banned and
//! trips the shared [`CircuitBreaker`]; throttling, 5xx responses and
//! connection failures are retried with capped exponential backoff.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawQuote};
use chrono::{DateTime, NaiveDate};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const CHART_ENDPOINT: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const MAX_BACKOFF: Duration = Duration::from_secs(8);

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartSeries>>,
    error: Option<ChartFault>,
}

#[derive(Debug, Deserialize)]
struct ChartFault {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartSeries {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<CloseColumn>,
    #[serde(default)]
    adjclose: Vec<AdjCloseColumn>,
}

#[derive(Debug, Deserialize)]
struct CloseColumn {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseColumn {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) tsmom/0.1")
            .build()
            .map_err(|e| DataError::Other(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let midnight = |d: NaiveDate| d.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let period1 = midnight(start);
        let period2 = midnight(end) + 86_399;
        format!(
            "{CHART_ENDPOINT}/{symbol}?period1={period1}&period2={period2}\
             &interval=1d&includeAdjustedClose=true"
        )
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
            .min(MAX_BACKOFF)
    }

    fn attempt(&self, symbol: &str, url: &str) -> Result<Vec<RawQuote>, DataError> {
        let resp = match self.client.get(url).send() {
            Ok(resp) => resp,
            Err(e) => return Err(DataError::Network(e.to_string())),
        };

        match resp.status() {
            StatusCode::FORBIDDEN => {
                warn!(symbol, "yahoo answered 403, opening circuit breaker");
                self.breaker.trip();
                Err(DataError::CircuitBreakerTripped)
            }
            StatusCode::NOT_FOUND => Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }),
            StatusCode::TOO_MANY_REQUESTS => {
                self.breaker.record_failure();
                let retry_after_secs = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);
                Err(DataError::RateLimited { retry_after_secs })
            }
            status if status.is_server_error() => {
                self.breaker.record_failure();
                Err(DataError::Rejected {
                    status: status.as_u16(),
                })
            }
            status if !status.is_success() => Err(DataError::Rejected {
                status: status.as_u16(),
            }),
            _ => {
                let body = resp
                    .json::<ChartEnvelope>()
                    .map_err(|e| DataError::MalformedResponse(format!("{symbol}: {e}")))?;
                let quotes = parse_chart(symbol, body)?;
                self.breaker.record_success();
                Ok(quotes)
            }
        }
    }

    fn fetch_quotes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawQuote>, DataError> {
        let url = Self::chart_url(symbol, start, end);
        let mut last = DataError::Other(format!("no attempt made for {symbol}"));

        for attempt in 0..=self.max_retries {
            if !self.breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }
            if attempt > 0 {
                let delay = self.backoff(attempt);
                debug!(symbol, attempt, ?delay, error = %last, "retrying chart request");
                std::thread::sleep(delay);
            }
            match self.attempt(symbol, &url) {
                Ok(quotes) => return Ok(quotes),
                Err(e) if e.is_transient() => last = e,
                Err(e) => return Err(e),
            }
        }

        Err(last)
    }
}

fn parse_chart(symbol: &str, body: ChartEnvelope) -> Result<Vec<RawQuote>, DataError> {
    let not_found = || DataError::SymbolNotFound {
        symbol: symbol.to_string(),
    };

    if let Some(fault) = body.chart.error {
        return Err(if fault.code == "Not Found" {
            not_found()
        } else {
            DataError::MalformedResponse(format!("{}: {}", fault.code, fault.description))
        });
    }

    let series = body
        .chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| DataError::MalformedResponse("chart result is empty".into()))?;
    let closes = series
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|c| c.close)
        .unwrap_or_default();
    let adj = series
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|c| c.adjclose)
        .unwrap_or_default();

    let timestamps = series.timestamp.unwrap_or_default();
    let mut quotes = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let close = closes.get(i).copied().flatten();
        let adj_close = adj.get(i).copied().flatten();
        // all-null rows are market holidays
        if close.is_none() && adj_close.is_none() {
            continue;
        }
        let date = DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| DataError::MalformedResponse(format!("bad timestamp {ts}")))?
            .date_naive();
        quotes.push(RawQuote {
            date,
            close: close.unwrap_or(f64::NAN),
            adj_close: adj_close.unwrap_or(f64::NAN),
        });
    }

    if quotes.is_empty() {
        return Err(not_found());
    }
    Ok(quotes)
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let quotes = self.fetch_quotes(symbol, start, end)?;
        debug!(symbol, rows = quotes.len(), "fetched chart data");
        Ok(FetchResult {
            symbol: symbol.to_string(),
            quotes,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.breaker.is_allowed()
    }
}
