//! Binance spot klines provider.
//!
//! Fetches recent OHLCV bars from the public `GET /api/v3/klines` endpoint.
//! Handles paging past the per-request cap, retries with exponential backoff,
//! response parsing and the circuit breaker. The still-forming candle is
//! dropped so callers only ever see closed bars.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataSource, FetchResult, MarketDataProvider};
use crate::domain::{Bar, BarInterval};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Exchange-side cap on klines per request.
pub const MAX_KLINES_PER_REQUEST: usize = 1000;

/// Binance error payload (`{"code": -1121, "msg": "Invalid symbol."}`).
#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

const INVALID_SYMBOL: i64 = -1121;

pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl BinanceProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        Self::with_base_url(DEFAULT_BASE_URL, circuit_breaker)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("bandwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Exchange symbol for a pair written with a separator ("BTC/USDT" → "BTCUSDT").
    pub fn exchange_symbol(symbol: &str) -> String {
        symbol
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase()
    }

    fn klines_url(
        &self,
        symbol: &str,
        interval: BarInterval,
        limit: usize,
        end_time: Option<i64>,
    ) -> String {
        let mut url = format!(
            "{}/api/v3/klines?symbol={symbol}&interval={}&limit={limit}",
            self.base_url,
            interval.as_str()
        );
        if let Some(end) = end_time {
            url.push_str(&format!("&endTime={end}"));
        }
        url
    }

    /// Parse a klines payload into closed bars, oldest first.
    ///
    /// Each row is `[open_time, open, high, low, close, volume, close_time, ...]`
    /// with prices as decimal strings. Rows whose close time is after `now_ms`
    /// are still forming and are dropped.
    pub fn parse_klines(body: &str, now_ms: i64) -> Result<Vec<Bar>, DataError> {
        let rows: Vec<Vec<Value>> = serde_json::from_str(body)
            .map_err(|e| DataError::ResponseFormatChanged(format!("klines payload: {e}")))?;

        let mut bars = Vec::with_capacity(rows.len());
        for row in &rows {
            if row.len() < 7 {
                return Err(DataError::ResponseFormatChanged(format!(
                    "kline row has {} fields, expected at least 7",
                    row.len()
                )));
            }
            let close_time = int_field(&row[6], "close_time")?;
            if close_time > now_ms {
                continue;
            }
            bars.push(Bar {
                timestamp: int_field(&row[0], "open_time")?,
                open: decimal_field(&row[1], "open")?,
                high: decimal_field(&row[2], "high")?,
                low: decimal_field(&row[3], "low")?,
                close: decimal_field(&row[4], "close")?,
                volume: decimal_field(&row[5], "volume")?,
            });
        }
        Ok(bars)
    }

    /// Execute one klines request with retry and circuit breaker logic.
    fn request_with_retry(&self, symbol: &str, url: &str) -> Result<String, DataError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    debug!(attempt, error = %e, "klines request failed, retrying");
                    self.circuit_breaker.record_failure();
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN || status.as_u16() == 418 {
                warn!(%status, "exchange refused requests, tripping circuit breaker");
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            let body = resp
                .text()
                .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

            if status == reqwest::StatusCode::BAD_REQUEST {
                if let Ok(err) = serde_json::from_str::<ApiError>(&body) {
                    if err.code == INVALID_SYMBOL {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }
                    return Err(DataError::Other(format!("API error {}: {}", err.code, err.msg)));
                }
            }

            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            self.circuit_breaker.record_success();
            return Ok(body);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

fn int_field(v: &Value, field: &str) -> Result<i64, DataError> {
    v.as_i64()
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("{field} is not an integer: {v}")))
}

fn decimal_field(v: &Value, field: &str) -> Result<f64, DataError> {
    let parsed = match v {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| DataError::ResponseFormatChanged(format!("{field} is not a decimal: {v}")))
}

/// Backwards paging state for one `fetch`.
///
/// Pages arrive newest first; each page is oldest-first internally.
#[derive(Debug)]
struct KlinePager {
    limit: usize,
    collected: usize,
    end_time: Option<i64>,
    pages: Vec<Vec<Bar>>,
    exhausted: bool,
}

impl KlinePager {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            collected: 0,
            end_time: None,
            pages: Vec::new(),
            exhausted: false,
        }
    }

    /// Row count and `endTime` for the next request, `None` when done.
    fn next_request(&self) -> Option<(usize, Option<i64>)> {
        if self.exhausted || self.collected >= self.limit {
            return None;
        }
        // One extra row covers the forming candle dropped on the first page.
        let page_limit = (self.limit - self.collected + 1).min(MAX_KLINES_PER_REQUEST);
        Some((page_limit, self.end_time))
    }

    /// Merge a parsed page that was requested with `page_limit` rows.
    fn push_page(&mut self, mut page: Vec<Bar>, page_limit: usize) {
        let received = page.len();
        let Some(first) = page.first() else {
            self.exhausted = true;
            return;
        };
        self.end_time = Some(first.timestamp - 1);

        let wanted = self.limit - self.collected;
        if received > wanted {
            page.drain(..received - wanted);
        }
        self.collected += page.len();
        self.pages.push(page);

        if received + 1 < page_limit {
            self.exhausted = true; // history exhausted
        }
    }

    fn into_bars(self) -> Vec<Bar> {
        self.pages.into_iter().rev().flatten().collect()
    }
}

impl MarketDataProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    /// Pages backwards from the newest candle until `limit` closed bars are
    /// collected or the exchange runs out of history.
    fn fetch(
        &self,
        symbol: &str,
        interval: BarInterval,
        limit: usize,
    ) -> Result<FetchResult, DataError> {
        let exchange_symbol = Self::exchange_symbol(symbol);
        let mut pager = KlinePager::new(limit);

        while let Some((page_limit, end_time)) = pager.next_request() {
            let url = self.klines_url(&exchange_symbol, interval, page_limit, end_time);
            let body = self.request_with_retry(symbol, &url)?;
            let now_ms = chrono::Utc::now().timestamp_millis();
            pager.push_page(Self::parse_klines(&body, now_ms)?, page_limit);
        }

        let bars = pager.into_bars();
        debug!(symbol, interval = %interval, bars = bars.len(), "fetched klines");

        Ok(FetchResult {
            symbol: symbol.to_string(),
            interval,
            bars,
            source: DataSource::Binance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"[
        [1704067200000, "42283.58", "42298.62", "42261.02", "42298.61", "35.92724",
         1704067259999, "1519203.80", 1327, "19.84", "839218.34", "0"],
        [1704067260000, "42298.62", "42320.00", "42290.00", "42310.10", "20.5",
         1704067319999, "867000.00", 900, "10.1", "427000.00", "0"],
        [1704067320000, "42310.10", "42315.00", "42300.00", "42301.00", "1.0",
         1704067379999, "42301.00", 10, "0.5", "21150.50", "0"]
    ]"#;

    fn minute_bars(minutes: std::ops::Range<i64>) -> Vec<Bar> {
        minutes
            .map(|m| Bar {
                timestamp: m * 60_000,
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn pager_splits_full_window_into_two_pages() {
        let mut pager = KlinePager::new(1440);

        // Newest page: 1000 rows, the forming candle already dropped.
        assert_eq!(pager.next_request(), Some((1000, None)));
        pager.push_page(minute_bars(441..1440), 1000);

        // Older page asks for the remaining 441 plus one spare row.
        assert_eq!(pager.next_request(), Some((442, Some(441 * 60_000 - 1))));
        pager.push_page(minute_bars(0..441), 442);
        assert_eq!(pager.next_request(), None);

        let bars = pager.into_bars();
        assert_eq!(bars.len(), 1440);
        assert_eq!(bars[0].timestamp, 0);
        assert_eq!(bars[1439].timestamp, 1439 * 60_000);
        assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn pager_trims_surplus_older_rows() {
        let mut pager = KlinePager::new(1440);
        pager.push_page(minute_bars(441..1440), 1000);
        // Exchange had more history: 442 rows returned, one too many.
        pager.push_page(minute_bars(-1..441), 442);

        let bars = pager.into_bars();
        assert_eq!(bars.len(), 1440);
        assert_eq!(bars[0].timestamp, 0);
    }

    #[test]
    fn pager_stops_on_short_history() {
        let mut pager = KlinePager::new(1440);
        pager.push_page(minute_bars(0..299), 1000);
        assert_eq!(pager.next_request(), None);
        assert_eq!(pager.into_bars().len(), 299);
    }

    #[test]
    fn pager_stops_on_empty_page() {
        let mut pager = KlinePager::new(10);
        assert_eq!(pager.next_request(), Some((11, None)));
        pager.push_page(Vec::new(), 11);
        assert_eq!(pager.next_request(), None);
        assert!(pager.into_bars().is_empty());
    }

    #[test]
    fn exchange_symbol_strips_separator() {
        assert_eq!(BinanceProvider::exchange_symbol("BTC/USDT"), "BTCUSDT");
        assert_eq!(BinanceProvider::exchange_symbol("eth-usdt"), "ETHUSDT");
        assert_eq!(BinanceProvider::exchange_symbol("SOLUSDT"), "SOLUSDT");
    }

    #[test]
    fn parses_closed_klines() {
        let bars = BinanceProvider::parse_klines(PAYLOAD, 1_704_067_400_000).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].timestamp, 1_704_067_200_000);
        assert_eq!(bars[0].open, 42283.58);
        assert_eq!(bars[0].close, 42298.61);
        assert_eq!(bars[1].high, 42320.0);
        assert_eq!(bars[2].volume, 1.0);
        assert!(bars.iter().all(Bar::is_sane));
    }

    #[test]
    fn drops_forming_candle() {
        // "now" falls inside the third candle.
        let bars = BinanceProvider::parse_klines(PAYLOAD, 1_704_067_330_000).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars.last().unwrap().timestamp, 1_704_067_260_000);
    }

    #[test]
    fn empty_payload_is_empty() {
        assert!(BinanceProvider::parse_klines("[]", 0).unwrap().is_empty());
    }

    #[test]
    fn malformed_payload_is_format_error() {
        let err = BinanceProvider::parse_klines(r#"{"code": -1121}"#, 0).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));

        let err = BinanceProvider::parse_klines(r#"[[1, "2", "3"]]"#, 10).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));

        let err = BinanceProvider::parse_klines(r#"[[1, "x", "3", "1", "2", "1", 5]]"#, 10)
            .unwrap_err();
        assert!(err.to_string().contains("open"));
    }

    #[test]
    fn klines_url_includes_paging() {
        let breaker = Arc::new(CircuitBreaker::default_provider());
        let provider = BinanceProvider::with_base_url("http://localhost:1/", breaker).unwrap();
        assert_eq!(
            provider.klines_url("BTCUSDT", BarInterval::OneMinute, 500, None),
            "http://localhost:1/api/v3/klines?symbol=BTCUSDT&interval=1m&limit=500"
        );
        assert_eq!(
            provider.klines_url("BTCUSDT", BarInterval::FiveMinutes, 10, Some(99)),
            "http://localhost:1/api/v3/klines?symbol=BTCUSDT&interval=5m&limit=10&endTime=99"
        );
    }

    #[test]
    fn tripped_breaker_short_circuits() {
        let breaker = Arc::new(CircuitBreaker::default_provider());
        breaker.trip();
        let provider = BinanceProvider::with_base_url("http://localhost:1", breaker).unwrap();
        assert!(!provider.is_available());
        let err = provider.fetch("BTC/USDT", BarInterval::OneMinute, 10).unwrap_err();
        assert!(matches!(err, DataError::CircuitBreakerTripped));
    }
}
