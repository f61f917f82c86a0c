//! Binance USDT-M futures public REST client
//!
//! Trades, depth, 1m klines, and open interest. Public endpoints only, no
//! signing. Errors never reach the decision pipeline; the runner logs them
//! and skips the tick.

use crate::data::MarketDataSource;
use crate::features::FeatureInputs;
use crate::types::{BookLevel, Candle, OiPoint, OrderBookSnapshot, Side, Trade};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";
const MS_1M: i64 = 60_000;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

/// REST client for Binance USDT-M futures market data.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point at a different host (proxy, testnet, test server).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Recent trades with aggressor side.
    pub async fn recent_trades(&self, symbol: &str, limit: u32) -> Result<Vec<Trade>, FetchError> {
        let rows: Vec<TradeRow> = self
            .get(
                "/fapi/v1/trades",
                &[("symbol", symbol.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        rows.into_iter().map(TradeRow::into_trade).collect()
    }

    /// Order book snapshot, bids and asks best-first.
    pub async fn depth(&self, symbol: &str, limit: u32) -> Result<OrderBookSnapshot, FetchError> {
        let raw: DepthResponse = self
            .get(
                "/fapi/v1/depth",
                &[("symbol", symbol.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(OrderBookSnapshot {
            ts: raw.event_time.unwrap_or(raw.last_update_id),
            bids: parse_levels(&raw.bids)?,
            asks: parse_levels(&raw.asks)?,
        })
    }

    /// One-minute klines, oldest first.
    pub async fn klines_1m(&self, symbol: &str, limit: u32) -> Result<Vec<Candle>, FetchError> {
        // Klines come as heterogeneous arrays:
        // [openTime, o, h, l, c, v, closeTime, ...]
        let rows: Vec<Vec<Value>> = self
            .get(
                "/fapi/v1/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", "1m".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        rows.iter().map(|row| parse_kline(row)).collect()
    }

    /// Current open interest.
    pub async fn open_interest(&self, symbol: &str) -> Result<f64, FetchError> {
        let raw: OpenInterestResponse = self
            .get("/fapi/v1/openInterest", &[("symbol", symbol.to_string())])
            .await?;
        parse_f64(&raw.open_interest)
    }

    /// Historical open interest (5m buckets by default on the exchange).
    ///
    /// Degrades to an empty series on failure; the OI delta then resolves
    /// to `None` downstream instead of killing the tick.
    pub async fn open_interest_hist(
        &self,
        symbol: &str,
        period: &str,
        limit: u32,
    ) -> Result<Vec<OiPoint>, FetchError> {
        let result: Result<Vec<OiHistRow>, FetchError> = self
            .get(
                "/futures/data/openInterestHist",
                &[
                    ("symbol", symbol.to_string()),
                    ("period", period.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await;
        match result {
            Ok(rows) => rows.into_iter().map(OiHistRow::into_point).collect(),
            Err(err) => {
                tracing::warn!("open interest history unavailable: {}", err);
                Ok(Vec::new())
            }
        }
    }

    /// Fetch everything one tick needs and assemble the feature inputs.
    pub async fn snapshot(&self, symbol: &str) -> Result<FeatureInputs, FetchError> {
        let now = chrono::Utc::now().timestamp_millis();

        let (trades, mut order_book, candles_1m, oi_now, oi_hist) = tokio::try_join!(
            self.recent_trades(symbol, 1000),
            self.depth(symbol, 20),
            self.klines_1m(symbol, 400),
            self.open_interest(symbol),
            self.open_interest_hist(symbol, "5m", 30),
        )?;

        let mut oi_series = oi_hist;
        if oi_series.is_empty() {
            // No history: synthesize a flat prior point so the delta is
            // resolvable as zero rather than missing
            oi_series.push(OiPoint {
                ts: now - MS_1M,
                oi: oi_now,
            });
        }
        oi_series.push(OiPoint { ts: now, oi: oi_now });
        oi_series.sort_by_key(|p| p.ts);

        let current_price = order_book
            .mid_price()
            .or_else(|| candles_1m.last().map(|c| c.close))
            .unwrap_or(0.0);
        order_book.ts = now;

        Ok(FeatureInputs {
            trades,
            order_book,
            oi_series,
            candles_1m,
            current_price,
            now,
            ..Default::default()
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).query(query).send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(FetchError::Api {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

impl Default for BinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataSource for BinanceClient {
    async fn market_snapshot(&self, symbol: &str) -> Result<FeatureInputs, FetchError> {
        self.snapshot(symbol).await
    }
}

// === wire formats ===

#[derive(Debug, Deserialize)]
struct TradeRow {
    time: i64,
    price: String,
    qty: String,
    #[serde(rename = "isBuyerMaker")]
    is_buyer_maker: bool,
}

impl TradeRow {
    fn into_trade(self) -> Result<Trade, FetchError> {
        Ok(Trade {
            ts: self.time,
            price: parse_f64(&self.price)?,
            size: parse_f64(&self.qty)?,
            // Buyer was the maker, so the aggressor sold
            side: if self.is_buyer_maker {
                Side::Sell
            } else {
                Side::Buy
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct DepthResponse {
    #[serde(rename = "lastUpdateId")]
    last_update_id: i64,
    #[serde(rename = "E")]
    event_time: Option<i64>,
    bids: Vec<[String; 2]>,
    asks: Vec<[String; 2]>,
}

#[derive(Debug, Deserialize)]
struct OpenInterestResponse {
    #[serde(rename = "openInterest")]
    open_interest: String,
}

#[derive(Debug, Deserialize)]
struct OiHistRow {
    timestamp: i64,
    #[serde(rename = "sumOpenInterest")]
    sum_open_interest: String,
}

impl OiHistRow {
    fn into_point(self) -> Result<OiPoint, FetchError> {
        Ok(OiPoint {
            ts: self.timestamp,
            oi: parse_f64(&self.sum_open_interest)?,
        })
    }
}

fn parse_levels(raw: &[[String; 2]]) -> Result<Vec<BookLevel>, FetchError> {
    raw.iter()
        .map(|[price, size]| {
            Ok(BookLevel {
                price: parse_f64(price)?,
                size: parse_f64(size)?,
            })
        })
        .collect()
}

fn parse_kline(row: &[Value]) -> Result<Candle, FetchError> {
    if row.len() < 6 {
        return Err(FetchError::Parse(format!(
            "kline row too short: {} fields",
            row.len()
        )));
    }
    let ts = row[0]
        .as_i64()
        .ok_or_else(|| FetchError::Parse("kline open time is not an integer".to_string()))?;
    let field = |idx: usize| -> Result<f64, FetchError> {
        let s = row[idx]
            .as_str()
            .ok_or_else(|| FetchError::Parse(format!("kline field {} is not a string", idx)))?;
        parse_f64(s)
    };
    Ok(Candle {
        ts,
        open: field(1)?,
        high: field(2)?,
        low: field(3)?,
        close: field(4)?,
        volume: field(5)?,
    })
}

fn parse_f64(s: &str) -> Result<f64, FetchError> {
    s.parse::<f64>()
        .map_err(|_| FetchError::Parse(format!("invalid decimal: {:?}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_row_aggressor_mapping() {
        let row: TradeRow = serde_json::from_str(
            r#"{"id":1,"price":"65000.10","qty":"0.250","quoteQty":"16250.0","time":1700000000000,"isBuyerMaker":true}"#,
        )
        .unwrap();
        let trade = row.into_trade().unwrap();
        assert_eq!(trade.side, Side::Sell);
        assert_eq!(trade.ts, 1_700_000_000_000);
        assert!((trade.price - 65000.10).abs() < 1e-9);
        assert!((trade.size - 0.25).abs() < 1e-9);

        let row: TradeRow = serde_json::from_str(
            r#"{"price":"65000.10","qty":"1.0","time":1700000000001,"isBuyerMaker":false}"#,
        )
        .unwrap();
        assert_eq!(row.into_trade().unwrap().side, Side::Buy);
    }

    #[test]
    fn test_depth_decoding() {
        let raw: DepthResponse = serde_json::from_str(
            r#"{"lastUpdateId":1027024,"E":1589436922972,"T":1589436922959,
                "bids":[["64999.50","2.310"],["64999.00","0.500"]],
                "asks":[["65000.00","1.000"]]}"#,
        )
        .unwrap();
        assert_eq!(raw.event_time, Some(1_589_436_922_972));
        let bids = parse_levels(&raw.bids).unwrap();
        assert_eq!(bids.len(), 2);
        assert!((bids[0].price - 64999.50).abs() < 1e-9);
        assert!((bids[0].size - 2.31).abs() < 1e-9);
    }

    #[test]
    fn test_kline_decoding() {
        let rows: Vec<Vec<Value>> = serde_json::from_str(
            r#"[[1700000000000,"64000.0","64100.5","63950.0","64050.1","123.456",
                 1700000059999,"7901234.5",1500,"60.0","3840000.0","0"]]"#,
        )
        .unwrap();
        let candle = parse_kline(&rows[0]).unwrap();
        assert_eq!(candle.ts, 1_700_000_000_000);
        assert!((candle.high - 64100.5).abs() < 1e-9);
        assert!((candle.close - 64050.1).abs() < 1e-9);
        assert!((candle.volume - 123.456).abs() < 1e-9);
    }

    #[test]
    fn test_kline_too_short_is_parse_error() {
        let row: Vec<Value> = serde_json::from_str(r#"[1700000000000,"1.0"]"#).unwrap();
        assert!(matches!(parse_kline(&row), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_oi_hist_decoding() {
        let rows: Vec<OiHistRow> = serde_json::from_str(
            r#"[{"symbol":"BTCUSDT","sumOpenInterest":"20403.634","sumOpenInterestValue":"1.3e9","timestamp":1583127900000}]"#,
        )
        .unwrap();
        let point = rows.into_iter().next().unwrap().into_point().unwrap();
        assert_eq!(point.ts, 1_583_127_900_000);
        assert!((point.oi - 20403.634).abs() < 1e-9);
    }

    #[test]
    fn test_bad_decimal_is_parse_error() {
        assert!(matches!(parse_f64("not-a-number"), Err(FetchError::Parse(_))));
    }
}
