//! Market data fetch layer
//!
//! Thin REST wrapper around Binance USDT-M futures public endpoints. The
//! pipeline itself never does I/O; it only requires an already-fetched,
//! internally consistent [`crate::features::FeatureInputs`], which this
//! module assembles.

mod binance;

pub use binance::{BinanceClient, FetchError};

use crate::features::FeatureInputs;
use async_trait::async_trait;

/// Port for fetching one tick's worth of market data.
///
/// Lets the runner be driven by a mock in tests instead of the live
/// exchange.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn market_snapshot(&self, symbol: &str) -> Result<FeatureInputs, FetchError>;
}
