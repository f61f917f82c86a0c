//! Feature extraction layer
//!
//! Independent pure primitives over time-windowed market data, plus the
//! aggregator that composes them into one [`FeatureVector`] per evaluation
//! tick. Primitives retain no state between calls; every sub-computation is
//! independent of the others.

mod cvd;
mod open_interest;
mod order_book;
mod range;
mod volatility;
mod vwap;

pub use cvd::{cvd_acceleration, cvd_and_volume, cvd_ratio_60};
pub use open_interest::{oi_acceleration, oi_delta_pct_1m};
pub use order_book::{simple_obi, weighted_obi};
pub use range::range_position;
pub use volatility::vol_compress_score;
pub use vwap::{dist_vwap, dist_vwap_z, vwap_1h};

use crate::config::Thresholds;
use crate::types::{Candle, FeatureVector, OiPoint, OrderBookSnapshot, Trade};

/// Everything the aggregator needs for one tick.
///
/// Handed over by the data-fetch collaborator; the pipeline requires the
/// snapshot to be internally consistent but enforces nothing about ordering.
#[derive(Debug, Clone, Default)]
pub struct FeatureInputs {
    pub trades: Vec<Trade>,
    pub order_book: OrderBookSnapshot,
    pub oi_series: Vec<OiPoint>,
    pub candles_1m: Vec<Candle>,
    pub current_price: f64,
    /// Reference timestamp in milliseconds.
    pub now: i64,
    /// Short variance window override (seconds).
    pub vol_short_sec: Option<u64>,
    /// Long variance window override (seconds).
    pub vol_long_sec: Option<u64>,
    /// Weighted-OBI decay override.
    pub obi_lambda: Option<f64>,
    /// Simple-OBI level count override.
    pub obi_levels: Option<usize>,
}

/// Compute the full feature vector for one tick.
///
/// Mid price is the average of the best bid and ask when both exist, else
/// the supplied current price. The weighted OBI is preferred; when it is
/// exactly zero the simple top-N variant substitutes — zero is read as
/// "insufficient depth signal" rather than a perfectly balanced book, an
/// acknowledged approximation.
pub fn compute_features(input: &FeatureInputs) -> FeatureVector {
    let defaults = Thresholds::default();
    let now = input.now;
    let vol_short = input.vol_short_sec.unwrap_or(defaults.vol_short_window_sec);
    let vol_long = input.vol_long_sec.unwrap_or(defaults.vol_long_window_sec);
    let obi_lambda = input.obi_lambda.unwrap_or(defaults.obi_lambda);
    let obi_levels = input.obi_levels.unwrap_or(defaults.obi_levels);

    let mid = input.order_book.mid_price().unwrap_or(input.current_price);

    let weighted = weighted_obi(&input.order_book, mid, obi_lambda);
    let obi = if weighted != 0.0 {
        weighted
    } else {
        simple_obi(&input.order_book, obi_levels)
    };

    let vwap = vwap_1h(&input.candles_1m, now);

    FeatureVector {
        ts: now,
        cvd_ratio_60: cvd_ratio_60(&input.trades, now),
        obi,
        oi_delta_pct_1m: oi_delta_pct_1m(&input.oi_series, now).unwrap_or(0.0),
        vol_compress: vol_compress_score(&input.candles_1m, now, vol_short, vol_long),
        range_pos: range_position(&input.candles_1m, now, input.current_price),
        dist_vwap: dist_vwap(input.current_price, vwap),
        dist_vwap_z: dist_vwap_z(input.current_price, vwap, &input.candles_1m, now),
        cvd_accel: Some(cvd_acceleration(&input.trades, now)),
    }
}
