//! Domain types for the decision pipeline
//!
//! Value objects flowing through the pipeline: raw market observations in,
//! feature vector / regime state / decision out. Everything here is immutable
//! once constructed and cheap to clone; no shared mutable state anywhere.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggressor side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

/// Single trade with aggressor side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Timestamp in milliseconds
    pub ts: i64,
    pub price: f64,
    pub size: f64,
    pub side: Side,
}

/// One price level of the order book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: f64,
}

/// Point-in-time order book view, bids and asks best-first.
///
/// No incremental-update semantics; each snapshot stands alone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub ts: i64,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBookSnapshot {
    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }

    /// Mid price when both sides are quoted.
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / 2.0),
            _ => None,
        }
    }
}

/// Open interest observation. The series may be sparse with arbitrary
/// spacing; lookups are nearest-neighbor with a tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OiPoint {
    pub ts: i64,
    pub oi: f64,
}

/// One-minute OHLCV candle, `ts` is the bucket open time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub ts: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Aggregated feature vector, one per evaluation tick.
///
/// Bounded fields are clamped by the primitives that produce them:
/// `cvd_ratio_60` and `obi` in [-1, 1], `vol_compress` and `range_pos`
/// in [0, 1]. Optional fields are `None` when there is insufficient data;
/// callers must not condition on them in that case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub ts: i64,
    pub cvd_ratio_60: f64,
    pub obi: f64,
    /// 1-minute open interest change in percent. Zero-substituted when the
    /// OI series could not resolve both lookup points.
    pub oi_delta_pct_1m: f64,
    pub vol_compress: f64,
    pub range_pos: f64,
    /// Signed fractional distance from the 1h VWAP, 0 when VWAP is unknown.
    pub dist_vwap: f64,
    /// Distance from VWAP in volatility units.
    pub dist_vwap_z: Option<f64>,
    /// CVD(last 30s) - CVD(prior 30s).
    pub cvd_accel: Option<f64>,
}

/// Market regime label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Trending,
    Ranging,
    VolCompression,
    PostLiquidation,
    Unknown,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Regime::Trending => "trending",
            Regime::Ranging => "ranging",
            Regime::VolCompression => "vol_compression",
            Regime::PostLiquidation => "post_liquidation",
            Regime::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Regime label plus timing.
///
/// The classifier stamps `entered_at = ts` on every call, so a fresh state
/// cannot tell you how long the market has been in a regime. Callers that
/// need duration beyond a single tick must retain the previous state and
/// refresh `entered_at` only when the label changes (see
/// [`crate::runner::RegimeTracker`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeState {
    pub regime: Regime,
    pub ts: i64,
    pub entered_at: i64,
}

/// Trade direction of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Up,
    Down,
    NoTrade,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::NoTrade => "NO_TRADE",
        };
        write!(f, "{}", s)
    }
}

/// Why a tick produced `NO_TRADE`.
///
/// Each gate in the decision engine exits with its own code so rejected
/// ticks can be attributed in the result log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    BelowProbabilityThreshold,
    BelowConfidenceGate,
    PostLiquidationCooldown,
    ObiNotConfirming,
    RangingNoExtremeFlow,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::BelowProbabilityThreshold => "below_probability_threshold",
            RejectReason::BelowConfidenceGate => "below_confidence_gate",
            RejectReason::PostLiquidationCooldown => "post_liquidation_cooldown",
            RejectReason::ObiNotConfirming => "obi_not_confirming",
            RejectReason::RangingNoExtremeFlow => "ranging_no_extreme_flow",
        };
        write!(f, "{}", s)
    }
}

/// Terminal output of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub direction: Direction,
    pub p_up: f64,
    pub ts: i64,
    pub regime: Regime,
    /// max(p_up, 1 - p_up)
    pub confidence: f64,
    /// Suggested position size in [0, max_size_multiplier].
    pub size_multiplier: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mid_price() {
        let book = OrderBookSnapshot {
            ts: 0,
            bids: vec![BookLevel {
                price: 100.0,
                size: 1.0,
            }],
            asks: vec![BookLevel {
                price: 101.0,
                size: 1.0,
            }],
        };
        assert_eq!(book.mid_price(), Some(100.5));

        let one_sided = OrderBookSnapshot {
            ts: 0,
            bids: vec![BookLevel {
                price: 100.0,
                size: 1.0,
            }],
            asks: vec![],
        };
        assert_eq!(one_sided.mid_price(), None);
    }

    #[test]
    fn test_serde_labels() {
        assert_eq!(
            serde_json::to_string(&Direction::NoTrade).unwrap(),
            "\"NO_TRADE\""
        );
        assert_eq!(
            serde_json::to_string(&Regime::PostLiquidation).unwrap(),
            "\"post_liquidation\""
        );
        assert_eq!(
            serde_json::to_string(&RejectReason::ObiNotConfirming).unwrap(),
            "\"obi_not_confirming\""
        );
        let side: Side = serde_json::from_str("\"buy\"").unwrap();
        assert_eq!(side, Side::Buy);
    }

    #[test]
    fn test_reason_display_matches_serde() {
        for reason in [
            RejectReason::BelowProbabilityThreshold,
            RejectReason::BelowConfidenceGate,
            RejectReason::PostLiquidationCooldown,
            RejectReason::ObiNotConfirming,
            RejectReason::RangingNoExtremeFlow,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason));
        }
    }
}
