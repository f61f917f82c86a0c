//! Order book imbalance, depth-weighted and simple top-N

use crate::types::OrderBookSnapshot;

/// Exponential decay weight for a level `distance_ticks` away from mid.
fn decay_weight(distance_ticks: f64, lambda: f64) -> f64 {
    (-lambda * distance_ticks).exp()
}

/// Depth-weighted order book imbalance in [-1, 1].
///
/// Every level is weighted by `exp(-lambda * d)` where `d` is the distance
/// from `mid` in one-basis-point ticks. Result is
/// `(bid_w - ask_w) / (bid_w + ask_w)`, 0 when total weighted volume is 0.
pub fn weighted_obi(book: &OrderBookSnapshot, mid: f64, lambda: f64) -> f64 {
    // One basis point of the mid; degenerate mids put all levels at distance 0
    let tick = mid * 0.0001;
    let distance = |price: f64| -> f64 {
        if tick > 0.0 {
            let d = (mid - price).abs() / tick;
            if d.is_finite() { d } else { 0.0 }
        } else {
            0.0
        }
    };

    let mut bid_w = 0.0;
    let mut ask_w = 0.0;
    for level in &book.bids {
        bid_w += decay_weight(distance(level.price), lambda) * level.size;
    }
    for level in &book.asks {
        ask_w += decay_weight(distance(level.price), lambda) * level.size;
    }

    let total = bid_w + ask_w;
    if total <= 0.0 {
        return 0.0;
    }
    ((bid_w - ask_w) / total).clamp(-1.0, 1.0)
}

/// Simple imbalance over the top `levels` per side, same ratio formula.
///
/// Used as fallback when the weighted variant is exactly 0, which is
/// ambiguous between "balanced" and "empty book".
pub fn simple_obi(book: &OrderBookSnapshot, levels: usize) -> f64 {
    let bid: f64 = book.bids.iter().take(levels).map(|l| l.size).sum();
    let ask: f64 = book.asks.iter().take(levels).map(|l| l.size).sum();
    let total = bid + ask;
    if total <= 0.0 {
        return 0.0;
    }
    ((bid - ask) / total).clamp(-1.0, 1.0)
}
