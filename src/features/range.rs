//! Position within the trailing 5-minute range

use crate::types::Candle;

const MS_5M: i64 = 5 * 60_000;

/// Where `current_price` sits in the trailing 5-minute high/low range,
/// clamped to [0, 1]. 0.5 when there are no candles in the window or the
/// range is degenerate (high == low).
pub fn range_position(candles: &[Candle], now: i64, current_price: f64) -> f64 {
    let cutoff = now - MS_5M;
    let mut high = f64::NEG_INFINITY;
    let mut low = f64::INFINITY;
    let mut seen = false;
    for candle in candles.iter().filter(|c| c.ts >= cutoff) {
        high = high.max(candle.high);
        low = low.min(candle.low);
        seen = true;
    }
    if !seen {
        return 0.5;
    }
    let range = high - low;
    if range <= 0.0 {
        return 0.5;
    }
    ((current_price - low) / range).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(ts: i64, high: f64, low: f64) -> Candle {
        Candle {
            ts,
            open: low,
            high,
            low,
            close: high,
            volume: 1.0,
        }
    }

    #[test]
    fn test_no_candles_is_midpoint() {
        assert_eq!(range_position(&[], 1_000_000, 100.0), 0.5);

        // Candles exist but are older than 5 minutes
        let stale = vec![candle(0, 110.0, 90.0)];
        assert_eq!(range_position(&stale, 1_000_000, 100.0), 0.5);
    }

    #[test]
    fn test_flat_range_is_midpoint() {
        let now = 1_000_000;
        let candles = vec![candle(now - 60_000, 100.0, 100.0)];
        assert_eq!(range_position(&candles, now, 100.0), 0.5);
    }

    #[test]
    fn test_position_in_range() {
        let now = 1_000_000;
        let candles = vec![
            candle(now - 240_000, 110.0, 105.0),
            candle(now - 120_000, 108.0, 100.0),
        ];
        // Range [100, 110]; price 102.5 -> 0.25
        let pos = range_position(&candles, now, 102.5);
        assert!((pos - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_clamped_outside_range() {
        let now = 1_000_000;
        let candles = vec![candle(now - 60_000, 110.0, 100.0)];
        assert_eq!(range_position(&candles, now, 120.0), 1.0);
        assert_eq!(range_position(&candles, now, 95.0), 0.0);
    }
}
