//! Rolling 1h VWAP and distance measures

use crate::features::volatility::{close_returns, sample_variance};
use crate::types::Candle;

const MS_1H: i64 = 60 * 60_000;

/// Volume-weighted typical price ((high + low + close) / 3) over candles in
/// `[now - 1h, now]`. `None` with no candles in the window or zero total
/// volume.
pub fn vwap_1h(candles: &[Candle], now: i64) -> Option<f64> {
    let cutoff = now - MS_1H;
    let mut sum_pv = 0.0;
    let mut sum_v = 0.0;
    let mut seen = false;
    for candle in candles.iter().filter(|c| c.ts >= cutoff && c.ts <= now) {
        let typical = (candle.high + candle.low + candle.close) / 3.0;
        sum_pv += typical * candle.volume;
        sum_v += candle.volume;
        seen = true;
    }
    if !seen || sum_v <= 0.0 {
        return None;
    }
    Some(sum_pv / sum_v)
}

/// Signed fractional distance from VWAP: `(price - vwap) / vwap`.
///
/// Zero when VWAP is unknown or non-positive; the neutral value keeps a
/// missing signal from biasing the decision.
pub fn dist_vwap(price: f64, vwap: Option<f64>) -> f64 {
    match vwap {
        Some(v) if v > 0.0 => (price - v) / v,
        _ => 0.0,
    }
}

/// Distance from VWAP in volatility units.
///
/// Sigma is the standard deviation of 1-minute close returns over the
/// trailing hour, scaled to price level by the VWAP. `None` when VWAP is
/// unknown or non-positive, fewer than two returns exist, or sigma is
/// non-positive.
pub fn dist_vwap_z(price: f64, vwap: Option<f64>, candles: &[Candle], now: i64) -> Option<f64> {
    let vwap = vwap.filter(|v| *v > 0.0)?;
    let cutoff = now - MS_1H;
    let mut in_window: Vec<Candle> = candles
        .iter()
        .filter(|c| c.ts >= cutoff)
        .copied()
        .collect();
    in_window.sort_by_key(|c| c.ts);

    let returns = close_returns(&in_window);
    if returns.len() < 2 {
        return None;
    }
    let sigma = sample_variance(&returns).sqrt() * vwap;
    if sigma <= 0.0 {
        return None;
    }
    Some((price - vwap) / sigma)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(ts: i64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            ts,
            open: close,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn test_vwap_none_on_empty_window() {
        assert_eq!(vwap_1h(&[], 1_000_000), None);

        let now = 10_000_000;
        let stale = vec![candle(now - 2 * MS_1H, 100.0, 100.0, 100.0, 5.0)];
        assert_eq!(vwap_1h(&stale, now), None);
    }

    #[test]
    fn test_vwap_none_on_zero_volume() {
        let now = 10_000_000;
        let candles = vec![candle(now - 60_000, 100.0, 100.0, 100.0, 0.0)];
        assert_eq!(vwap_1h(&candles, now), None);
    }

    #[test]
    fn test_vwap_weights_by_volume() {
        let now = 10_000_000;
        // Typical prices 100 and 106, volumes 1 and 2 -> (100 + 212) / 3 = 104
        let candles = vec![
            candle(now - 120_000, 100.0, 100.0, 100.0, 1.0),
            candle(now - 60_000, 106.0, 106.0, 106.0, 2.0),
        ];
        let v = vwap_1h(&candles, now).unwrap();
        assert!((v - 104.0).abs() < 1e-9);
    }

    #[test]
    fn test_dist_vwap_neutral_on_missing() {
        assert_eq!(dist_vwap(100.0, None), 0.0);
        assert_eq!(dist_vwap(100.0, Some(0.0)), 0.0);
        assert_eq!(dist_vwap(100.0, Some(-1.0)), 0.0);
    }

    #[test]
    fn test_dist_vwap_fraction() {
        let d = dist_vwap(102.0, Some(100.0));
        assert!((d - 0.02).abs() < 1e-12);
        let d = dist_vwap(98.0, Some(100.0));
        assert!((d + 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_z_requires_two_returns() {
        let now = 10_000_000;
        let candles = vec![
            candle(now - 120_000, 100.0, 100.0, 100.0, 1.0),
            candle(now - 60_000, 101.0, 101.0, 101.0, 1.0),
        ];
        // Two candles -> one return -> insufficient
        assert_eq!(dist_vwap_z(101.0, Some(100.0), &candles, now), None);
    }

    #[test]
    fn test_z_none_on_flat_sigma() {
        let now = 10_000_000;
        let candles: Vec<Candle> = (1..=5)
            .map(|i| candle(now - i * 60_000, 100.0, 100.0, 100.0, 1.0))
            .collect();
        assert_eq!(dist_vwap_z(100.0, Some(100.0), &candles, now), None);
    }

    #[test]
    fn test_z_sign_follows_distance() {
        let now = 10_000_000;
        let closes = [100.0, 101.0, 99.5, 100.5, 100.0];
        let candles: Vec<Candle> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| candle(now - (5 - i as i64) * 60_000, c, c, c, 1.0))
            .collect();
        let above = dist_vwap_z(101.0, Some(100.0), &candles, now).unwrap();
        let below = dist_vwap_z(99.0, Some(100.0), &candles, now).unwrap();
        assert!(above > 0.0);
        assert!(below < 0.0);
        assert!((above + below).abs() < 1e-9);
    }
}
