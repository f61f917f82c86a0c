//! Cumulative volume delta over rolling trade windows

use crate::types::{Side, Trade};

const MS_60S: i64 = 60_000;
const MS_30S: i64 = 30_000;

/// Signed volume delta and total volume for trades with `ts >= now - window_ms`.
///
/// Buy aggressors count positive, sell aggressors negative. Tolerates
/// unordered input; filtering is by timestamp comparison only.
pub fn cvd_and_volume(trades: &[Trade], now: i64, window_ms: i64) -> (f64, f64) {
    let cutoff = now - window_ms;
    let mut cvd = 0.0;
    let mut total_volume = 0.0;
    for trade in trades {
        if trade.ts < cutoff {
            continue;
        }
        match trade.side {
            Side::Buy => cvd += trade.size,
            Side::Sell => cvd -= trade.size,
        }
        total_volume += trade.size;
    }
    (cvd, total_volume)
}

/// CVD ratio over the trailing 60s: CVD / total volume, clamped to [-1, 1].
///
/// Zero when the window traded no volume.
pub fn cvd_ratio_60(trades: &[Trade], now: i64) -> f64 {
    let (cvd, total_volume) = cvd_and_volume(trades, now, MS_60S);
    if total_volume <= 0.0 {
        return 0.0;
    }
    (cvd / total_volume).clamp(-1.0, 1.0)
}

/// Flow acceleration: CVD(last 30s) - CVD(prior 30s).
///
/// The prior window is `[now - 60s, now - 30s)`. Always computable; yields 0
/// with no data.
pub fn cvd_acceleration(trades: &[Trade], now: i64) -> f64 {
    let (recent, _) = cvd_and_volume(trades, now, MS_30S);
    let prior = cvd_between(trades, now - MS_60S, now - MS_30S);
    recent - prior
}

/// Signed volume delta for trades with `start <= ts < end`.
fn cvd_between(trades: &[Trade], start: i64, end: i64) -> f64 {
    let mut cvd = 0.0;
    for trade in trades {
        if trade.ts < start || trade.ts >= end {
            continue;
        }
        match trade.side {
            Side::Buy => cvd += trade.size,
            Side::Sell => cvd -= trade.size,
        }
    }
    cvd
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(ts: i64, size: f64, side: Side) -> Trade {
        Trade {
            ts,
            price: 100.0,
            size,
            side,
        }
    }

    #[test]
    fn test_zero_volume_gives_zero_ratio() {
        assert_eq!(cvd_ratio_60(&[], 1_000_000), 0.0);

        // Trades exist but all outside the window
        let trades = vec![trade(0, 5.0, Side::Buy)];
        assert_eq!(cvd_ratio_60(&trades, 1_000_000), 0.0);
    }

    #[test]
    fn test_ratio_is_bounded() {
        let now = 100_000;
        let all_buys = vec![trade(now - 1000, 3.0, Side::Buy), trade(now, 2.0, Side::Buy)];
        assert_eq!(cvd_ratio_60(&all_buys, now), 1.0);

        let all_sells = vec![trade(now - 1000, 4.0, Side::Sell)];
        assert_eq!(cvd_ratio_60(&all_sells, now), -1.0);
    }

    #[test]
    fn test_ratio_mixed_flow() {
        let now = 100_000;
        // +3 buy, -1 sell over 4 total volume -> 0.5
        let trades = vec![
            trade(now - 5000, 3.0, Side::Buy),
            trade(now - 2000, 1.0, Side::Sell),
        ];
        let ratio = cvd_ratio_60(&trades, now);
        assert!((ratio - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_window_filter_by_timestamp_only() {
        let now = 200_000;
        // Unordered input: old sell first in the slice but outside the window
        let trades = vec![
            trade(now - 120_000, 50.0, Side::Sell),
            trade(now - 10_000, 1.0, Side::Buy),
        ];
        assert_eq!(cvd_ratio_60(&trades, now), 1.0);
    }

    #[test]
    fn test_acceleration_splits_windows() {
        let now = 100_000;
        // Prior half: 2 buy. Recent half: 5 buy. Accel = 5 - 2 = 3.
        let trades = vec![
            trade(now - 45_000, 2.0, Side::Buy),
            trade(now - 10_000, 5.0, Side::Buy),
        ];
        let accel = cvd_acceleration(&trades, now);
        assert!((accel - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_acceleration_sign_flip() {
        let now = 100_000;
        // Buying earlier, selling now -> negative acceleration
        let trades = vec![
            trade(now - 40_000, 4.0, Side::Buy),
            trade(now - 5_000, 4.0, Side::Sell),
        ];
        let accel = cvd_acceleration(&trades, now);
        assert!((accel - (-8.0)).abs() < 1e-12);
    }

    #[test]
    fn test_acceleration_empty_is_zero() {
        assert_eq!(cvd_acceleration(&[], 50_000), 0.0);
    }
}
