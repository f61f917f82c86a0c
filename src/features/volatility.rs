//! Volatility compression score from 1-minute close returns

use crate::types::Candle;

/// Sample variance (n - 1 denominator), 0 with fewer than two points.
pub(crate) fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Simple returns between consecutive closes, skipping non-positive bases.
pub(crate) fn close_returns(candles: &[Candle]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(candles.len().saturating_sub(1));
    for pair in candles.windows(2) {
        let prev = pair[0].close;
        if prev <= 0.0 {
            continue;
        }
        returns.push((pair[1].close - prev) / prev);
    }
    returns
}

/// Volatility compression score in [0, 1]: `1 - var_short / var_long`.
///
/// High means volatility is shrinking. The short window is a subset of the
/// long one. Zero when the long-window variance is non-positive.
pub fn vol_compress_score(
    candles: &[Candle],
    now: i64,
    short_window_sec: u64,
    long_window_sec: u64,
) -> f64 {
    let cutoff_long = now - long_window_sec as i64 * 1000;
    let cutoff_short = now - short_window_sec as i64 * 1000;

    let in_long: Vec<Candle> = candles
        .iter()
        .filter(|c| c.ts >= cutoff_long)
        .copied()
        .collect();
    let in_short: Vec<Candle> = in_long
        .iter()
        .filter(|c| c.ts >= cutoff_short)
        .copied()
        .collect();

    let var_long = sample_variance(&close_returns(&in_long));
    let var_short = sample_variance(&close_returns(&in_short));

    if var_long <= 0.0 {
        return 0.0;
    }
    (1.0 - var_short / var_long).clamp(0.0, 1.0)
}
