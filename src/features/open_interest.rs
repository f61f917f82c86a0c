//! Open interest delta over the trailing minute

use crate::types::OiPoint;

const MS_1M: i64 = 60_000;
/// Nearest-neighbor tolerance: 1.5x the 1-minute window.
const TOLERANCE_MS: i64 = 90_000;

/// 1-minute open interest change in percent.
///
/// Looks up the series at `now` and `now - 60s` by nearest neighbor within
/// a 90s tolerance. `None` when either point is unresolvable, when both
/// lookups collapse onto the same observation (a single point cannot anchor
/// a delta), or when the past value is non-positive.
pub fn oi_delta_pct_1m(series: &[OiPoint], now: i64) -> Option<f64> {
    let current_idx = nearest(series, now)?;
    let past_idx = nearest(series, now - MS_1M)?;
    if current_idx == past_idx {
        return None;
    }
    let current = &series[current_idx];
    let past = &series[past_idx];
    if past.oi <= 0.0 {
        return None;
    }
    Some((current.oi - past.oi) / past.oi * 100.0)
}

/// Second difference of the 1m delta: delta(now) - delta(now - 60s).
///
/// `None` whenever either input delta is.
pub fn oi_acceleration(series: &[OiPoint], now: i64) -> Option<f64> {
    let now_pct = oi_delta_pct_1m(series, now)?;
    let past_pct = oi_delta_pct_1m(series, now - MS_1M)?;
    Some(now_pct - past_pct)
}

/// Index of the series entry closest to `at`, within tolerance.
fn nearest(series: &[OiPoint], at: i64) -> Option<usize> {
    series
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| (p.ts - at).abs())
        .filter(|(_, p)| (p.ts - at).abs() <= TOLERANCE_MS)
        .map(|(i, _)| i)
}
