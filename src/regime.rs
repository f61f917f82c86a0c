//! Regime classifier
//!
//! Deterministic, priority-ordered rule chain evaluated each tick. Pure
//! function of the feature vector plus two externally supplied transient
//! signals: a post-liquidation-spike flag and a short/long variance ratio.
//!
//! Every classification stamps `entered_at` with the evaluation timestamp;
//! callers that need true time-in-regime must memoize label changes across
//! ticks themselves (see [`crate::runner::RegimeTracker`]).

use crate::config::Thresholds;
use crate::types::{Direction, FeatureVector, Regime, RegimeState, RejectReason};

/// Inputs to one classification call.
#[derive(Debug, Clone, Copy)]
pub struct RegimeInput<'a> {
    pub features: &'a FeatureVector,
    /// Set when a liquidation-style spike was just detected.
    pub post_liquidation_spike: bool,
    /// Externally computed sigma_short^2 / sigma_long^2; defaults to 1.0.
    pub variance_ratio: Option<f64>,
}

impl<'a> RegimeInput<'a> {
    pub fn from_features(features: &'a FeatureVector) -> Self {
        Self {
            features,
            post_liquidation_spike: false,
            variance_ratio: None,
        }
    }
}

/// Classify the current regime. First matching rule wins:
///
/// 1. liquidation spike flag -> `post_liquidation`
/// 2. compression score at threshold -> `vol_compression`
/// 3. strong CVD with variance ratio >= 0.7 -> `trending`
/// 4. mid-range position with some compression -> `ranging`
/// 5. otherwise `unknown`
pub fn classify(input: RegimeInput<'_>, config: &Thresholds) -> RegimeState {
    let features = input.features;
    let now = features.ts;
    let state = |regime| RegimeState {
        regime,
        ts: now,
        entered_at: now,
    };

    if input.post_liquidation_spike {
        return state(Regime::PostLiquidation);
    }

    if features.vol_compress >= config.vol_compress {
        return state(Regime::VolCompression);
    }

    let variance_ratio = input.variance_ratio.unwrap_or(1.0);
    if features.cvd_ratio_60.abs() >= config.cvd_trending && variance_ratio >= 0.7 {
        return state(Regime::Trending);
    }

    let at_extreme =
        features.range_pos <= config.range_low || features.range_pos >= config.range_high;
    if !at_extreme && features.vol_compress > 0.2 {
        return state(Regime::Ranging);
    }

    state(Regime::Unknown)
}

/// Whether the post-liquidation cooldown is still active at `now`.
pub fn in_post_liq_cooldown(state: &RegimeState, now: i64, config: &Thresholds) -> bool {
    if state.regime != Regime::PostLiquidation {
        return false;
    }
    let elapsed_sec = (now - state.entered_at) / 1000;
    elapsed_sec < config.post_liq_cooldown_sec
}

/// Regime-specific trade permission. `None` means allowed.
///
/// `post_liquidation` always rejects. `ranging` permits only at the range
/// extreme matching the direction with CVD confirming that side; everything
/// else (including `vol_compression`, where the caller sizes down instead of
/// blocking) permits unconditionally.
pub fn regime_gate(
    regime: Regime,
    features: &FeatureVector,
    direction: Direction,
    config: &Thresholds,
) -> Option<RejectReason> {
    match regime {
        Regime::PostLiquidation => Some(RejectReason::PostLiquidationCooldown),
        Regime::Ranging => {
            let at_low = features.range_pos <= config.range_low;
            let at_high = features.range_pos >= config.range_high;
            let flow_confirms = match direction {
                Direction::Up => features.cvd_ratio_60 > config.obi_confirm,
                Direction::Down => features.cvd_ratio_60 < -config.obi_confirm,
                Direction::NoTrade => false,
            };
            let allowed = flow_confirms
                && ((at_low && direction == Direction::Up)
                    || (at_high && direction == Direction::Down));
            if allowed {
                None
            } else {
                Some(RejectReason::RangingNoExtremeFlow)
            }
        }
        _ => None,
    }
}
