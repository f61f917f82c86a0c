//! Decision engine
//!
//! Converts a probability estimate plus regime plus feature vector into a
//! gated trade decision with a position-size multiplier. A single evaluation
//! step per tick; all cross-tick context arrives through the externally
//! owned [`RegimeState`]. Every gate exits early with `NO_TRADE` and its own
//! reason code, so a missing or weak signal biases toward not trading rather
//! than erroring.

use crate::config::{RiskLimits, Thresholds};
use crate::regime::{in_post_liq_cooldown, regime_gate};
use crate::types::{Decision, Direction, FeatureVector, Regime, RegimeState, RejectReason};

/// Baseline P(up) from features, no model required.
///
/// Linear in CVD ratio and OBI, with step adjustments for range extremes,
/// VWAP mean reversion, OI/flow agreement, and flow acceleration. Clamped to
/// [0.05, 0.95] so the heuristic never claims certainty. Replace with model
/// output via [`crate::pipeline::ProbabilitySource::Model`].
pub fn heuristic_p_up(features: &FeatureVector) -> f64 {
    let mut score = 0.5;

    score += features.cvd_ratio_60 * 0.25;
    score += features.obi * 0.2;

    if features.range_pos > 0.8 {
        score += 0.1;
    }
    if features.range_pos < 0.2 {
        score -= 0.1;
    }

    // Stretch from VWAP argues for reversion
    if features.dist_vwap > 0.002 {
        score -= 0.08;
    }
    if features.dist_vwap < -0.002 {
        score += 0.08;
    }

    // OI building in the direction of flow confirms it
    if features.oi_delta_pct_1m > 0.0 && features.cvd_ratio_60 > 0.0 {
        score += 0.05;
    }
    if features.oi_delta_pct_1m < 0.0 && features.cvd_ratio_60 < 0.0 {
        score -= 0.05;
    }

    match features.cvd_accel {
        Some(accel) if accel > 0.0 => score += 0.03,
        Some(accel) if accel < 0.0 => score -= 0.03,
        _ => {}
    }

    score.clamp(0.05, 0.95)
}

/// Run the gate chain and size the trade.
///
/// Gates in order: probability threshold, confidence, post-liquidation
/// cooldown, OBI flow confirmation, regime permission. On success the size
/// multiplier starts at the confidence, is haircut in `vol_compression`
/// (x0.5) and `ranging` (x0.7), and is capped at the configured maximum.
pub fn decide(
    features: &FeatureVector,
    regime_state: &RegimeState,
    p_up: f64,
    thresholds: &Thresholds,
    risk: &RiskLimits,
) -> Decision {
    let now = features.ts;
    let confidence = p_up.max(1.0 - p_up);
    let no_trade = |reason: RejectReason| Decision {
        direction: Direction::NoTrade,
        p_up,
        ts: now,
        regime: regime_state.regime,
        confidence,
        size_multiplier: 0.0,
        reason: Some(reason),
    };

    let direction = if p_up >= thresholds.p_high {
        Direction::Up
    } else if p_up <= 1.0 - thresholds.p_high {
        Direction::Down
    } else {
        return no_trade(RejectReason::BelowProbabilityThreshold);
    };

    if confidence < thresholds.p_confidence {
        return no_trade(RejectReason::BelowConfidenceGate);
    }

    if in_post_liq_cooldown(regime_state, now, thresholds) {
        return no_trade(RejectReason::PostLiquidationCooldown);
    }

    let obi_aligned = match direction {
        Direction::Up => features.obi >= thresholds.obi_confirm,
        Direction::Down => features.obi <= -thresholds.obi_confirm,
        Direction::NoTrade => false,
    };
    if !obi_aligned {
        return no_trade(RejectReason::ObiNotConfirming);
    }

    if let Some(reason) = regime_gate(regime_state.regime, features, direction, thresholds) {
        return no_trade(reason);
    }

    let mut size_multiplier = confidence;
    match regime_state.regime {
        Regime::VolCompression => size_multiplier *= 0.5,
        Regime::Ranging => size_multiplier *= 0.7,
        _ => {}
    }
    size_multiplier = size_multiplier.min(risk.max_size_multiplier);

    Decision {
        direction,
        p_up,
        ts: now,
        regime: regime_state.regime,
        confidence,
        size_multiplier,
        reason: None,
    }
}

/// Scale a base multiplier by inverse volatility, both caps applied.
///
/// The caller supplies `1 / vol` (or `1 / ATR`); the factor is capped at
/// `vol_scale_cap` and the result at `max_size_multiplier`.
pub fn size_by_volatility(base_multiplier: f64, inv_vol: f64, risk: &RiskLimits) -> f64 {
    let scaled = base_multiplier * inv_vol.min(risk.vol_scale_cap);
    scaled.min(risk.max_size_multiplier)
}
