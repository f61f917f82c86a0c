//! Thresholds and risk limits
//!
//! Two flat parameter sets with documented defaults. Per-call overrides are
//! expressed as patch types with all-optional fields merged onto the
//! defaults; tune on validation data, not test data.

use serde::{Deserialize, Serialize};

/// Decision and regime thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// P(up) at or above this resolves UP; at or below `1 - p_high`, DOWN.
    pub p_high: f64,
    /// Minimum max(P(up), 1 - P(up)) to trade at all.
    pub p_confidence: f64,
    /// |CVD ratio| at or above this qualifies as trending flow.
    pub cvd_trending: f64,
    /// Compression score at or above this labels the vol_compression regime.
    pub vol_compress: f64,
    /// |OBI| (and CVD in ranging) required to confirm a direction.
    pub obi_confirm: f64,
    /// Range position at or below this counts as the low extreme.
    pub range_low: f64,
    /// Range position at or above this counts as the high extreme.
    pub range_high: f64,
    /// Post-liquidation cooldown in seconds.
    pub post_liq_cooldown_sec: i64,
    /// Short variance window in seconds.
    pub vol_short_window_sec: u64,
    /// Long variance window in seconds.
    pub vol_long_window_sec: u64,
    /// Exponential decay per basis-point tick for the weighted OBI.
    pub obi_lambda: f64,
    /// Levels per side for the simple OBI.
    pub obi_levels: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            p_high: 0.58,
            p_confidence: 0.58,
            cvd_trending: 0.15,
            vol_compress: 0.4,
            obi_confirm: 0.05,
            range_low: 0.2,
            range_high: 0.8,
            post_liq_cooldown_sec: 180,
            vol_short_window_sec: 60,
            vol_long_window_sec: 300,
            obi_lambda: 0.2,
            obi_levels: 5,
        }
    }
}

/// Position sizing limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Hard cap on the size multiplier.
    pub max_size_multiplier: f64,
    /// ATR multiple for stop placement (consumed by execution, not here).
    pub stop_atr_multiple: f64,
    /// Trade rate limit (consumed by execution, not here).
    pub max_trades_per_hour: u32,
    /// Cap on the inverse-volatility scaling factor.
    pub vol_scale_cap: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_size_multiplier: 1.0,
            stop_atr_multiple: 1.5,
            max_trades_per_hour: 12,
            vol_scale_cap: 2.0,
        }
    }
}

/// Partial override for [`Thresholds`]; unset fields keep the base value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThresholdsPatch {
    pub p_high: Option<f64>,
    pub p_confidence: Option<f64>,
    pub cvd_trending: Option<f64>,
    pub vol_compress: Option<f64>,
    pub obi_confirm: Option<f64>,
    pub range_low: Option<f64>,
    pub range_high: Option<f64>,
    pub post_liq_cooldown_sec: Option<i64>,
    pub vol_short_window_sec: Option<u64>,
    pub vol_long_window_sec: Option<u64>,
    pub obi_lambda: Option<f64>,
    pub obi_levels: Option<usize>,
}

impl ThresholdsPatch {
    /// Merge this patch onto `base`.
    pub fn apply_to(&self, base: Thresholds) -> Thresholds {
        Thresholds {
            p_high: self.p_high.unwrap_or(base.p_high),
            p_confidence: self.p_confidence.unwrap_or(base.p_confidence),
            cvd_trending: self.cvd_trending.unwrap_or(base.cvd_trending),
            vol_compress: self.vol_compress.unwrap_or(base.vol_compress),
            obi_confirm: self.obi_confirm.unwrap_or(base.obi_confirm),
            range_low: self.range_low.unwrap_or(base.range_low),
            range_high: self.range_high.unwrap_or(base.range_high),
            post_liq_cooldown_sec: self
                .post_liq_cooldown_sec
                .unwrap_or(base.post_liq_cooldown_sec),
            vol_short_window_sec: self
                .vol_short_window_sec
                .unwrap_or(base.vol_short_window_sec),
            vol_long_window_sec: self.vol_long_window_sec.unwrap_or(base.vol_long_window_sec),
            obi_lambda: self.obi_lambda.unwrap_or(base.obi_lambda),
            obi_levels: self.obi_levels.unwrap_or(base.obi_levels),
        }
    }

    /// Merge onto the documented defaults.
    pub fn merged(&self) -> Thresholds {
        self.apply_to(Thresholds::default())
    }
}

/// Partial override for [`RiskLimits`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskLimitsPatch {
    pub max_size_multiplier: Option<f64>,
    pub stop_atr_multiple: Option<f64>,
    pub max_trades_per_hour: Option<u32>,
    pub vol_scale_cap: Option<f64>,
}

impl RiskLimitsPatch {
    pub fn apply_to(&self, base: RiskLimits) -> RiskLimits {
        RiskLimits {
            max_size_multiplier: self.max_size_multiplier.unwrap_or(base.max_size_multiplier),
            stop_atr_multiple: self.stop_atr_multiple.unwrap_or(base.stop_atr_multiple),
            max_trades_per_hour: self.max_trades_per_hour.unwrap_or(base.max_trades_per_hour),
            vol_scale_cap: self.vol_scale_cap.unwrap_or(base.vol_scale_cap),
        }
    }

    pub fn merged(&self) -> RiskLimits {
        self.apply_to(RiskLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let th = Thresholds::default();
        assert_eq!(th.p_high, 0.58);
        assert_eq!(th.p_confidence, 0.58);
        assert_eq!(th.post_liq_cooldown_sec, 180);
        assert_eq!(th.obi_levels, 5);

        let risk = RiskLimits::default();
        assert_eq!(risk.max_size_multiplier, 1.0);
        assert_eq!(risk.vol_scale_cap, 2.0);
    }

    #[test]
    fn test_patch_merges_only_set_fields() {
        let patch = ThresholdsPatch {
            p_high: Some(0.65),
            obi_levels: Some(10),
            ..Default::default()
        };
        let merged = patch.merged();
        assert_eq!(merged.p_high, 0.65);
        assert_eq!(merged.obi_levels, 10);
        // Untouched fields keep defaults
        assert_eq!(merged.p_confidence, 0.58);
        assert_eq!(merged.cvd_trending, 0.15);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        assert_eq!(ThresholdsPatch::default().merged(), Thresholds::default());
        assert_eq!(RiskLimitsPatch::default().merged(), RiskLimits::default());
    }

    #[test]
    fn test_risk_patch() {
        let patch = RiskLimitsPatch {
            max_size_multiplier: Some(0.5),
            ..Default::default()
        };
        let merged = patch.merged();
        assert_eq!(merged.max_size_multiplier, 0.5);
        assert_eq!(merged.stop_atr_multiple, 1.5);
    }
}
