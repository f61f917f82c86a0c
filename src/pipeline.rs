//! One-shot decision pipeline
//!
//! features -> regime -> P(up) -> decision. Synchronous and side-effect
//! free; every run is independent, so concurrent runs for different ticks or
//! symbols need no coordination.

use crate::config::{RiskLimitsPatch, ThresholdsPatch};
use crate::decision::{decide, heuristic_p_up};
use crate::features::{FeatureInputs, compute_features};
use crate::regime::{RegimeInput, classify};
use crate::types::{Decision, FeatureVector, RegimeState};

/// Where P(up) comes from.
#[derive(Debug, Clone, Copy, Default)]
pub enum ProbabilitySource {
    /// Built-in feature heuristic.
    #[default]
    Heuristic,
    /// Externally supplied model output.
    Model(f64),
}

/// Feature inputs plus the transient regime signals.
#[derive(Debug, Clone, Default)]
pub struct PipelineInput {
    pub market: FeatureInputs,
    /// Set when a liquidation-style spike was just detected.
    pub post_liquidation_spike: bool,
    /// Externally computed short/long variance ratio for the classifier.
    pub variance_ratio: Option<f64>,
}

/// Per-run configuration: threshold/risk overrides and probability source.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineConfig {
    pub thresholds: ThresholdsPatch,
    pub risk: RiskLimitsPatch,
    pub probability: ProbabilitySource,
}

/// Everything one run produces; the intermediates are kept for logging.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub features: FeatureVector,
    pub regime: RegimeState,
    pub decision: Decision,
}

/// Run the full pipeline for one tick.
pub fn run_pipeline(input: &PipelineInput, config: &PipelineConfig) -> PipelineOutput {
    let thresholds = config.thresholds.merged();
    let risk = config.risk.merged();

    let features = compute_features(&input.market);
    let regime = classify(
        RegimeInput {
            features: &features,
            post_liquidation_spike: input.post_liquidation_spike,
            variance_ratio: input.variance_ratio,
        },
        &thresholds,
    );
    let p_up = match config.probability {
        ProbabilitySource::Heuristic => heuristic_p_up(&features),
        ProbabilitySource::Model(p) => p,
    };
    let decision = decide(&features, &regime, p_up, &thresholds, &risk);

    PipelineOutput {
        features,
        regime,
        decision,
    }
}
