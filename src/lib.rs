//! Short-horizon direction signal for a crypto perpetual-futures market
//!
//! Microstructure-driven: CVD, order book imbalance, open interest delta,
//! volatility compression, range position, and VWAP distance feed a regime
//! classifier and a gated decision engine that emits UP / DOWN / NO_TRADE
//! with a position-size multiplier.
//!
//! The decision pipeline ([`pipeline::run_pipeline`]) is synchronous, pure,
//! and total: missing signals degrade to neutral values and bias the outcome
//! toward `NO_TRADE` instead of erroring. I/O lives at the edges — the
//! [`data`] module polls the exchange, the [`runner`] schedules ticks and
//! logs outcomes.

pub mod config;
pub mod data;
pub mod decision;
pub mod features;
pub mod pipeline;
pub mod regime;
pub mod runner;
pub mod types;

pub use config::{RiskLimits, RiskLimitsPatch, Thresholds, ThresholdsPatch};
pub use decision::{decide, heuristic_p_up, size_by_volatility};
pub use features::{FeatureInputs, compute_features};
pub use pipeline::{PipelineConfig, PipelineInput, PipelineOutput, ProbabilitySource, run_pipeline};
pub use regime::{RegimeInput, classify, in_post_liq_cooldown, regime_gate};
pub use types::{
    BookLevel, Candle, Decision, Direction, FeatureVector, OiPoint, OrderBookSnapshot, Regime,
    RegimeState, RejectReason, Side, Trade,
};
