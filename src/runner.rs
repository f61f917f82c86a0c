//! Prediction runner
//!
//! Predicts every minute, resolves each directional prediction against the
//! price five minutes later, and keeps a JSON-lines log of outcomes plus a
//! rolling accuracy summary. Everything here is glue around the pipeline;
//! state lives in memory only and does not survive a restart.

use crate::config::{RiskLimits, Thresholds};
use crate::data::MarketDataSource;
use crate::decision::{decide, heuristic_p_up};
use crate::features::compute_features;
use crate::pipeline::{PipelineConfig, ProbabilitySource};
use crate::regime::{RegimeInput, classify};
use crate::types::{Direction, Regime, RegimeState};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

const RESULTS_FILE: &str = "results.jsonl";
const ACCURACY_FILE: &str = "accuracy.json";
/// How many resolved results the accuracy summary retains.
const SUMMARY_TAIL: usize = 50;

/// Runner settings.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub symbol: String,
    /// Prediction interval.
    pub interval: Duration,
    /// How long after a prediction it is resolved.
    pub resolve_after_ms: i64,
    pub log_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval: Duration::from_secs(60),
            resolve_after_ms: 5 * 60_000,
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// Retains the previous regime state so `entered_at` survives across ticks
/// while the label is unchanged.
///
/// The classifier stamps `entered_at = now` on every call by design; without
/// this memoization the post-liquidation cooldown would reset every tick.
#[derive(Debug, Default)]
pub struct RegimeTracker {
    previous: Option<RegimeState>,
}

impl RegimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a freshly classified state into the tracked one.
    pub fn observe(&mut self, fresh: RegimeState) -> RegimeState {
        let tracked = match self.previous {
            Some(prev) if prev.regime == fresh.regime => RegimeState {
                entered_at: prev.entered_at,
                ..fresh
            },
            _ => fresh,
        };
        self.previous = Some(tracked);
        tracked
    }

    pub fn current(&self) -> Option<&RegimeState> {
        self.previous.as_ref()
    }
}

/// A prediction waiting to be resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPrediction {
    pub ts: i64,
    pub direction: Direction,
    pub price_at_predict: f64,
    pub p_up: f64,
    pub regime: Regime,
    pub confidence: f64,
}

/// A resolved prediction, one line of `results.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedResult {
    pub ts_predict: i64,
    pub ts_resolve: i64,
    pub prediction: Direction,
    pub actual: Direction,
    pub correct: bool,
    pub price_at_predict: f64,
    pub price_at_resolve: f64,
    pub p_up: f64,
    pub regime: Regime,
}

/// Rolling accuracy summary, rewritten to `accuracy.json` on every
/// resolution batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracySummary {
    pub updated_at: String,
    pub total_directional_predictions: usize,
    pub correct: usize,
    /// Percent, two decimals.
    pub accuracy_rate: f64,
    pub results: Vec<ResolvedResult>,
}

/// Drives the pipeline on a fixed interval against a market data source.
pub struct Runner<S: MarketDataSource> {
    source: S,
    config: RunnerConfig,
    pipeline: PipelineConfig,
    regimes: RegimeTracker,
    pending: Vec<PendingPrediction>,
    resolved: Vec<ResolvedResult>,
}

impl<S: MarketDataSource> Runner<S> {
    pub fn new(source: S, config: RunnerConfig) -> Self {
        Self::with_pipeline(source, config, PipelineConfig::default())
    }

    pub fn with_pipeline(source: S, config: RunnerConfig, pipeline: PipelineConfig) -> Self {
        Self {
            source,
            config,
            pipeline,
            regimes: RegimeTracker::new(),
            pending: Vec::new(),
            resolved: Vec::new(),
        }
    }

    pub fn pending(&self) -> &[PendingPrediction] {
        &self.pending
    }

    pub fn resolved(&self) -> &[ResolvedResult] {
        &self.resolved
    }

    /// Tick forever at the configured interval.
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!(
            "runner started: symbol={} interval={:?} resolve_after={}s results={}",
            self.config.symbol,
            self.config.interval,
            self.config.resolve_after_ms / 1000,
            self.config.log_dir.join(RESULTS_FILE).display(),
        );
        let mut interval = tokio::time::interval(self.config.interval);
        loop {
            interval.tick().await;
            let now = chrono::Utc::now().timestamp_millis();
            self.tick(now).await;
        }
    }

    /// One predict-and-resolve cycle. Fetch failures skip the tick; a live
    /// loop must never die because one poll failed.
    pub async fn tick(&mut self, now: i64) {
        let snapshot = match self.source.market_snapshot(&self.config.symbol).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("tick skipped, fetch failed: {}", err);
                return;
            }
        };
        let current_price = snapshot.current_price;

        let thresholds: Thresholds = self.pipeline.thresholds.merged();
        let risk: RiskLimits = self.pipeline.risk.merged();

        // Staged pipeline run: the tracked regime state (not the fresh
        // classification) feeds the cooldown check
        let features = compute_features(&snapshot);
        let fresh = classify(RegimeInput::from_features(&features), &thresholds);
        let regime = self.regimes.observe(fresh);
        let p_up = match self.pipeline.probability {
            ProbabilitySource::Heuristic => heuristic_p_up(&features),
            ProbabilitySource::Model(p) => p,
        };
        let decision = decide(&features, &regime, p_up, &thresholds, &risk);

        self.pending.push(PendingPrediction {
            ts: now,
            direction: decision.direction,
            price_at_predict: current_price,
            p_up: decision.p_up,
            regime: decision.regime,
            confidence: decision.confidence,
        });

        match decision.reason {
            Some(reason) => info!(
                "predict direction={} p_up={:.3} price={} regime={} reason={}",
                decision.direction, decision.p_up, current_price, decision.regime, reason
            ),
            None => info!(
                "predict direction={} p_up={:.3} price={} regime={} size={:.2}",
                decision.direction,
                decision.p_up,
                current_price,
                decision.regime,
                decision.size_multiplier
            ),
        }

        if current_price > 0.0 {
            self.resolve_due(current_price, now);
        }
    }

    /// Resolve predictions older than the resolution horizon. Expired
    /// `NO_TRADE` entries are dropped unscored.
    pub fn resolve_due(&mut self, current_price: f64, now: i64) {
        let cutoff = now - self.config.resolve_after_ms;
        let mut due = Vec::new();
        self.pending.retain(|p| {
            if p.ts > cutoff {
                return true;
            }
            if p.direction != Direction::NoTrade {
                due.push(p.clone());
            }
            false
        });

        if due.is_empty() {
            return;
        }

        for p in due {
            let actual = if current_price > p.price_at_predict {
                Direction::Up
            } else {
                Direction::Down
            };
            let result = ResolvedResult {
                ts_predict: p.ts,
                ts_resolve: now,
                prediction: p.direction,
                actual,
                correct: actual == p.direction,
                price_at_predict: p.price_at_predict,
                price_at_resolve: current_price,
                p_up: p.p_up,
                regime: p.regime,
            };
            info!(
                "resolve prediction={} actual={} correct={} predict_price={} resolve_price={}",
                result.prediction,
                result.actual,
                result.correct,
                result.price_at_predict,
                result.price_at_resolve
            );
            if let Err(err) = self.append_result(&result) {
                warn!("could not append result line: {}", err);
            }
            self.resolved.push(result);
        }

        let summary = self.accuracy_summary();
        info!(
            "accuracy {}/{} correct -> {:.2}%",
            summary.correct, summary.total_directional_predictions, summary.accuracy_rate
        );
        if let Err(err) = self.write_accuracy(&summary) {
            warn!("could not write accuracy summary: {}", err);
        }
    }

    /// Accuracy over everything resolved so far.
    pub fn accuracy_summary(&self) -> AccuracySummary {
        let total = self.resolved.len();
        let correct = self.resolved.iter().filter(|r| r.correct).count();
        let rate = if total > 0 {
            correct as f64 / total as f64
        } else {
            0.0
        };
        let tail_start = total.saturating_sub(SUMMARY_TAIL);
        AccuracySummary {
            updated_at: chrono::Utc::now().to_rfc3339(),
            total_directional_predictions: total,
            correct,
            accuracy_rate: (rate * 10_000.0).round() / 100.0,
            results: self.resolved[tail_start..].to_vec(),
        }
    }

    fn append_result(&self, result: &ResolvedResult) -> anyhow::Result<()> {
        fs::create_dir_all(&self.config.log_dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.config.log_dir.join(RESULTS_FILE))?;
        writeln!(file, "{}", serde_json::to_string(result)?)?;
        Ok(())
    }

    fn write_accuracy(&self, summary: &AccuracySummary) -> anyhow::Result<()> {
        fs::create_dir_all(&self.config.log_dir)?;
        fs::write(
            self.config.log_dir.join(ACCURACY_FILE),
            serde_json::to_string_pretty(summary)?,
        )?;
        Ok(())
    }
}
