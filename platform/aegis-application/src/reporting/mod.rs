use crate::shared::to_hex;
use chrono::{DateTime, SecondsFormat, Utc};
use aegis_domain::entities::metrics::EpisodeMetrics;
use aegis_domain::services::environment::StepOutcome;
use aegis_domain::services::episode::{EpisodeObserver, EpisodeOutcome};
use aegis_domain::services::ohlcv::DataQualityReport;
use aegis_domain::value_objects::action::Action;
use aegis_domain::value_objects::observation::Observation;
use aegis_domain::value_objects::step_info::TerminationReason;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// SHA-256 over every observation, reward and equity value of an episode.
///
/// Two runs with the same fingerprint produced bit-identical trajectories.
#[derive(Clone, Default)]
pub struct TrajectoryHasher {
    hasher: Sha256,
}

impl TrajectoryHasher {
    pub fn new() -> Self {
        Self::default()
    }

    fn update_values(&mut self, values: &[f64]) {
        for value in values {
            self.hasher.update(value.to_le_bytes());
        }
    }

    pub fn finish(self) -> String {
        let bytes = self.hasher.finalize();
        to_hex(&bytes[..], 64)
    }
}

impl EpisodeObserver for TrajectoryHasher {
    fn on_reset(&mut self, observation: &Observation) {
        self.update_values(&observation.values);
    }

    fn on_step(&mut self, _action: &Action, outcome: &StepOutcome) {
        self.update_values(&outcome.observation.values);
        self.update_values(&[
            outcome.reward,
            outcome.info.applied_quantity,
            outcome.info.transaction_cost,
            outcome.info.equity,
        ]);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub policy: String,
    pub steps: usize,
    pub termination: Option<TerminationReason>,
    pub total_reward: f64,
    pub fingerprint: String,
    pub metrics: EpisodeMetrics,
}

impl EpisodeSummary {
    pub fn from_outcome(
        episode: usize,
        policy: &str,
        outcome: &EpisodeOutcome,
        fingerprint: String,
        metrics: EpisodeMetrics,
    ) -> Self {
        Self {
            episode,
            policy: policy.to_string(),
            steps: outcome.steps,
            termination: outcome.termination,
            total_reward: outcome.total_reward,
            fingerprint,
            metrics,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub run_id: String,
    pub symbol: String,
    pub bars: usize,
    /// Unix seconds of the first and last bar.
    pub start: i64,
    pub end: i64,
    pub feature_names: Vec<String>,
    pub data_quality: Option<DataQualityReport>,
    pub summary: EpisodeSummary,
    pub run_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub episodes: Vec<EpisodeSummary>,
    pub mean_reward: f64,
    pub mean_return: f64,
    pub worst_drawdown: f64,
}

impl BatchReport {
    pub fn from_episodes(episodes: Vec<EpisodeSummary>) -> Self {
        let n = episodes.len().max(1) as f64;
        let mean_reward = episodes.iter().map(|e| e.total_reward).sum::<f64>() / n;
        let mean_return = episodes.iter().map(|e| e.metrics.total_return).sum::<f64>() / n;
        let worst_drawdown = episodes
            .iter()
            .map(|e| e.metrics.max_drawdown)
            .fold(0.0, f64::max);
        Self {
            episodes,
            mean_reward,
            mean_return,
            worst_drawdown,
        }
    }
}

pub fn summary_meta_json(report: &SimulationReport) -> serde_json::Value {
    serde_json::json!({
        "run_id": report.run_id,
        "symbol": report.symbol,
        "bars": report.bars,
        "start": report.start,
        "end": report.end,
        "start_utc": format_utc(report.start),
        "end_utc": format_utc(report.end),
        "feature_names": report.feature_names,
        "policy": report.summary.policy,
        "steps": report.summary.steps,
        "termination": report.summary.termination,
        "fingerprint": report.summary.fingerprint,
    })
}

fn format_utc(ts: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(ts, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}
