use crate::config::{Config, PolicyConfig};
use crate::policy::PolicyFactory;
use crate::reporting::{BatchReport, EpisodeSummary, TrajectoryHasher};
use crate::shared::{build_metrics_config, resolve_env_config};
use crate::simulation::{prepare_series, record_episode_metrics};
use aegis_domain::entities::metrics::{EpisodeMetrics, MetricsConfig};
use aegis_domain::repositories::market_data::MarketDataRepository;
use aegis_domain::repositories::sentiment::SentimentRepository;
use aegis_domain::services::environment::{EnvConfig, TradingEnvironment};
use aegis_domain::services::episode::run_episode_with;
use aegis_domain::value_objects::market_series::MarketSeries;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Instant;
use tracing::{info, info_span};

/// Shared inputs for every episode of a batch.
pub struct BatchPlan<'a> {
    pub series: &'a MarketSeries,
    pub env_config: &'a EnvConfig,
    pub policy_config: &'a PolicyConfig,
    pub metrics_config: MetricsConfig,
    pub episodes: usize,
    pub parallelism: usize,
}

enum WorkerMessage {
    Entry {
        episode: usize,
        summary: EpisodeSummary,
    },
    Fatal(String),
}

/// Prepares the configured series once, then runs `[batch] episodes` independent episodes.
pub fn run_batch_from_config(
    config: &Config,
    market_data: &dyn MarketDataRepository,
    sentiment_repo: &dyn SentimentRepository,
    policy_factory: &PolicyFactory<'_>,
) -> Result<BatchReport, String> {
    let batch = config
        .batch
        .as_ref()
        .ok_or_else(|| "missing [batch] section".to_string())?;
    let prepared = prepare_series(config, market_data, sentiment_repo)?;
    let env_config = resolve_env_config(config)?;
    run_batch(
        &BatchPlan {
            series: &prepared.series,
            env_config: &env_config,
            policy_config: &config.policy,
            metrics_config: build_metrics_config(config),
            episodes: batch.episodes,
            parallelism: normalize_parallelism(batch.parallelism),
        },
        policy_factory,
    )
}

/// Runs independent episodes over one series, each with its own environment.
///
/// Results are ordered by episode index regardless of which worker finished first.
pub fn run_batch(
    plan: &BatchPlan<'_>,
    policy_factory: &PolicyFactory<'_>,
) -> Result<BatchReport, String> {
    if plan.episodes == 0 {
        return Err("batch.episodes must be >= 1".to_string());
    }
    let _span = info_span!(
        "run_batch",
        episodes = plan.episodes,
        parallelism = plan.parallelism
    )
    .entered();

    let mut entries = if plan.parallelism <= 1 || plan.episodes == 1 {
        execute_serial(plan, policy_factory)?
    } else {
        execute_parallel(plan, policy_factory)?
    };
    entries.sort_by_key(|(episode, _)| *episode);

    let report = BatchReport::from_episodes(entries.into_iter().map(|(_, s)| s).collect());
    info!(
        episodes = report.episodes.len(),
        mean_reward = report.mean_reward,
        mean_return = report.mean_return,
        worst_drawdown = report.worst_drawdown,
        "batch finished"
    );
    Ok(report)
}

fn normalize_parallelism(value: Option<usize>) -> usize {
    value.unwrap_or(1).max(1)
}

fn execute_serial(
    plan: &BatchPlan<'_>,
    policy_factory: &PolicyFactory<'_>,
) -> Result<Vec<(usize, EpisodeSummary)>, String> {
    (0..plan.episodes)
        .map(|episode| execute_episode(plan, episode, policy_factory).map(|s| (episode, s)))
        .collect()
}

fn execute_parallel(
    plan: &BatchPlan<'_>,
    policy_factory: &PolicyFactory<'_>,
) -> Result<Vec<(usize, EpisodeSummary)>, String> {
    let worker_count = plan.parallelism.max(1).min(plan.episodes);
    let next_index = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<WorkerMessage>();

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            let tx = tx.clone();
            let next_index_ref = &next_index;
            let failed_ref = &failed;
            scope.spawn(move || loop {
                if failed_ref.load(Ordering::Relaxed) {
                    break;
                }

                let episode = next_index_ref.fetch_add(1, Ordering::Relaxed);
                if episode >= plan.episodes {
                    break;
                }

                match execute_episode(plan, episode, policy_factory) {
                    Ok(summary) => {
                        if tx.send(WorkerMessage::Entry { episode, summary }).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        failed_ref.store(true, Ordering::Relaxed);
                        let _ = tx.send(WorkerMessage::Fatal(err));
                        break;
                    }
                }
            });
        }

        drop(tx);

        let mut entries = Vec::with_capacity(plan.episodes);
        let mut fatal_error: Option<String> = None;
        while let Ok(message) = rx.recv() {
            match message {
                WorkerMessage::Entry { episode, summary } => {
                    if fatal_error.is_none() {
                        entries.push((episode, summary));
                    }
                }
                WorkerMessage::Fatal(err) => {
                    if fatal_error.is_none() {
                        fatal_error = Some(err);
                    }
                }
            }
        }

        if let Some(err) = fatal_error {
            return Err(err);
        }
        if entries.len() != plan.episodes {
            return Err(format!(
                "internal batch error: expected {} episodes, got {}",
                plan.episodes,
                entries.len()
            ));
        }
        Ok(entries)
    })
}

fn execute_episode(
    plan: &BatchPlan<'_>,
    episode: usize,
    policy_factory: &PolicyFactory<'_>,
) -> Result<EpisodeSummary, String> {
    let mut env = TradingEnvironment::new(plan.series.clone(), plan.env_config.clone())
        .map_err(|err| err.to_string())?;
    let mut policy = policy_factory(plan.policy_config, plan.series, episode)?;

    let started = Instant::now();
    let mut hasher = TrajectoryHasher::new();
    let outcome = run_episode_with(&mut env, &mut policy, &mut hasher)
        .map_err(|err| format!("episode {episode} failed: {err}"))?;
    record_episode_metrics(&outcome, started.elapsed().as_millis() as f64);

    let metrics = EpisodeMetrics::from_account(&outcome.account, outcome.total_reward, plan.metrics_config);
    Ok(EpisodeSummary::from_outcome(
        episode,
        policy.name(),
        &outcome,
        hasher.finish(),
        metrics,
    ))
}

#[cfg(test)]
mod tests {
    use super::{run_batch, BatchPlan};
    use crate::config::{PolicyConfig, PolicyKind};
    use crate::features::{FeatureConfig, FeaturePipeline};
    use crate::policy::{build_rule_policy, PolicyFactoryResult};
    use crate::synthetic::synthetic_bars;
    use aegis_domain::entities::metrics::MetricsConfig;
    use aegis_domain::services::environment::EnvConfig;
    use aegis_domain::value_objects::market_series::MarketSeries;

    fn series() -> MarketSeries {
        FeaturePipeline::new(FeatureConfig::default())
            .and_then(|p| p.build_series("SYN", &synthetic_bars(120, 7), None))
            .expect("series")
    }

    fn momentum() -> PolicyConfig {
        PolicyConfig {
            kind: PolicyKind::Momentum,
            feature: Some("ret".to_string()),
            threshold: Some(0.0),
            actions: None,
        }
    }

    fn factory(
        config: &PolicyConfig,
        series: &MarketSeries,
        _episode: usize,
    ) -> PolicyFactoryResult {
        build_rule_policy(config, series, Default::default())
    }

    #[test]
    fn parallel_and_serial_batches_agree() {
        let series = series();
        let env_config = EnvConfig::default();
        let policy_config = momentum();
        let plan = |parallelism| BatchPlan {
            series: &series,
            env_config: &env_config,
            policy_config: &policy_config,
            metrics_config: MetricsConfig::default(),
            episodes: 5,
            parallelism,
        };

        let serial = run_batch(&plan(1), &factory).expect("serial");
        let parallel = run_batch(&plan(3), &factory).expect("parallel");

        assert_eq!(serial.episodes.len(), 5);
        let indices: Vec<usize> = parallel.episodes.iter().map(|e| e.episode).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        for (a, b) in serial.episodes.iter().zip(parallel.episodes.iter()) {
            assert_eq!(a.fingerprint, b.fingerprint);
            assert_eq!(a.total_reward.to_bits(), b.total_reward.to_bits());
        }
    }

    #[test]
    fn factory_errors_abort_the_batch() {
        let series = series();
        let env_config = EnvConfig::default();
        let policy_config = PolicyConfig {
            kind: PolicyKind::Random,
            feature: None,
            threshold: None,
            actions: None,
        };
        let plan = BatchPlan {
            series: &series,
            env_config: &env_config,
            policy_config: &policy_config,
            metrics_config: MetricsConfig::default(),
            episodes: 4,
            parallelism: 2,
        };
        let err = run_batch(&plan, &factory).expect_err("random needs a source");
        assert!(err.contains("random"));
    }

    #[test]
    fn zero_episodes_is_rejected() {
        let series = series();
        let env_config = EnvConfig::default();
        let policy_config = momentum();
        let plan = BatchPlan {
            series: &series,
            env_config: &env_config,
            policy_config: &policy_config,
            metrics_config: MetricsConfig::default(),
            episodes: 0,
            parallelism: 1,
        };
        assert!(run_batch(&plan, &factory).is_err());
    }
}
