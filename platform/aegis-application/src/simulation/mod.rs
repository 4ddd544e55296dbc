use crate::config::Config;
use crate::features::{FeatureConfig, FeaturePipeline};
use crate::policy::PolicyFactory;
use crate::reporting::{summary_meta_json, EpisodeSummary, SimulationReport, TrajectoryHasher};
use crate::sentiment::{align_with_bars, sentiment_feature_names, sentiment_rows};
use crate::shared::{build_metrics_config, parse_duration_like, resolve_env_config};
use crate::synthetic::synthetic_bars;
use aegis_domain::entities::metrics::EpisodeMetrics;
use aegis_domain::repositories::artifacts::ArtifactWriter;
use aegis_domain::repositories::market_data::{MarketDataRepository, OhlcvQuery};
use aegis_domain::repositories::sentiment::{SentimentQuery, SentimentRepository};
use aegis_domain::services::environment::TradingEnvironment;
use aegis_domain::services::episode::{run_episode_with, EpisodeOutcome};
use aegis_domain::services::ohlcv::DataQualityReport;
use aegis_domain::value_objects::market_series::MarketSeries;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, info_span, warn};

pub const DEFAULT_SYNTHETIC_BARS: usize = 720;
pub const DEFAULT_SEED: u64 = 42;

/// A feature-complete series ready for the environment.
#[derive(Debug, Clone)]
pub struct PreparedSeries {
    pub series: MarketSeries,
    pub data_quality: Option<DataQualityReport>,
}

pub fn feature_config(config: &Config) -> FeatureConfig {
    FeatureConfig {
        return_mode: config.features.return_mode,
        sma_windows: config.features.sma_windows.clone(),
        volatility_windows: config
            .features
            .volatility_windows
            .clone()
            .unwrap_or_default(),
        rsi_window: config.features.rsi_window,
        atr_window: config.features.atr_window,
    }
}

/// Loads bars (CSV or synthetic), aligns sentiment and computes feature columns.
pub fn prepare_series(
    config: &Config,
    market_data: &dyn MarketDataRepository,
    sentiment_repo: &dyn SentimentRepository,
) -> Result<PreparedSeries, String> {
    let stage_start = Instant::now();
    let (bars, data_quality) = match &config.data.ohlcv_path {
        Some(path) => {
            let (bars, report) = market_data.load_ohlcv(&OhlcvQuery {
                path: PathBuf::from(path),
                symbol: config.run.symbol.clone(),
                expected_step_seconds: config.data.expected_step_seconds,
            })?;
            if !report.is_clean() {
                return Err(format!(
                    "OHLCV data failed quality checks: duplicates={} out_of_order={} invalid_bars={} (first invalid ts {:?})",
                    report.duplicates, report.out_of_order, report.invalid_bars, report.first_invalid
                ));
            }
            if report.gaps > 0 {
                warn!(
                    gaps = report.gaps,
                    max_gap_seconds = ?report.max_gap_seconds,
                    "OHLCV data has gaps"
                );
            }
            (bars, Some(report))
        }
        None => {
            let count = config.data.synthetic_bars.unwrap_or(DEFAULT_SYNTHETIC_BARS);
            let seed = config.run.seed.unwrap_or(DEFAULT_SEED);
            info!(count, seed, "generating synthetic bars");
            (synthetic_bars(count, seed), None)
        }
    };
    metrics::histogram!("aegis.sim.load_ohlcv_ms").record(stage_start.elapsed().as_millis() as f64);

    let pipeline = FeaturePipeline::new(feature_config(config))?;

    let series = match &config.data.sentiment_path {
        Some(path) => {
            let stage_start = Instant::now();
            let (points, report) = sentiment_repo.load_sentiment(&SentimentQuery {
                path: PathBuf::from(path),
                missing_policy: config.data.sentiment_missing.unwrap_or_default(),
            })?;
            let lag = parse_duration_like(config.data.sentiment_lag.as_deref().unwrap_or("0s"))?;
            let timestamps: Vec<i64> = bars.iter().map(|bar| bar.timestamp).collect();
            let aligned = align_with_bars(&timestamps, &points, lag);
            let names = sentiment_feature_names(&report.schema);
            let rows = sentiment_rows(&aligned, names.len());
            metrics::histogram!("aegis.sim.align_sentiment_ms")
                .record(stage_start.elapsed().as_millis() as f64);
            info!(
                rows = points.len(),
                columns = names.len(),
                lag_seconds = lag,
                missing = report.missing_values,
                dropped = report.dropped_rows,
                "sentiment aligned"
            );
            pipeline.build_series(
                &config.run.symbol,
                &bars,
                Some((names.as_slice(), rows.as_slice())),
            )?
        }
        None => pipeline.build_series(&config.run.symbol, &bars, None)?,
    };

    Ok(PreparedSeries {
        series,
        data_quality,
    })
}

/// Runs one configured episode end to end and writes its artifacts.
pub fn run_simulation(
    config: &Config,
    config_toml: &str,
    out: Option<PathBuf>,
    market_data: &dyn MarketDataRepository,
    sentiment_repo: &dyn SentimentRepository,
    artifacts: &dyn ArtifactWriter,
    policy_factory: &PolicyFactory<'_>,
) -> Result<SimulationReport, String> {
    let _span = info_span!(
        "run_simulation",
        run_id = %config.run.run_id,
        symbol = %config.run.symbol
    )
    .entered();

    let prepared = prepare_series(config, market_data, sentiment_repo)?;
    let series = prepared.series;
    let env_config = resolve_env_config(config)?;
    let mut env =
        TradingEnvironment::new(series.clone(), env_config).map_err(|err| err.to_string())?;
    let mut policy = policy_factory(&config.policy, &series, 0)?;

    let stage_start = Instant::now();
    let mut hasher = TrajectoryHasher::new();
    let outcome = run_episode_with(&mut env, &mut policy, &mut hasher)
        .map_err(|err| format!("episode failed: {err}"))?;
    record_episode_metrics(&outcome, stage_start.elapsed().as_millis() as f64);

    let metrics = EpisodeMetrics::from_account(
        &outcome.account,
        outcome.total_reward,
        build_metrics_config(config),
    );
    let summary = EpisodeSummary::from_outcome(0, policy.name(), &outcome, hasher.finish(), metrics);
    info!(
        steps = summary.steps,
        termination = ?summary.termination,
        total_reward = summary.total_reward,
        net_profit = summary.metrics.net_profit,
        max_drawdown = summary.metrics.max_drawdown,
        fingerprint = %summary.fingerprint,
        "episode finished"
    );

    let mut report = SimulationReport {
        run_id: config.run.run_id.clone(),
        symbol: config.run.symbol.clone(),
        bars: series.len(),
        start: series.bars().first().map_or(0, |bar| bar.timestamp),
        end: series.bars().last().map_or(0, |bar| bar.timestamp),
        feature_names: series.feature_names().to_vec(),
        data_quality: prepared.data_quality,
        summary,
        run_dir: None,
    };

    let base_dir = out.unwrap_or_else(|| PathBuf::from(&config.paths.out_dir));
    let run_dir = base_dir.join(&config.run.run_id);
    write_outputs(&run_dir, config_toml, &env, &outcome, &report, artifacts)?;
    report.run_dir = Some(run_dir);
    Ok(report)
}

pub(crate) fn record_episode_metrics(outcome: &EpisodeOutcome, elapsed_ms: f64) {
    metrics::histogram!("aegis.sim.episode_ms").record(elapsed_ms);
    metrics::counter!("aegis.sim.steps_total").increment(outcome.steps as u64);
    metrics::counter!("aegis.sim.episodes_total").increment(1);
    if outcome.infos.iter().any(|info| info.forced_liquidation) {
        metrics::counter!("aegis.sim.forced_liquidations_total").increment(1);
    }
    let clamps = outcome.infos.iter().filter(|info| info.clamped).count();
    metrics::counter!("aegis.sim.clamped_orders_total").increment(clamps as u64);
}

fn write_outputs(
    run_dir: &std::path::Path,
    config_toml: &str,
    env: &TradingEnvironment,
    outcome: &EpisodeOutcome,
    report: &SimulationReport,
    artifacts: &dyn ArtifactWriter,
) -> Result<(), String> {
    artifacts.ensure_dir(run_dir)?;

    let start_ts = env
        .series()
        .bar(env.config().observation_window_size - 1)
        .map(|bar| bar.timestamp)
        .unwrap_or_default();
    let timestamps: Vec<i64> = std::iter::once(start_ts)
        .chain(outcome.infos.iter().map(|info| info.timestamp))
        .collect();

    artifacts.write_equity_csv(
        run_dir.join("equity.csv").as_path(),
        &outcome.account.equity_history,
        &timestamps,
    )?;
    artifacts.write_steps_jsonl(run_dir.join("steps.jsonl").as_path(), &outcome.infos)?;
    let meta = summary_meta_json(report);
    artifacts.write_summary_json(
        run_dir.join("summary.json").as_path(),
        &report.summary.metrics,
        Some(&meta),
    )?;
    artifacts
        .write_config_snapshot_toml(run_dir.join("config_snapshot.toml").as_path(), config_toml)?;
    Ok(())
}
