use aegis_application::config::load_config;
use aegis_domain::engine_name;
use std::path::PathBuf;
use std::time::Instant;

pub(super) fn run_batch(config_path: PathBuf, json: bool) -> Result<(), String> {
    let config = load_config(&config_path)?;
    let overall_start = Instant::now();
    let deps = crate::infra::build_engine_deps();
    let factory = crate::infra::policy_factory(&config);

    let report = aegis_application::batch::run_batch_from_config(
        &config,
        deps.market_data.as_ref(),
        deps.sentiment_repo.as_ref(),
        &factory,
    )?;

    metrics::histogram!("aegis.cli.total_ms", "command" => "batch")
        .record(overall_start.elapsed().as_millis() as f64);

    if json {
        let line = serde_json::to_string(&report)
            .map_err(|err| format!("failed to serialize batch report: {err}"))?;
        println!("{line}");
        return Ok(());
    }

    for episode in &report.episodes {
        println!(
            "episode {:>3}: steps={} termination={:?} reward={:.6} return={:.4} max_drawdown={:.4} fingerprint={}",
            episode.episode,
            episode.steps,
            episode.termination,
            episode.total_reward,
            episode.metrics.total_return,
            episode.metrics.max_drawdown,
            &episode.fingerprint[..16.min(episode.fingerprint.len())]
        );
    }
    println!(
        "{} sim: batch episodes={} mean_reward={:.6} mean_return={:.4} worst_drawdown={:.4} total_ms={}",
        engine_name(),
        report.episodes.len(),
        report.mean_reward,
        report.mean_return,
        report.worst_drawdown,
        overall_start.elapsed().as_millis()
    );
    Ok(())
}
