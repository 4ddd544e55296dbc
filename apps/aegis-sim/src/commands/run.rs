use aegis_application::config::load_config_with_source;
use aegis_domain::engine_name;
use std::path::PathBuf;
use std::time::Instant;

pub(super) fn run_simulation(config_path: PathBuf, out: Option<PathBuf>) -> Result<(), String> {
    let (config, config_toml) = load_config_with_source(&config_path)?;
    println!(
        "{} sim: run (run_id={}, symbol={}, policy={:?}, initial_capital={})",
        engine_name(),
        config.run.run_id,
        config.run.symbol,
        config.policy.kind,
        config.account.initial_capital
    );

    let overall_start = Instant::now();
    let crate::infra::EngineDeps {
        market_data,
        sentiment_repo,
        artifacts,
    } = crate::infra::build_engine_deps();
    let factory = crate::infra::policy_factory(&config);

    let report = aegis_application::simulation::run_simulation(
        &config,
        &config_toml,
        out,
        market_data.as_ref(),
        sentiment_repo.as_ref(),
        artifacts.as_ref(),
        &factory,
    )?;

    let metrics = &report.summary.metrics;
    println!(
        "episode: steps={} termination={:?} total_reward={:.6} net_profit={:.2} return={:.4} max_drawdown={:.4} sharpe={:.4} fills={}",
        report.summary.steps,
        report.summary.termination,
        report.summary.total_reward,
        metrics.net_profit,
        metrics.total_return,
        metrics.max_drawdown,
        metrics.sharpe,
        metrics.fills
    );
    println!("fingerprint: {}", report.summary.fingerprint);
    if let Some(run_dir) = &report.run_dir {
        println!("run output: {}", run_dir.display());
    }
    let total_ms = overall_start.elapsed().as_millis();
    metrics::histogram!("aegis.cli.total_ms", "command" => "run").record(total_ms as f64);
    println!("{} sim: run total_ms={}", engine_name(), total_ms);
    Ok(())
}
