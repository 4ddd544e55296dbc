use aegis_application::config::load_config;
use aegis_application::resolve_env_config;
use aegis_application::simulation::prepare_series;
use aegis_domain::engine_name;
use std::path::PathBuf;

pub(super) fn run_validate(config_path: PathBuf) -> Result<(), String> {
    let config = load_config(&config_path)?;
    let env_config = resolve_env_config(&config)?;
    let deps = crate::infra::build_engine_deps();
    let prepared = prepare_series(
        &config,
        deps.market_data.as_ref(),
        deps.sentiment_repo.as_ref(),
    )?;

    if let Some(report) = &prepared.data_quality {
        println!(
            "ohlcv report: rows={} duplicates={} gaps={} out_of_order={} invalid_bars={}",
            report.rows, report.duplicates, report.gaps, report.out_of_order, report.invalid_bars
        );
    }
    let series = &prepared.series;
    if series.len() < env_config.observation_window_size {
        return Err(format!(
            "series has {} bars, observation window needs {}",
            series.len(),
            env_config.observation_window_size
        ));
    }
    println!(
        "{} sim: config ok (bars={}, features={}, observation_len={})",
        engine_name(),
        series.len(),
        series.feature_count(),
        aegis_domain::value_objects::observation::Observation::expected_len(
            env_config.observation_window_size,
            series.feature_count()
        )
    );
    Ok(())
}
