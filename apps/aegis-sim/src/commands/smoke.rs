use aegis_application::features::{FeatureConfig, FeaturePipeline};
use aegis_application::synthetic::synthetic_bars;
use aegis_domain::engine_name;
use aegis_domain::entities::risk::{RiskConfig, RiskManager};
use aegis_domain::services::environment::{EnvConfig, TradingEnvironment};
use aegis_domain::services::policy::Policy;
use aegis_domain::value_objects::action::ActionSpace;
use aegis_infrastructure::policies::RandomPolicy;
use tracing::{error, info};

/// Synthetic OHLCV hourly bars for January 2024.
pub const DEFAULT_SMOKE_BARS: usize = 721;

const GOLDEN_CAPITAL: f64 = 10_000.0;
const GOLDEN_ENTRY: f64 = 100.0;
const GOLDEN_STOP: f64 = 95.0;
const GOLDEN_QUANTITY: f64 = 20.0;

pub struct SmokeArgs {
    pub bars: usize,
    pub steps: usize,
    pub seed: u64,
}

pub(super) fn run_smoke(args: SmokeArgs) -> Result<(), String> {
    info!(bars = args.bars, steps = args.steps, seed = args.seed, "starting component smoke run");
    let result = smoke(&args);
    match &result {
        Ok(()) => info!("all components tested successfully"),
        Err(err) => error!(error = %err, "smoke run failed"),
    }
    result
}

fn smoke(args: &SmokeArgs) -> Result<(), String> {
    info!("checking configuration defaults");
    let env_config = EnvConfig::default();
    env_config.validate().map_err(|err| err.to_string())?;

    info!("computing technical indicators");
    let pipeline = FeaturePipeline::new(FeatureConfig::default())?;
    let bars = synthetic_bars(args.bars, args.seed);
    let series = pipeline.build_series("SYNTH", &bars, None)?;
    info!(
        features = pipeline.feature_names().len(),
        names = ?pipeline.feature_names(),
        "added technical indicators"
    );

    info!("checking risk manager");
    let risk = RiskManager::new(RiskConfig::default()).map_err(|err| err.to_string())?;
    let quantity = risk
        .calculate_position_size(
            GOLDEN_CAPITAL,
            GOLDEN_ENTRY,
            GOLDEN_STOP,
            risk.config().risk_fraction,
        )
        .map_err(|err| err.to_string())?;
    info!(quantity, "calculated position size");
    if (quantity - GOLDEN_QUANTITY).abs() > 1e-9 {
        return Err(format!(
            "position size {quantity} != expected {GOLDEN_QUANTITY}"
        ));
    }

    info!("checking trading environment");
    let mut env = TradingEnvironment::new(series, env_config).map_err(|err| err.to_string())?;
    let mut observation = env.reset().map_err(|err| err.to_string())?;
    info!(
        len = observation.len(),
        shape = ?observation.shape(),
        "environment observation"
    );

    let mut policy = RandomPolicy::seeded(ActionSpace::Discrete, args.seed);
    policy.reset();
    info!(policy = policy.name(), "running trading simulation");
    for i in 0..args.steps {
        if env.is_done() {
            break;
        }
        let action = policy.predict(&observation);
        let outcome = env.step(action).map_err(|err| err.to_string())?;
        info!(
            step = i + 1,
            action = ?action,
            reward = outcome.reward,
            equity = outcome.info.equity,
            position = outcome.info.position,
            "step"
        );
        if !outcome.reward.is_finite() || outcome.observation.len() != env.observation_len() {
            return Err(format!("step {} produced an invalid transition", i + 1));
        }
        observation = outcome.observation;
        if outcome.done {
            info!(termination = ?env.termination(), "episode finished");
            break;
        }
    }

    println!(
        "{} sim: smoke ok (steps={}, equity={:.2})",
        engine_name(),
        env.steps_taken(),
        env.account().last_equity()
    );
    Ok(())
}
