use aegis_application::config::{Config, PolicyConfig, PolicyKind};
use aegis_application::policy::{build_rule_policy, PolicyFactoryResult};
use aegis_domain::repositories::artifacts::ArtifactWriter;
use aegis_domain::repositories::market_data::MarketDataRepository;
use aegis_domain::repositories::sentiment::SentimentRepository;
use aegis_domain::value_objects::action::ActionSpace;
use aegis_domain::value_objects::market_series::MarketSeries;
use aegis_infrastructure::artifacts::FilesystemArtifactWriter;
use aegis_infrastructure::market_data::CsvMarketDataRepository;
use aegis_infrastructure::policies::RandomPolicy;
use aegis_infrastructure::sentiment::CsvSentimentRepository;

pub const DEFAULT_POLICY_SEED: u64 = 42;

pub struct EngineDeps {
    pub market_data: Box<dyn MarketDataRepository>,
    pub sentiment_repo: Box<dyn SentimentRepository>,
    pub artifacts: Box<dyn ArtifactWriter>,
}

pub fn build_engine_deps() -> EngineDeps {
    EngineDeps {
        market_data: Box::new(CsvMarketDataRepository::new()),
        sentiment_repo: Box::new(CsvSentimentRepository::new()),
        artifacts: Box::new(FilesystemArtifactWriter::new()),
    }
}

/// Policy factory for the configured action space; random policies get `seed + episode`.
pub fn policy_factory(
    config: &Config,
) -> impl Fn(&PolicyConfig, &MarketSeries, usize) -> PolicyFactoryResult + Sync {
    let space = config
        .environment
        .action_space
        .unwrap_or_default()
        .to_space();
    let seed = config.run.seed.unwrap_or(DEFAULT_POLICY_SEED);
    move |policy: &PolicyConfig, series: &MarketSeries, episode: usize| -> PolicyFactoryResult {
        build_policy(policy, series, space, seed.wrapping_add(episode as u64))
    }
}

pub fn build_policy(
    policy: &PolicyConfig,
    series: &MarketSeries,
    space: ActionSpace,
    seed: u64,
) -> PolicyFactoryResult {
    match policy.kind {
        PolicyKind::Random => Ok(Box::new(RandomPolicy::seeded(space, seed))),
        _ => build_rule_policy(policy, series, space),
    }
}
