use aegis_domain::services::reward::RewardMode;
use aegis_domain::value_objects::action::ActionSpace;
use aegis_domain::services::sentiment::MissingValuePolicy;
use crate::features::ReturnMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub run: RunConfig,
    pub data: DataConfig,
    pub account: AccountConfig,
    pub costs: CostsConfig,
    pub risk: RiskConfig,
    pub environment: EnvironmentConfig,
    pub reward: Option<RewardConfig>,
    pub features: FeaturesConfig,
    pub policy: PolicyConfig,
    pub metrics: Option<MetricsConfig>,
    pub batch: Option<BatchConfig>,
    pub paths: PathsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub run_id: String,
    pub symbol: String,
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// OHLCV CSV; when absent, `synthetic_bars` bars are generated from the run seed.
    pub ohlcv_path: Option<String>,
    pub expected_step_seconds: Option<i64>,
    pub synthetic_bars: Option<usize>,
    pub sentiment_path: Option<String>,
    pub sentiment_missing: Option<MissingValuePolicy>,
    pub sentiment_lag: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    pub initial_capital: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct CostsConfig {
    pub transaction_cost_rate: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RiskConfig {
    pub risk_fraction_per_trade: f64,
    pub max_leverage: f64,
    pub max_position_qty: Option<f64>,
    pub stop_distance_fraction: Option<f64>,
    pub stop_distance_column: Option<String>,
    pub stop_distance_multiple: Option<f64>,
    pub min_tick: Option<f64>,
    pub allow_short: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionSpaceKind {
    #[default]
    Discrete,
    Continuous,
}

impl ActionSpaceKind {
    pub fn to_space(self) -> ActionSpace {
        match self {
            ActionSpaceKind::Discrete => ActionSpace::Discrete,
            ActionSpaceKind::Continuous => ActionSpace::continuous(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    pub liquidation_floor_fraction: f64,
    pub max_drawdown_fraction: f64,
    pub observation_window_size: usize,
    pub max_episode_steps: Option<usize>,
    pub enforce_stop_loss: Option<bool>,
    pub action_space: Option<ActionSpaceKind>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RewardConfig {
    pub mode: Option<RewardMode>,
    pub volatility_penalty: Option<f64>,
    pub volatility_window: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct FeaturesConfig {
    pub return_mode: ReturnMode,
    #[serde(default)]
    pub sma_windows: Vec<usize>,
    pub volatility_windows: Option<Vec<usize>>,
    pub rsi_window: Option<usize>,
    pub atr_window: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Hold,
    Random,
    Momentum,
    Scripted,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    pub kind: PolicyKind,
    /// Feature column read by the momentum policy.
    pub feature: Option<String>,
    pub threshold: Option<f64>,
    /// Actions replayed by the scripted policy (`hold`, `long`, `short`, `flat` or a number).
    pub actions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    pub risk_free_rate: Option<f64>,
    pub annualization_factor: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    pub episodes: usize,
    pub parallelism: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub out_dir: String,
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let (config, _source) = load_config_with_source(path)?;
    Ok(config)
}

pub fn load_config_with_source(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config = toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    Ok((config, contents))
}

pub fn to_toml_pretty(config: &Config) -> Result<String, String> {
    toml::to_string_pretty(config)
        .map_err(|err| format!("failed to serialize config as TOML: {err}"))
}
