use crate::entities::risk::RiskConfig;
use crate::error::EnvError;
use crate::services::reward::RewardConfig;
use crate::value_objects::action::ActionSpace;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    pub initial_capital: f64,
    pub transaction_cost_rate: f64,
    /// Equity floor as a fraction of initial capital; breaching it force-closes the episode.
    pub liquidation_floor_fraction: f64,
    /// Drawdown from peak equity above which the episode is force-closed.
    pub max_drawdown_fraction: f64,
    pub observation_window_size: usize,
    pub max_episode_steps: Option<usize>,
    pub enforce_stop_loss: bool,
    pub action_space: ActionSpace,
    pub reward: RewardConfig,
    pub risk: RiskConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            transaction_cost_rate: 0.001,
            liquidation_floor_fraction: 0.5,
            max_drawdown_fraction: 0.5,
            observation_window_size: 10,
            max_episode_steps: None,
            enforce_stop_loss: true,
            action_space: ActionSpace::Discrete,
            reward: RewardConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

impl EnvConfig {
    pub fn liquidation_floor(&self) -> f64 {
        self.initial_capital * self.liquidation_floor_fraction
    }

    pub fn validate(&self) -> Result<(), EnvError> {
        let invalid = |msg: String| Err(EnvError::InvalidConfig(msg));

        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return invalid(format!(
                "initial_capital must be finite and > 0, got {}",
                self.initial_capital
            ));
        }
        if !(0.0..1.0).contains(&self.transaction_cost_rate) {
            return invalid(format!(
                "transaction_cost_rate must be in [0, 1), got {}",
                self.transaction_cost_rate
            ));
        }
        if !(0.0..1.0).contains(&self.liquidation_floor_fraction) {
            return invalid(format!(
                "liquidation_floor_fraction must be in [0, 1), got {}",
                self.liquidation_floor_fraction
            ));
        }
        if !(self.max_drawdown_fraction > 0.0 && self.max_drawdown_fraction <= 1.0) {
            return invalid(format!(
                "max_drawdown_fraction must be in (0, 1], got {}",
                self.max_drawdown_fraction
            ));
        }
        if self.observation_window_size == 0 {
            return invalid("observation_window_size must be >= 1".to_string());
        }
        if self.max_episode_steps == Some(0) {
            return invalid("max_episode_steps must be >= 1 when set".to_string());
        }
        if let ActionSpace::Continuous { low, high } = self.action_space {
            if !(low.is_finite() && high.is_finite() && low < high) {
                return invalid(format!("invalid continuous action bounds [{low}, {high}]"));
            }
        }
        self.reward.validate().map_err(EnvError::InvalidConfig)?;
        self.risk
            .validate()
            .map_err(|err| EnvError::InvalidConfig(err.to_string()))?;
        Ok(())
    }
}
