use crate::config::Config;
use aegis_domain::entities::metrics::MetricsConfig;
use aegis_domain::entities::risk::RiskConfig;
use aegis_domain::services::environment::EnvConfig;
use aegis_domain::services::reward::RewardConfig;

/// Parses `"30s"`, `"5m"`, `"1h"`, `"1d"` or a bare number of seconds.
pub fn parse_duration_like(value: &str) -> Result<i64, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("duration cannot be empty".to_string());
    }
    if let Ok(seconds) = trimmed.parse::<i64>() {
        if seconds < 0 {
            return Err(format!("duration must be >= 0: {value}"));
        }
        return Ok(seconds);
    }

    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("invalid duration: {value}"))?;
    let (number, unit) = trimmed.split_at(split);
    let amount: i64 = number
        .parse()
        .map_err(|_| format!("invalid duration: {value}"))?;
    let scale = match unit.trim().to_lowercase().as_str() {
        "s" | "sec" => 1,
        "m" | "min" => 60,
        "h" => 3_600,
        "d" => 86_400,
        other => return Err(format!("invalid duration unit '{other}' in {value}")),
    };
    amount
        .checked_mul(scale)
        .ok_or_else(|| format!("duration overflows: {value}"))
}

pub fn build_metrics_config(config: &Config) -> MetricsConfig {
    let defaults = MetricsConfig::default();
    let Some(metrics) = config.metrics.as_ref() else {
        return defaults;
    };
    MetricsConfig {
        risk_free_rate: metrics.risk_free_rate.unwrap_or(defaults.risk_free_rate),
        annualization_factor: metrics.annualization_factor,
    }
}

/// Maps the file schema onto the domain configuration and validates it.
pub fn resolve_env_config(config: &Config) -> Result<EnvConfig, String> {
    let defaults = EnvConfig::default();
    let risk_defaults = RiskConfig::default();
    let reward_defaults = RewardConfig::default();

    let risk = RiskConfig {
        risk_fraction: config.risk.risk_fraction_per_trade,
        max_leverage: config.risk.max_leverage,
        max_position_qty: config
            .risk
            .max_position_qty
            .unwrap_or(risk_defaults.max_position_qty),
        stop_distance_fraction: config
            .risk
            .stop_distance_fraction
            .unwrap_or(risk_defaults.stop_distance_fraction),
        stop_distance_column: config.risk.stop_distance_column.clone(),
        stop_distance_multiple: config
            .risk
            .stop_distance_multiple
            .unwrap_or(risk_defaults.stop_distance_multiple),
        min_tick: config.risk.min_tick.unwrap_or(risk_defaults.min_tick),
        allow_short: config.risk.allow_short.unwrap_or(risk_defaults.allow_short),
    };

    let reward = match config.reward.as_ref() {
        Some(section) => RewardConfig {
            mode: section.mode.unwrap_or(reward_defaults.mode),
            volatility_penalty: section
                .volatility_penalty
                .unwrap_or(reward_defaults.volatility_penalty),
            volatility_window: section
                .volatility_window
                .unwrap_or(reward_defaults.volatility_window),
        },
        None => reward_defaults,
    };

    let env = &config.environment;
    let action_space = env.action_space.unwrap_or_default().to_space();

    let resolved = EnvConfig {
        initial_capital: config.account.initial_capital,
        transaction_cost_rate: config.costs.transaction_cost_rate,
        liquidation_floor_fraction: env.liquidation_floor_fraction,
        max_drawdown_fraction: env.max_drawdown_fraction,
        observation_window_size: env.observation_window_size,
        max_episode_steps: env.max_episode_steps,
        enforce_stop_loss: env.enforce_stop_loss.unwrap_or(defaults.enforce_stop_loss),
        action_space,
        reward,
        risk,
    };
    resolved.validate().map_err(|err| err.to_string())?;
    Ok(resolved)
}

/// Lowercase hex of `bytes`, truncated to `chars` characters.
pub fn to_hex(bytes: &[u8], chars: usize) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(chars.min(bytes.len() * 2));
    for b in bytes {
        if out.len() >= chars {
            break;
        }
        out.push(HEX[(b >> 4) as usize] as char);
        if out.len() >= chars {
            break;
        }
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}
