use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardMode {
    #[default]
    Log,
    Simple,
}

/// Step reward: equity return, optionally penalized by recent equity volatility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    pub mode: RewardMode,
    pub volatility_penalty: f64,
    pub volatility_window: usize,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            mode: RewardMode::Log,
            volatility_penalty: 0.0,
            volatility_window: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reward {
    pub value: f64,
    /// Set when the raw reward could not be computed and 0 was emitted instead.
    pub degenerate: bool,
}

impl RewardConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.volatility_penalty.is_finite() || self.volatility_penalty < 0.0 {
            return Err(format!(
                "volatility_penalty must be finite and >= 0, got {}",
                self.volatility_penalty
            ));
        }
        if self.volatility_penalty > 0.0 && self.volatility_window < 2 {
            return Err("volatility_window must be >= 2 when a penalty is set".to_string());
        }
        Ok(())
    }

    /// Reward for the newest entry of `history` relative to the one before it.
    pub fn compute(&self, history: &[f64]) -> Reward {
        let degenerate = Reward {
            value: 0.0,
            degenerate: true,
        };
        let [.., prev, curr] = history else {
            return degenerate;
        };
        let (prev, curr) = (*prev, *curr);
        if !prev.is_finite() || prev <= 0.0 || !curr.is_finite() {
            return degenerate;
        }

        let base = match self.mode {
            RewardMode::Log => {
                if curr <= 0.0 {
                    return degenerate;
                }
                (curr / prev).ln()
            }
            RewardMode::Simple => curr / prev - 1.0,
        };

        let value = if self.volatility_penalty > 0.0 {
            base - self.volatility_penalty * recent_volatility(history, self.volatility_window)
        } else {
            base
        };

        if value.is_finite() {
            Reward {
                value,
                degenerate: false,
            }
        } else {
            degenerate
        }
    }
}

/// Population stddev of the last `window` simple equity returns.
pub fn recent_volatility(history: &[f64], window: usize) -> f64 {
    let start = history.len().saturating_sub(window + 1);
    let returns: Vec<f64> = history[start..]
        .windows(2)
        .filter(|pair| pair[0] > 0.0)
        .map(|pair| pair[1] / pair[0] - 1.0)
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / n;
    var.max(0.0).sqrt()
}
