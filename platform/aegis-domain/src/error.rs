use thiserror::Error;

/// Errors raised by the risk manager.
///
/// Sizing-level anomalies are absorbed by [`crate::entities::risk::RiskManager::size_order`];
/// these only surface from direct calls to `calculate_position_size` or on impossible input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error("degenerate stop: |entry {entry} - stop {stop}| is below min tick {min_tick}")]
    DegenerateStop {
        entry: f64,
        stop: f64,
        min_tick: f64,
    },

    #[error("non-finite value: {field}={value}")]
    NonFiniteValue { field: &'static str, value: f64 },

    #[error("invalid sizing input: {0}")]
    InvalidInput(String),
}

/// Errors raised by the trading environment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    /// Recoverable: the action was discarded and the episode continues.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// Fatal to the episode: `reset()` must be called.
    #[error("episode exhausted after {steps} steps; call reset()")]
    EpisodeExhausted { steps: usize },

    /// Fatal to the episode: the last valid account state is kept.
    #[error("non-finite value in {field}: {value}")]
    NonFiniteValue { field: String, value: f64 },

    #[error("invalid market series: {0}")]
    InvalidSeries(String),

    #[error("invalid environment config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Risk(#[from] RiskError),
}

impl EnvError {
    /// Whether the caller must `reset()` before stepping again.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EnvError::EpisodeExhausted { .. } | EnvError::NonFiniteValue { .. }
        )
    }
}
