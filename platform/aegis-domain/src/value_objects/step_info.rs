use crate::value_objects::action::Action;
use crate::value_objects::sized_order::SizingNote;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    EndOfData,
    StepLimit,
    LiquidationFloor,
    MaxDrawdown,
    NonFinite,
}

impl TerminationReason {
    /// Forced terminations flatten the position before the final reward.
    pub fn is_forced(self) -> bool {
        matches!(
            self,
            TerminationReason::LiquidationFloor | TerminationReason::MaxDrawdown
        )
    }
}

/// Diagnostics returned alongside every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub step: usize,
    pub cursor: usize,
    pub timestamp: i64,
    pub action: Action,
    /// Signed quantity the risk manager asked for before affordability checks.
    pub requested_quantity: f64,
    /// Signed quantity actually filled by the policy order.
    pub applied_quantity: f64,
    pub execution_price: f64,
    /// Total transaction cost charged this step, including stop and liquidation fills.
    pub transaction_cost: f64,
    pub notes: Vec<SizingNote>,
    pub clamped: bool,
    pub stop_triggered: bool,
    pub forced_liquidation: bool,
    pub reward_degenerate: bool,
    pub rejected_action: Option<String>,
    pub termination: Option<TerminationReason>,
    pub equity: f64,
    pub cash: f64,
    pub position: f64,
    pub drawdown: f64,
}
