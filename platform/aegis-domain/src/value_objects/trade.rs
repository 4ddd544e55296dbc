use crate::value_objects::side::Side;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillReason {
    Policy,
    StopLoss,
    ForcedLiquidation,
}

/// One executed fill on the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub step: usize,
    pub timestamp: i64,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    pub cost: f64,
    /// P&L realized by the reducing part of this fill, net of its cost.
    pub realized_pnl: Option<f64>,
    pub reason: FillReason,
}
