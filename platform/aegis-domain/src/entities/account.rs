use crate::value_objects::side::Side;
use crate::value_objects::trade::Fill;
use serde::{Deserialize, Serialize};

/// Quantities below this are treated as a flat position.
pub const QTY_EPSILON: f64 = 1e-12;

/// Cash, signed position and equity history for one episode.
///
/// Mutated only by the trading environment; everyone else sees `&AccountState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub cash: f64,
    pub position: f64,
    pub entry_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub realized_pnl: f64,
    pub peak_equity: f64,
    pub equity_history: Vec<f64>,
    pub fills: Vec<Fill>,
}

impl AccountState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            position: 0.0,
            entry_price: None,
            stop_loss: None,
            realized_pnl: 0.0,
            peak_equity: initial_capital,
            equity_history: vec![initial_capital],
            fills: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.abs() <= QTY_EPSILON
    }

    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.position * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.entry_price {
            Some(entry) if !self.is_flat() => (price - entry) * self.position,
            _ => 0.0,
        }
    }

    /// Fractional decline of `equity` from the running peak.
    pub fn drawdown(&self, equity: f64) -> f64 {
        if self.peak_equity <= 0.0 {
            return 0.0;
        }
        ((self.peak_equity - equity) / self.peak_equity).max(0.0)
    }

    pub fn last_equity(&self) -> f64 {
        self.equity_history.last().copied().unwrap_or(self.cash)
    }

    pub fn steps_taken(&self) -> usize {
        self.equity_history.len().saturating_sub(1)
    }

    pub fn record_equity(&mut self, equity: f64) {
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        self.equity_history.push(equity);
    }

    /// Applies a fill and returns the P&L realized by its reducing part, if any.
    ///
    /// Adding to a position keeps a volume-weighted entry price; reducing realizes
    /// `(price - entry) * closed_qty` in the position's direction, net of `cost`.
    pub fn apply_fill(&mut self, side: Side, quantity: f64, price: f64, cost: f64) -> Option<f64> {
        if quantity <= 0.0 {
            return None;
        }

        let signed = side.sign() * quantity;
        self.cash -= signed * price + cost;

        let same_direction = self.is_flat() || self.position.signum() == signed.signum();
        let mut realized = None;
        if same_direction {
            let current = if self.is_flat() { 0.0 } else { self.position.abs() };
            let entry = self.entry_price.unwrap_or(price);
            let total = current + quantity;
            self.entry_price = Some((entry * current + price * quantity) / total);
            self.position = if self.is_flat() {
                signed
            } else {
                self.position + signed
            };
        } else {
            let entry = self.entry_price.unwrap_or(price);
            let closed = quantity.min(self.position.abs());
            let pnl = (price - entry) * closed * self.position.signum() - cost;
            self.realized_pnl += pnl;
            realized = Some(pnl);

            let remainder = quantity - closed;
            self.position += signed;
            if remainder > QTY_EPSILON {
                // Crossed through zero: the remainder opens the other side.
                self.entry_price = Some(price);
                self.stop_loss = None;
            }
        }

        if self.is_flat() {
            self.position = 0.0;
            self.entry_price = None;
            self.stop_loss = None;
        }

        realized
    }
}
