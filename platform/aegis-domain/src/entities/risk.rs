use crate::entities::account::AccountState;
use crate::error::RiskError;
use crate::value_objects::action::{Action, DiscreteAction};
use crate::value_objects::bar::Bar;
use crate::value_objects::side::Side;
use crate::value_objects::sized_order::{SizedOrder, SizingNote};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Fraction of capital risked per trade, in (0, 1].
    pub risk_fraction: f64,
    /// Maximum gross exposure as a multiple of equity.
    pub max_leverage: f64,
    /// Absolute position cap in units; 0 disables it.
    pub max_position_qty: f64,
    /// Stop distance as a fraction of the entry price, used when no column is set.
    pub stop_distance_fraction: f64,
    /// Feature column holding an externally computed stop distance (e.g. ATR).
    pub stop_distance_column: Option<String>,
    pub stop_distance_multiple: f64,
    pub min_tick: f64,
    pub allow_short: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_fraction: 0.01,
            max_leverage: 1.0,
            max_position_qty: 0.0,
            stop_distance_fraction: 0.02,
            stop_distance_column: None,
            stop_distance_multiple: 1.0,
            min_tick: 1e-8,
            allow_short: true,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), RiskError> {
        if !(self.risk_fraction > 0.0 && self.risk_fraction <= 1.0) {
            return Err(RiskError::InvalidInput(format!(
                "risk_fraction must be in (0, 1], got {}",
                self.risk_fraction
            )));
        }
        if !self.max_leverage.is_finite() || self.max_leverage <= 0.0 {
            return Err(RiskError::InvalidInput(format!(
                "max_leverage must be finite and > 0, got {}",
                self.max_leverage
            )));
        }
        if !self.max_position_qty.is_finite() || self.max_position_qty < 0.0 {
            return Err(RiskError::InvalidInput(format!(
                "max_position_qty must be finite and >= 0, got {}",
                self.max_position_qty
            )));
        }
        if !(self.stop_distance_fraction > 0.0 && self.stop_distance_fraction < 1.0) {
            return Err(RiskError::InvalidInput(format!(
                "stop_distance_fraction must be in (0, 1), got {}",
                self.stop_distance_fraction
            )));
        }
        if !self.stop_distance_multiple.is_finite() || self.stop_distance_multiple <= 0.0 {
            return Err(RiskError::InvalidInput(format!(
                "stop_distance_multiple must be finite and > 0, got {}",
                self.stop_distance_multiple
            )));
        }
        if !self.min_tick.is_finite() || self.min_tick < 0.0 {
            return Err(RiskError::InvalidInput(format!(
                "min_tick must be finite and >= 0, got {}",
                self.min_tick
            )));
        }
        Ok(())
    }
}

/// Position sizing and trade gating.
///
/// Holds only configuration: every method is a pure function of its inputs, so
/// identical inputs always size identically.
#[derive(Debug, Clone)]
pub struct RiskManager {
    config: RiskConfig,
    stop_column: Option<usize>,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Result<Self, RiskError> {
        config.validate()?;
        if let Some(column) = &config.stop_distance_column {
            return Err(RiskError::InvalidInput(format!(
                "stop_distance_column '{column}' needs a feature schema; use with_feature_schema"
            )));
        }
        Ok(Self {
            config,
            stop_column: None,
        })
    }

    /// Builds a manager whose stop distance may come from a named feature column.
    pub fn with_feature_schema(
        config: RiskConfig,
        feature_names: &[String],
    ) -> Result<Self, RiskError> {
        config.validate()?;
        let stop_column = match &config.stop_distance_column {
            Some(column) => Some(
                feature_names
                    .iter()
                    .position(|name| name == column)
                    .ok_or_else(|| {
                        RiskError::InvalidInput(format!(
                            "stop_distance_column '{column}' is not a feature column"
                        ))
                    })?,
            ),
            None => None,
        };
        Ok(Self {
            config,
            stop_column,
        })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Fixed-fractional sizing: `(capital * risk_fraction) / |entry - stop|`,
    /// capped so that `quantity * entry_price <= max_leverage * capital`.
    pub fn calculate_position_size(
        &self,
        capital: f64,
        entry_price: f64,
        stop_loss: f64,
        risk_fraction: f64,
    ) -> Result<f64, RiskError> {
        self.size_parts(capital, entry_price, stop_loss, risk_fraction)
            .map(|(_, clamped)| clamped)
    }

    /// Returns `(raw, leverage_clamped)` quantities.
    fn size_parts(
        &self,
        capital: f64,
        entry_price: f64,
        stop_loss: f64,
        risk_fraction: f64,
    ) -> Result<(f64, f64), RiskError> {
        ensure_finite("capital", capital)?;
        ensure_finite("entry_price", entry_price)?;
        ensure_finite("stop_loss", stop_loss)?;
        ensure_finite("risk_fraction", risk_fraction)?;

        if capital <= 0.0 {
            return Err(RiskError::InvalidInput(format!(
                "capital must be > 0, got {capital}"
            )));
        }
        if entry_price <= 0.0 {
            return Err(RiskError::InvalidInput(format!(
                "entry_price must be > 0, got {entry_price}"
            )));
        }
        if !(risk_fraction > 0.0 && risk_fraction <= 1.0) {
            return Err(RiskError::InvalidInput(format!(
                "risk_fraction must be in (0, 1], got {risk_fraction}"
            )));
        }

        let risk_per_unit = (entry_price - stop_loss).abs();
        if risk_per_unit == 0.0 || risk_per_unit < self.config.min_tick {
            return Err(RiskError::DegenerateStop {
                entry: entry_price,
                stop: stop_loss,
                min_tick: self.config.min_tick,
            });
        }

        let raw = (capital * risk_fraction) / risk_per_unit;
        let max_qty = self.config.max_leverage * capital / entry_price;
        Ok((raw, raw.min(max_qty)))
    }

    /// Stop distance for `bar`: the configured feature column times its multiple,
    /// or a fixed fraction of the close.
    ///
    /// A missing, non-finite or non-positive column value yields 0, which sizing
    /// treats as a degenerate stop.
    pub fn stop_distance(&self, bar: &Bar) -> f64 {
        match self.stop_column {
            Some(idx) => match bar.features.get(idx) {
                Some(value) if value.is_finite() && *value > 0.0 => {
                    value * self.config.stop_distance_multiple
                }
                _ => 0.0,
            },
            None => bar.close * self.config.stop_distance_fraction,
        }
    }

    /// Stop level on the losing side of `bar.close` for a position opened with `side`.
    pub fn stop_price(&self, side: Side, bar: &Bar) -> f64 {
        let distance = self.stop_distance(bar);
        debug_assert!(distance.is_nan() || distance >= 0.0, "negative stop distance");
        match side {
            Side::Buy => bar.close - distance,
            Side::Sell => bar.close + distance,
        }
    }

    /// Translates a raw action into a risk-bounded order priced at `bar.close`.
    ///
    /// Risky-but-valid requests are clamped and annotated; only impossible input
    /// (non-finite prices or equity) is an error.
    pub fn size_order(
        &self,
        account: &AccountState,
        action: &Action,
        bar: &Bar,
    ) -> Result<SizedOrder, RiskError> {
        ensure_finite("close", bar.close)?;
        if bar.close <= 0.0 {
            return Err(RiskError::InvalidInput(format!(
                "close must be > 0, got {}",
                bar.close
            )));
        }
        let equity = account.equity(bar.close);
        ensure_finite("equity", equity)?;

        match action {
            Action::Discrete(DiscreteAction::Hold) | Action::Discrete(DiscreteAction::Flat) => {
                Ok(SizedOrder::none())
            }
            Action::Discrete(DiscreteAction::Long) => {
                self.directional(account, equity, Side::Buy, 1.0, bar)
            }
            Action::Discrete(DiscreteAction::Short) => {
                self.directional(account, equity, Side::Sell, 1.0, bar)
            }
            Action::Target(fraction) => {
                ensure_finite("target", *fraction)?;
                self.toward_target(account, equity, *fraction, bar)
            }
        }
    }

    fn directional(
        &self,
        account: &AccountState,
        equity: f64,
        side: Side,
        fraction: f64,
        bar: &Bar,
    ) -> Result<SizedOrder, RiskError> {
        if let Some(order) = self.flatten_if_opposite(account, side) {
            return Ok(order);
        }
        if side == Side::Sell && !self.config.allow_short {
            return Ok(SizedOrder::none_with(SizingNote::ShortDisabled));
        }
        if equity <= 0.0 {
            return Ok(SizedOrder::none_with(SizingNote::NoCapital));
        }

        let (qty, stop, leverage_clamped) = match self.risk_quantity(equity, side, bar)? {
            Some(parts) => parts,
            None => return Ok(SizedOrder::none_with(SizingNote::DegenerateStop)),
        };

        let mut order = SizedOrder::new(side, qty * fraction, Some(stop));
        if leverage_clamped {
            order.note(SizingNote::LeverageClamped);
        }
        self.clamp_exposure(&mut order, account.position.abs(), equity, bar.close);
        Ok(order)
    }

    fn toward_target(
        &self,
        account: &AccountState,
        equity: f64,
        fraction: f64,
        bar: &Bar,
    ) -> Result<SizedOrder, RiskError> {
        if fraction == 0.0 {
            if account.is_flat() {
                return Ok(SizedOrder::none());
            }
            let side = if account.position > 0.0 {
                Side::Sell
            } else {
                Side::Buy
            };
            return Ok(SizedOrder::new(side, account.position.abs(), None));
        }

        let side = if fraction > 0.0 { Side::Buy } else { Side::Sell };
        if let Some(order) = self.flatten_if_opposite(account, side) {
            return Ok(order);
        }
        if side == Side::Sell && !self.config.allow_short {
            return Ok(SizedOrder::none_with(SizingNote::ShortDisabled));
        }
        if equity <= 0.0 {
            return Ok(SizedOrder::none_with(SizingNote::NoCapital));
        }

        let (qty, stop, leverage_clamped) = match self.risk_quantity(equity, side, bar)? {
            Some(parts) => parts,
            None => return Ok(SizedOrder::none_with(SizingNote::DegenerateStop)),
        };

        let target = qty * fraction.abs();
        let current = if account.is_flat() {
            0.0
        } else {
            account.position.abs()
        };

        if target > current {
            let mut order = SizedOrder::new(side, target - current, Some(stop));
            if leverage_clamped {
                order.note(SizingNote::LeverageClamped);
            }
            self.clamp_exposure(&mut order, current, equity, bar.close);
            Ok(order)
        } else if target < current {
            Ok(SizedOrder::new(side.opposite(), current - target, None))
        } else {
            Ok(SizedOrder::none())
        }
    }

    /// No simultaneous long and short: an opposite signal only closes the open side.
    fn flatten_if_opposite(&self, account: &AccountState, side: Side) -> Option<SizedOrder> {
        if account.is_flat() || account.position.signum() == side.sign() {
            return None;
        }
        let mut order = SizedOrder::new(side, account.position.abs(), None);
        order.note(SizingNote::FlattenBeforeReverse);
        Some(order)
    }

    /// Risk-sized quantity and stop for a new exposure; `None` on a degenerate stop.
    fn risk_quantity(
        &self,
        equity: f64,
        side: Side,
        bar: &Bar,
    ) -> Result<Option<(f64, f64, bool)>, RiskError> {
        let stop = self.stop_price(side, bar);
        if !stop.is_finite() {
            return Ok(None);
        }
        match self.size_parts(equity, bar.close, stop, self.config.risk_fraction) {
            Ok((raw, clamped)) => Ok(Some((clamped, stop, clamped < raw))),
            Err(RiskError::DegenerateStop { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn clamp_exposure(&self, order: &mut SizedOrder, current_abs: f64, equity: f64, price: f64) {
        let leverage_room = (self.config.max_leverage * equity / price - current_abs).max(0.0);
        order.clamp_to(leverage_room, SizingNote::LeverageClamped);
        if self.config.max_position_qty > 0.0 {
            let limit_room = (self.config.max_position_qty - current_abs).max(0.0);
            order.clamp_to(limit_room, SizingNote::PositionLimitClamped);
        }
    }
}

fn ensure_finite(field: &'static str, value: f64) -> Result<(), RiskError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RiskError::NonFiniteValue { field, value })
    }
}
