//! Sequential trading simulation over a [`MarketSeries`].
//!
//! The environment owns the account for one episode at a time. Every position
//! change passes through the [`RiskManager`]; every `step` computes the whole
//! transition on a staged copy of the account and commits it only when all of
//! prices, equity, reward and the next observation are finite.

mod config;
mod observation;

pub use config::EnvConfig;
pub use observation::{account_features, build_observation};

use crate::entities::account::AccountState;
use crate::entities::risk::RiskManager;
use crate::error::{EnvError, RiskError};
use crate::value_objects::action::{Action, ActionSpace};
use crate::value_objects::bar::Bar;
use crate::value_objects::market_series::MarketSeries;
use crate::value_objects::observation::Observation;
use crate::value_objects::side::Side;
use crate::value_objects::sized_order::{SizedOrder, SizingNote};
use crate::value_objects::step_info::{StepInfo, TerminationReason};
use crate::value_objects::trade::{Fill, FillReason};
use tracing::{debug, warn};

/// Result of one committed step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

#[derive(Debug, Clone)]
pub struct TradingEnvironment {
    series: MarketSeries,
    config: EnvConfig,
    risk: RiskManager,
    account: AccountState,
    cursor: usize,
    steps: usize,
    termination: Option<TerminationReason>,
}

impl TradingEnvironment {
    pub fn new(series: MarketSeries, config: EnvConfig) -> Result<Self, EnvError> {
        config.validate()?;
        if series.len() < config.observation_window_size {
            return Err(EnvError::InvalidSeries(format!(
                "series has {} bars, observation window needs {}",
                series.len(),
                config.observation_window_size
            )));
        }
        let risk = RiskManager::with_feature_schema(config.risk.clone(), series.feature_names())
            .map_err(|err| EnvError::InvalidConfig(err.to_string()))?;

        let mut env = Self {
            account: AccountState::new(config.initial_capital),
            cursor: 0,
            steps: 0,
            termination: None,
            series,
            config,
            risk,
        };
        env.rewind();
        Ok(env)
    }

    /// Starts a new episode and returns its first observation.
    pub fn reset(&mut self) -> Result<Observation, EnvError> {
        self.rewind();
        match self.observe(&self.account, self.cursor) {
            Ok(observation) => Ok(observation),
            Err(err) => {
                self.termination = Some(TerminationReason::NonFinite);
                Err(err)
            }
        }
    }

    fn rewind(&mut self) {
        self.account = AccountState::new(self.config.initial_capital);
        self.cursor = self.start_cursor();
        self.steps = 0;
        self.termination = if self.cursor >= self.series.last_index() {
            Some(TerminationReason::EndOfData)
        } else {
            None
        };
    }

    /// Advances the episode by one bar.
    ///
    /// Errors never leave a partially applied transition behind: on
    /// `InvalidAction` the episode continues unchanged, on `NonFiniteValue` it
    /// terminates with the last valid account, and after termination every call
    /// returns `EpisodeExhausted`.
    pub fn step(&mut self, action: Action) -> Result<StepOutcome, EnvError> {
        if self.termination.is_some() {
            return Err(EnvError::EpisodeExhausted { steps: self.steps });
        }
        self.config.action_space.validate(&action)?;

        match self.transition(action) {
            Ok((staged, outcome)) => {
                self.account = staged;
                self.cursor = outcome.info.cursor;
                self.steps += 1;
                self.termination = outcome.info.termination;
                Ok(outcome)
            }
            Err(err) => {
                if err.is_fatal() {
                    warn!(step = self.steps, cursor = self.cursor, error = %err, "episode aborted");
                    self.termination = Some(TerminationReason::NonFinite);
                }
                Err(err)
            }
        }
    }

    /// Like [`step`](Self::step), but an invalid action is replaced by the neutral
    /// action of the space and reported in `info.rejected_action`.
    pub fn step_or_hold(&mut self, action: Action) -> Result<StepOutcome, EnvError> {
        match self.step(action) {
            Err(EnvError::InvalidAction(reason)) => {
                warn!(step = self.steps, %reason, "invalid action replaced by hold");
                let mut outcome = self.step(self.config.action_space.hold())?;
                outcome.info.rejected_action = Some(reason);
                Ok(outcome)
            }
            other => other,
        }
    }

    fn transition(&self, action: Action) -> Result<(AccountState, StepOutcome), EnvError> {
        let step = self.steps;
        let bar = self.bar_at(self.cursor)?;
        let price = bar.close;
        let cost_rate = self.config.transaction_cost_rate;

        let mut order = self
            .risk
            .size_order(&self.account, &action, bar)
            .map_err(non_finite_from_risk)?;
        let requested_quantity = order.signed_quantity();
        self.clamp_affordable(&mut order, price);

        let mut staged = self.account.clone();
        let mut transaction_cost = 0.0;
        let mut applied_quantity = 0.0;

        if let Some(side) = order.side {
            let increases = staged.is_flat() || staged.position.signum() == side.sign();
            let cost = (order.quantity * price).abs() * cost_rate;
            execute(&mut staged, step, bar, side, order.quantity, price, cost, FillReason::Policy);
            if increases && order.stop_loss_price.is_some() {
                staged.stop_loss = order.stop_loss_price;
            }
            transaction_cost += cost;
            applied_quantity = order.signed_quantity();
            ensure_finite("cash", staged.cash)?;
        }

        let next = self.cursor + 1;
        let next_bar = self.bar_at(next)?;

        let mut stop_triggered = false;
        if self.config.enforce_stop_loss {
            if let Some((side, fill_price)) = stop_fill(&staged, next_bar) {
                let qty = staged.position.abs();
                let cost = qty * fill_price * cost_rate;
                debug!(step, stop_price = fill_price, qty, "stop loss triggered");
                execute(&mut staged, step, next_bar, side, qty, fill_price, cost, FillReason::StopLoss);
                transaction_cost += cost;
                stop_triggered = true;
            }
        }

        let mut equity = staged.equity(next_bar.close);
        ensure_finite("equity", equity)?;

        let termination = if equity <= self.config.liquidation_floor() {
            Some(TerminationReason::LiquidationFloor)
        } else if staged.drawdown(equity) > self.config.max_drawdown_fraction {
            Some(TerminationReason::MaxDrawdown)
        } else if next >= self.series.last_index() {
            Some(TerminationReason::EndOfData)
        } else if self
            .config
            .max_episode_steps
            .is_some_and(|limit| step + 1 >= limit)
        {
            Some(TerminationReason::StepLimit)
        } else {
            None
        };

        let mut forced_liquidation = false;
        if termination.is_some_and(TerminationReason::is_forced) && !staged.is_flat() {
            let side = if staged.position > 0.0 { Side::Sell } else { Side::Buy };
            let qty = staged.position.abs();
            let cost = qty * next_bar.close * cost_rate;
            warn!(step, ?termination, equity, qty, "forced liquidation");
            execute(
                &mut staged,
                step,
                next_bar,
                side,
                qty,
                next_bar.close,
                cost,
                FillReason::ForcedLiquidation,
            );
            transaction_cost += cost;
            forced_liquidation = true;
            equity = staged.equity(next_bar.close);
            ensure_finite("equity", equity)?;
        }

        staged.record_equity(equity);
        let reward = self.config.reward.compute(&staged.equity_history);
        if reward.degenerate {
            warn!(step, equity, "degenerate reward replaced by 0");
        }

        let observation = self.observe(&staged, next)?;

        let clamped = order.was_clamped();
        let info = StepInfo {
            step,
            cursor: next,
            timestamp: next_bar.timestamp,
            action,
            requested_quantity,
            applied_quantity,
            execution_price: price,
            transaction_cost,
            notes: order.notes,
            clamped,
            stop_triggered,
            forced_liquidation,
            reward_degenerate: reward.degenerate,
            rejected_action: None,
            termination,
            equity,
            cash: staged.cash,
            position: staged.position,
            drawdown: staged.drawdown(equity),
        };
        debug!(
            step,
            cursor = next,
            applied_quantity,
            equity,
            reward = reward.value,
            clamped,
            "step committed"
        );

        Ok((
            staged,
            StepOutcome {
                observation,
                reward: reward.value,
                done: termination.is_some(),
                info,
            },
        ))
    }

    /// Shrinks an exposure-increasing order that the account cannot carry.
    ///
    /// Buys are limited by the margin allowance `(max_leverage - 1) * equity`,
    /// and the order's cost may not take equity below the liquidation floor.
    /// Reductions are never clamped.
    fn clamp_affordable(&self, order: &mut SizedOrder, price: f64) {
        let Some(side) = order.side else {
            return;
        };
        let account = &self.account;
        let increases = account.is_flat() || account.position.signum() == side.sign();
        if !increases {
            return;
        }
        let cost_rate = self.config.transaction_cost_rate;
        let equity = account.equity(price);

        if side == Side::Buy {
            let margin = (self.config.risk.max_leverage - 1.0).max(0.0) * equity.max(0.0);
            let max_qty = ((account.cash + margin) / (price * (1.0 + cost_rate))).max(0.0);
            order.clamp_to(max_qty, SizingNote::AffordabilityClamped);
        }

        if cost_rate > 0.0 {
            let headroom = (equity - self.config.liquidation_floor()).max(0.0);
            order.clamp_to(headroom / (price * cost_rate), SizingNote::AffordabilityClamped);
        }
    }

    fn observe(&self, account: &AccountState, cursor: usize) -> Result<Observation, EnvError> {
        build_observation(
            &self.series,
            account,
            cursor,
            self.config.observation_window_size,
        )
    }

    fn bar_at(&self, index: usize) -> Result<&Bar, EnvError> {
        self.series
            .bar(index)
            .ok_or(EnvError::EpisodeExhausted { steps: self.steps })
    }

    fn start_cursor(&self) -> usize {
        self.config.observation_window_size - 1
    }

    pub fn account(&self) -> &AccountState {
        &self.account
    }

    pub fn series(&self) -> &MarketSeries {
        &self.series
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn risk_manager(&self) -> &RiskManager {
        &self.risk
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_done(&self) -> bool {
        self.termination.is_some()
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    pub fn steps_taken(&self) -> usize {
        self.steps
    }

    pub fn observation_len(&self) -> usize {
        Observation::expected_len(
            self.config.observation_window_size,
            self.series.feature_count(),
        )
    }

    pub fn action_space(&self) -> ActionSpace {
        self.config.action_space
    }

    /// Steps the current bar would leave before end of data.
    pub fn remaining_bars(&self) -> usize {
        self.series.last_index().saturating_sub(self.cursor)
    }
}

#[allow(clippy::too_many_arguments)]
fn execute(
    account: &mut AccountState,
    step: usize,
    bar: &Bar,
    side: Side,
    quantity: f64,
    price: f64,
    cost: f64,
    reason: FillReason,
) {
    let realized_pnl = account.apply_fill(side, quantity, price, cost);
    account.fills.push(Fill {
        step,
        timestamp: bar.timestamp,
        side,
        quantity,
        price,
        cost,
        realized_pnl,
        reason,
    });
}

/// Side and price of the fill that closes a position whose stop `bar` breaches.
fn stop_fill(account: &AccountState, bar: &Bar) -> Option<(Side, f64)> {
    if account.is_flat() {
        return None;
    }
    let stop = account.stop_loss?;
    if account.position > 0.0 && bar.low <= stop {
        Some((Side::Sell, if bar.open <= stop { bar.open } else { stop }))
    } else if account.position < 0.0 && bar.high >= stop {
        Some((Side::Buy, if bar.open >= stop { bar.open } else { stop }))
    } else {
        None
    }
}

fn ensure_finite(field: &str, value: f64) -> Result<(), EnvError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EnvError::NonFiniteValue {
            field: field.to_string(),
            value,
        })
    }
}

fn non_finite_from_risk(err: RiskError) -> EnvError {
    match err {
        RiskError::NonFiniteValue { field, value } => EnvError::NonFiniteValue {
            field: field.to_string(),
            value,
        },
        other => EnvError::Risk(other),
    }
}

#[cfg(test)]
mod tests {
    use super::{EnvConfig, TradingEnvironment};
    use crate::entities::risk::RiskConfig;
    use crate::error::EnvError;
    use crate::value_objects::action::{Action, ActionSpace};
    use crate::value_objects::bar::Bar;
    use crate::value_objects::market_series::MarketSeries;
    use crate::value_objects::sized_order::SizingNote;
    use crate::value_objects::step_info::TerminationReason;
    use crate::value_objects::trade::FillReason;

    fn flat_bar(ts: i64, close: f64) -> Bar {
        Bar::new(ts, close, close, close, close, 100.0).with_features(vec![close / 100.0])
    }

    fn series(closes: &[f64]) -> MarketSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, c)| flat_bar(i as i64 * 3600, *c))
            .collect();
        MarketSeries::new("TEST", vec!["px".to_string()], bars).expect("valid series")
    }

    fn config(window: usize) -> EnvConfig {
        EnvConfig {
            observation_window_size: window,
            ..EnvConfig::default()
        }
    }

    #[test]
    fn reset_starts_at_first_full_window() {
        let mut env = TradingEnvironment::new(series(&[100.0; 6]), config(3)).unwrap();
        let obs = env.reset().unwrap();
        assert_eq!(env.cursor(), 2);
        assert_eq!(obs.len(), env.observation_len());
        assert_eq!(env.account().equity_history, vec![10_000.0]);
        assert!(!env.is_done());
    }

    #[test]
    fn short_series_is_rejected() {
        let err = TradingEnvironment::new(series(&[100.0; 2]), config(3)).unwrap_err();
        assert!(matches!(err, EnvError::InvalidSeries(_)));
    }

    #[test]
    fn series_exactly_one_window_is_done_after_reset() {
        let mut env = TradingEnvironment::new(series(&[100.0; 3]), config(3)).unwrap();
        env.reset().unwrap();
        assert!(env.is_done());
        assert_eq!(env.termination(), Some(TerminationReason::EndOfData));
        assert!(matches!(
            env.step(Action::hold()),
            Err(EnvError::EpisodeExhausted { steps: 0 })
        ));
    }

    #[test]
    fn long_executes_at_close_and_charges_cost() {
        let mut env = TradingEnvironment::new(series(&[100.0, 100.0, 110.0, 110.0]), config(2))
            .unwrap();
        env.reset().unwrap();
        let outcome = env.step(Action::long()).unwrap();
        // 2% stop -> 50 units at 100, cost 5
        assert!((outcome.info.applied_quantity - 50.0).abs() < 1e-9);
        assert!((outcome.info.transaction_cost - 5.0).abs() < 1e-9);
        assert!((outcome.info.equity - (10_000.0 - 5.0 + 500.0)).abs() < 1e-9);
        assert!((outcome.reward - (10_495.0f64 / 10_000.0).ln()).abs() < 1e-12);
        assert_eq!(env.account().stop_loss, Some(98.0));
    }

    #[test]
    fn reversal_flattens_before_opening() {
        let mut env = TradingEnvironment::new(series(&[100.0; 6]), config(1)).unwrap();
        env.reset().unwrap();
        env.step(Action::long()).unwrap();
        let outcome = env.step(Action::short()).unwrap();
        assert!(outcome.info.notes.contains(&SizingNote::FlattenBeforeReverse));
        assert_eq!(env.account().position, 0.0);
        let outcome = env.step(Action::short()).unwrap();
        assert!(outcome.info.position < 0.0);
    }

    #[test]
    fn invalid_action_leaves_state_untouched() {
        let mut env = TradingEnvironment::new(series(&[100.0; 5]), config(2)).unwrap();
        env.reset().unwrap();
        let before = env.account().clone();
        let err = env.step(Action::Target(0.5)).unwrap_err();
        assert!(matches!(err, EnvError::InvalidAction(_)));
        assert!(!err.is_fatal());
        assert_eq!(env.account(), &before);
        assert_eq!(env.steps_taken(), 0);

        let outcome = env.step_or_hold(Action::Target(0.5)).unwrap();
        assert!(outcome.info.rejected_action.is_some());
        assert_eq!(outcome.info.transaction_cost, 0.0);
        assert_eq!(env.steps_taken(), 1);
    }

    #[test]
    fn continuous_space_rejects_out_of_bounds_targets() {
        let mut env = TradingEnvironment::new(
            series(&[100.0; 5]),
            EnvConfig {
                action_space: ActionSpace::continuous(),
                ..config(2)
            },
        )
        .unwrap();
        env.reset().unwrap();
        assert!(matches!(
            env.step(Action::Target(1.5)),
            Err(EnvError::InvalidAction(_))
        ));
        let outcome = env.step(Action::Target(1.0)).unwrap();
        assert!(outcome.info.position > 0.0);
    }

    #[test]
    fn stop_loss_closes_at_stop_or_gap_open() {
        let mut bars = vec![flat_bar(0, 100.0), flat_bar(3600, 100.0)];
        bars.push(Bar::new(7200, 99.0, 99.5, 97.0, 99.0, 100.0).with_features(vec![0.99]));
        bars.push(flat_bar(10800, 99.0));
        let s = MarketSeries::new("TEST", vec!["px".to_string()], bars).unwrap();
        let mut env = TradingEnvironment::new(s, config(2)).unwrap();
        env.reset().unwrap();
        let outcome = env.step(Action::long()).unwrap();
        assert!(outcome.info.stop_triggered);
        assert_eq!(env.account().position, 0.0);
        let stop_fill = env.account().fills.last().unwrap();
        assert_eq!(stop_fill.reason, FillReason::StopLoss);
        assert_eq!(stop_fill.price, 98.0);
    }

    #[test]
    fn step_limit_terminates() {
        let mut env = TradingEnvironment::new(
            series(&[100.0; 10]),
            EnvConfig {
                max_episode_steps: Some(2),
                ..config(1)
            },
        )
        .unwrap();
        env.reset().unwrap();
        assert!(!env.step(Action::hold()).unwrap().done);
        let last = env.step(Action::hold()).unwrap();
        assert!(last.done);
        assert_eq!(last.info.termination, Some(TerminationReason::StepLimit));
    }

    #[test]
    fn nan_feature_aborts_without_committing() {
        let mut bars: Vec<Bar> = (0..4).map(|i| flat_bar(i * 3600, 100.0)).collect();
        bars[2].features = vec![f64::NAN];
        let s = MarketSeries::new("TEST", vec!["px".to_string()], bars).unwrap();
        let mut env = TradingEnvironment::new(s, config(1)).unwrap();
        env.reset().unwrap();
        env.step(Action::hold()).unwrap();
        let before = env.account().clone();
        let err = env.step(Action::long()).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(env.account(), &before);
        assert_eq!(env.termination(), Some(TerminationReason::NonFinite));
        assert!(matches!(
            env.step(Action::hold()),
            Err(EnvError::EpisodeExhausted { .. })
        ));
    }

    fn leveraged(max_leverage: f64) -> RiskConfig {
        RiskConfig {
            risk_fraction: 1.0,
            max_leverage,
            ..RiskConfig::default()
        }
    }

    #[test]
    fn margin_clamp_is_reported_in_info() {
        let mut env = TradingEnvironment::new(
            series(&[100.0; 4]),
            EnvConfig {
                risk: leveraged(3.0),
                ..config(1)
            },
        )
        .unwrap();
        env.reset().unwrap();
        let outcome = env.step(Action::long()).unwrap();
        // leverage caps the order at 300 units; cash plus margin buys 30000 / 100.1
        assert!((outcome.info.requested_quantity - 300.0).abs() < 1e-9);
        let affordable = 30_000.0 / 100.1;
        assert!((outcome.info.applied_quantity - affordable).abs() < 1e-9);
        assert!(outcome.info.clamped);
        assert!(outcome.info.notes.contains(&SizingNote::LeverageClamped));
        assert!(outcome.info.notes.contains(&SizingNote::AffordabilityClamped));
        assert!((outcome.info.cash + 20_000.0).abs() < 1e-6);
    }

    #[test]
    fn floor_headroom_clamp_is_reported_in_info() {
        let mut env = TradingEnvironment::new(
            series(&[100.0, 120.0, 120.0, 120.0]),
            EnvConfig {
                transaction_cost_rate: 0.1,
                liquidation_floor_fraction: 0.99,
                ..config(1)
            },
        )
        .unwrap();
        env.reset().unwrap();
        let outcome = env.step(Action::long()).unwrap();
        // risk sizing asks for 50 units; a cost of 10 per unit leaves room for 10
        assert!((outcome.info.requested_quantity - 50.0).abs() < 1e-9);
        assert!((outcome.info.applied_quantity - 10.0).abs() < 1e-6);
        assert!(outcome.info.clamped);
        assert_eq!(outcome.info.notes, vec![SizingNote::AffordabilityClamped]);
        assert!(outcome.info.termination.is_none());
    }

    #[test]
    fn covering_a_short_is_never_clamped() {
        let mut env = TradingEnvironment::new(
            series(&[100.0, 298.0, 298.0, 298.0]),
            EnvConfig {
                transaction_cost_rate: 0.01,
                liquidation_floor_fraction: 0.0,
                max_drawdown_fraction: 1.0,
                enforce_stop_loss: false,
                ..config(1)
            },
        )
        .unwrap();
        env.reset().unwrap();
        let opened = env.step(Action::short()).unwrap();
        assert!((opened.info.position + 50.0).abs() < 1e-9);
        assert!(opened.info.termination.is_none());

        // cash 14950 cannot pay 50 * 298 * 1.01, yet the whole short is covered
        let covered = env.step(Action::long()).unwrap();
        assert!(covered.info.notes.contains(&SizingNote::FlattenBeforeReverse));
        assert!(!covered.info.notes.contains(&SizingNote::AffordabilityClamped));
        assert!(!covered.info.clamped);
        assert!((covered.info.applied_quantity - 50.0).abs() < 1e-9);
        assert_eq!(env.account().position, 0.0);
    }

    #[test]
    fn drawdown_limit_terminates_and_flattens() {
        let mut env = TradingEnvironment::new(
            series(&[100.0, 100.0, 75.0, 75.0, 75.0]),
            EnvConfig {
                liquidation_floor_fraction: 0.0,
                max_drawdown_fraction: 0.2,
                enforce_stop_loss: false,
                risk: leveraged(1.0),
                ..config(1)
            },
        )
        .unwrap();
        env.reset().unwrap();
        assert!(!env.step(Action::long()).unwrap().done);
        let outcome = env.step(Action::hold()).unwrap();
        assert!(outcome.done);
        assert_eq!(outcome.info.termination, Some(TerminationReason::MaxDrawdown));
        assert!(outcome.info.forced_liquidation);
        assert!(outcome.info.drawdown > 0.2);
        assert_eq!(env.account().position, 0.0);
        let last = env.account().fills.last().unwrap();
        assert_eq!(last.reason, FillReason::ForcedLiquidation);
    }

    #[test]
    fn negative_equity_gives_flagged_zero_reward() {
        let mut env = TradingEnvironment::new(
            series(&[100.0, 30.0, 30.0]),
            EnvConfig {
                liquidation_floor_fraction: 0.0,
                enforce_stop_loss: false,
                risk: leveraged(3.0),
                ..config(1)
            },
        )
        .unwrap();
        env.reset().unwrap();
        let outcome = env.step(Action::long()).unwrap();
        assert!(outcome.info.equity < 0.0);
        assert_eq!(outcome.reward, 0.0);
        assert!(outcome.info.reward_degenerate);
        assert_eq!(
            outcome.info.termination,
            Some(TerminationReason::LiquidationFloor)
        );
    }

    #[test]
    fn negative_stop_column_opens_nothing() {
        let bars = vec![
            Bar::new(0, 100.0, 100.0, 100.0, 100.0, 1.0).with_features(vec![-2.0]),
            Bar::new(3600, 101.0, 103.0, 101.0, 103.0, 1.0).with_features(vec![-2.0]),
            Bar::new(7200, 103.0, 103.0, 103.0, 103.0, 1.0).with_features(vec![-2.0]),
        ];
        let s = MarketSeries::new("TEST", vec!["atr".to_string()], bars).unwrap();
        let mut env = TradingEnvironment::new(
            s,
            EnvConfig {
                risk: RiskConfig {
                    stop_distance_column: Some("atr".to_string()),
                    ..RiskConfig::default()
                },
                ..config(1)
            },
        )
        .unwrap();
        env.reset().unwrap();
        let outcome = env.step(Action::long()).unwrap();
        assert!(outcome.info.notes.contains(&SizingNote::DegenerateStop));
        assert_eq!(outcome.info.applied_quantity, 0.0);
        assert!(!outcome.info.stop_triggered);
        assert!(env.account().fills.is_empty());
        assert_eq!(env.account().stop_loss, None);
    }
}
