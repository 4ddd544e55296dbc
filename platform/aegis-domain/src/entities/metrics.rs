use crate::entities::account::AccountState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Risk-free rate per step, subtracted from each step return.
    pub risk_free_rate: f64,
    /// Steps per year used to annualize the Sharpe ratio; defaults to the sample size.
    pub annualization_factor: Option<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            annualization_factor: None,
        }
    }
}

/// Summary statistics of one finished (or interrupted) episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetrics {
    pub steps: usize,
    pub fills: usize,
    /// Fills that realized P&L (closing or reducing a position).
    pub closed_trades: usize,
    pub win_rate: f64,
    pub initial_equity: f64,
    pub final_equity: f64,
    pub net_profit: f64,
    pub total_return: f64,
    pub total_cost: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub total_reward: f64,
}

impl EpisodeMetrics {
    pub fn from_account(account: &AccountState, total_reward: f64, config: MetricsConfig) -> Self {
        let curve = &account.equity_history;
        let initial_equity = curve.first().copied().unwrap_or(0.0);
        let final_equity = curve.last().copied().unwrap_or(initial_equity);
        let net_profit = final_equity - initial_equity;
        let total_return = if initial_equity > 0.0 {
            net_profit / initial_equity
        } else {
            0.0
        };

        let realized: Vec<f64> = account
            .fills
            .iter()
            .filter_map(|fill| fill.realized_pnl)
            .collect();
        let wins = realized.iter().filter(|pnl| **pnl > 0.0).count();
        let win_rate = if realized.is_empty() {
            0.0
        } else {
            wins as f64 / realized.len() as f64
        };

        Self {
            steps: account.steps_taken(),
            fills: account.fills.len(),
            closed_trades: realized.len(),
            win_rate,
            initial_equity,
            final_equity,
            net_profit,
            total_return,
            total_cost: account.fills.iter().map(|fill| fill.cost).sum(),
            sharpe: sharpe_ratio(curve, config),
            max_drawdown: max_drawdown(curve),
            total_reward,
        }
    }
}

pub fn max_drawdown(curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0f64;
    for &equity in curve {
        if equity > peak {
            peak = equity;
        } else if peak > 0.0 {
            worst = worst.max((peak - equity) / peak);
        }
    }
    worst
}

pub fn sharpe_ratio(curve: &[f64], config: MetricsConfig) -> f64 {
    if curve.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = curve
        .windows(2)
        .filter(|pair| pair[0] > 0.0)
        .map(|pair| pair[1] / pair[0] - 1.0 - config.risk_free_rate)
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let var = returns
        .iter()
        .map(|ret| {
            let diff = ret - mean;
            diff * diff
        })
        .sum::<f64>()
        / (returns.len() as f64 - 1.0);

    let std = var.sqrt();
    if std == 0.0 || !std.is_finite() {
        0.0
    } else {
        let scale = config.annualization_factor.unwrap_or(returns.len() as f64);
        mean / std * scale.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::{max_drawdown, sharpe_ratio, EpisodeMetrics, MetricsConfig};
    use crate::entities::account::AccountState;
    use crate::value_objects::side::Side;
    use crate::value_objects::trade::{Fill, FillReason};

    #[test]
    fn drawdown_tracks_worst_peak_to_trough() {
        let dd = max_drawdown(&[100.0, 120.0, 90.0, 130.0, 117.0]);
        assert!((dd - 0.25).abs() < 1e-12);
        assert_eq!(max_drawdown(&[100.0]), 0.0);
    }

    #[test]
    fn flat_curve_has_zero_sharpe() {
        assert_eq!(
            sharpe_ratio(&[100.0, 100.0, 100.0], MetricsConfig::default()),
            0.0
        );
    }

    #[test]
    fn summary_counts_winning_closes() {
        let mut account = AccountState::new(1000.0);
        for (step, pnl) in [(1, Some(5.0)), (2, None), (3, Some(-2.0))] {
            account.fills.push(Fill {
                step,
                timestamp: step as i64,
                side: Side::Sell,
                quantity: 1.0,
                price: 10.0,
                cost: 0.5,
                realized_pnl: pnl,
                reason: FillReason::Policy,
            });
        }
        account.record_equity(1010.0);
        account.record_equity(1003.0);

        let metrics = EpisodeMetrics::from_account(&account, 0.1, MetricsConfig::default());
        assert_eq!(metrics.steps, 2);
        assert_eq!(metrics.fills, 3);
        assert_eq!(metrics.closed_trades, 2);
        assert!((metrics.win_rate - 0.5).abs() < 1e-12);
        assert!((metrics.net_profit - 3.0).abs() < 1e-12);
        assert!((metrics.total_cost - 1.5).abs() < 1e-12);
    }
}
