use crate::entities::account::AccountState;
use crate::error::EnvError;
use crate::value_objects::market_series::MarketSeries;
use crate::value_objects::observation::Observation;

/// Builds the observation for the window ending at `cursor`.
///
/// Fails with `NonFiniteValue` if any feature value in the window is NaN or infinite.
pub fn build_observation(
    series: &MarketSeries,
    account: &AccountState,
    cursor: usize,
    window: usize,
) -> Result<Observation, EnvError> {
    let n_features = series.feature_count();
    let start = (cursor + 1).checked_sub(window).ok_or_else(|| {
        EnvError::InvalidSeries(format!("cursor {cursor} precedes a full window of {window}"))
    })?;
    let bars = series.bars().get(start..=cursor).ok_or_else(|| {
        EnvError::InvalidSeries(format!("cursor {cursor} is past the end of the series"))
    })?;

    let mut values = Vec::with_capacity(Observation::expected_len(window, n_features));
    for bar in bars {
        for (idx, value) in bar.features.iter().enumerate() {
            if !value.is_finite() {
                return Err(EnvError::NonFiniteValue {
                    field: format!("feature {}", series.feature_names()[idx]),
                    value: *value,
                });
            }
            values.push(*value);
        }
    }

    let close = bars[bars.len() - 1].close;
    values.extend_from_slice(&account_features(account, close));

    Ok(Observation {
        values,
        window,
        n_features,
    })
}

/// `[exposure, unrealized_pnl, cash]`, each as a fraction of equity.
pub fn account_features(account: &AccountState, close: f64) -> [f64; 3] {
    let equity = account.equity(close);
    if !equity.is_finite() || equity <= 0.0 {
        return [0.0; 3];
    }
    [
        account.position * close / equity,
        account.unrealized_pnl(close) / equity,
        account.cash / equity,
    ]
}
