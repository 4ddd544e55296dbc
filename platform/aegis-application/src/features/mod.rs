//! Technical indicator columns computed from raw OHLCV bars.
//!
//! Every column is defined for every bar: values that need more history than
//! is available yet are emitted as 0, so the series never carries NaN.

mod rolling;

pub use rolling::{RollingAtr, RollingRsi, RollingSma, RollingStd};

use aegis_domain::value_objects::bar::Bar;
use aegis_domain::value_objects::market_series::MarketSeries;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnMode {
    Log,
    Pct,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureConfig {
    pub return_mode: ReturnMode,
    pub sma_windows: Vec<usize>,
    pub volatility_windows: Vec<usize>,
    pub rsi_window: Option<usize>,
    pub atr_window: Option<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            return_mode: ReturnMode::Log,
            sma_windows: vec![10],
            volatility_windows: vec![20],
            rsi_window: Some(14),
            atr_window: Some(14),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: FeatureConfig,
    names: Vec<String>,
}

impl FeaturePipeline {
    pub fn new(config: FeatureConfig) -> Result<Self, String> {
        let all_windows = config
            .sma_windows
            .iter()
            .chain(&config.volatility_windows)
            .chain(config.rsi_window.iter())
            .chain(config.atr_window.iter());
        if all_windows.into_iter().any(|w| *w == 0) {
            return Err("feature windows must be >= 1".to_string());
        }

        let mut names = vec!["ret".to_string()];
        names.extend(config.sma_windows.iter().map(|w| format!("sma_{w}")));
        names.extend(config.volatility_windows.iter().map(|w| format!("vol_{w}")));
        names.extend(config.rsi_window.iter().map(|w| format!("rsi_{w}")));
        names.extend(config.atr_window.iter().map(|w| format!("atr_{w}")));

        Ok(Self { config, names })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    /// One row of indicator values per bar, in `feature_names()` order.
    pub fn compute(&self, bars: &[Bar]) -> Vec<Vec<f64>> {
        let mut smas: Vec<RollingSma> = self
            .config
            .sma_windows
            .iter()
            .copied()
            .map(RollingSma::new)
            .collect();
        let mut vols: Vec<RollingStd> = self
            .config
            .volatility_windows
            .iter()
            .copied()
            .map(RollingStd::new)
            .collect();
        let mut rsi = self.config.rsi_window.map(RollingRsi::new);
        let mut atr = self.config.atr_window.map(RollingAtr::new);

        let mut prev_close: Option<f64> = None;
        let mut rows = Vec::with_capacity(bars.len());
        for bar in bars {
            let mut values = Vec::with_capacity(self.names.len());

            let ret = match prev_close {
                Some(prev) if prev > 0.0 => Some(match self.config.return_mode {
                    ReturnMode::Log => (bar.close / prev).ln(),
                    ReturnMode::Pct => bar.close / prev - 1.0,
                }),
                _ => None,
            };
            prev_close = Some(bar.close);
            values.push(ret.unwrap_or(0.0));

            for sma in &mut smas {
                let ratio = sma
                    .update(bar.close)
                    .filter(|mean| *mean > 0.0)
                    .map(|mean| bar.close / mean - 1.0);
                values.push(ratio.unwrap_or(0.0));
            }

            match ret {
                Some(ret) => {
                    for vol in &mut vols {
                        values.push(vol.update(ret).unwrap_or(0.0));
                    }
                }
                None => values.extend(std::iter::repeat(0.0).take(vols.len())),
            }

            if let Some(rsi) = &mut rsi {
                values.push(rsi.update(bar.close).unwrap_or(0.0));
            }
            if let Some(atr) = &mut atr {
                values.push(atr.update(bar.high, bar.low, bar.close).unwrap_or(0.0));
            }

            for value in &mut values {
                if !value.is_finite() {
                    *value = 0.0;
                }
            }
            rows.push(values);
        }
        rows
    }

    /// Attaches indicator columns, then any extra columns, and validates the result.
    pub fn build_series(
        &self,
        symbol: &str,
        bars: &[Bar],
        extra: Option<(&[String], &[Vec<f64>])>,
    ) -> Result<MarketSeries, String> {
        let indicators = self.compute(bars);
        let mut names = self.names.clone();

        if let Some((extra_names, extra_rows)) = extra {
            if extra_rows.len() != bars.len() {
                return Err(format!(
                    "extra feature rows ({}) do not match bars ({})",
                    extra_rows.len(),
                    bars.len()
                ));
            }
            names.extend(extra_names.iter().cloned());
        }

        let with_features = bars
            .iter()
            .zip(indicators)
            .enumerate()
            .map(|(idx, (bar, mut row))| {
                if let Some((_, extra_rows)) = extra {
                    row.extend_from_slice(&extra_rows[idx]);
                }
                Bar {
                    features: row,
                    ..bar.clone()
                }
            })
            .collect();

        MarketSeries::new(symbol, names, with_features).map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{FeatureConfig, FeaturePipeline, ReturnMode};
    use aegis_domain::value_objects::bar::Bar;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar::new(i as i64 * 60, *c, c + 1.0, c - 1.0, *c, 10.0))
            .collect()
    }

    fn config() -> FeatureConfig {
        FeatureConfig {
            return_mode: ReturnMode::Pct,
            sma_windows: vec![2],
            volatility_windows: vec![2],
            rsi_window: Some(2),
            atr_window: Some(2),
        }
    }

    #[test]
    fn names_follow_config_order() {
        let pipeline = FeaturePipeline::new(config()).unwrap();
        assert_eq!(
            pipeline.feature_names(),
            &["ret", "sma_2", "vol_2", "rsi_2", "atr_2"]
        );
    }

    #[test]
    fn warm_up_values_are_zero() {
        let pipeline = FeaturePipeline::new(config()).unwrap();
        let rows = pipeline.compute(&bars(&[10.0, 20.0, 10.0]));
        assert_eq!(rows[0], vec![0.0; 5]);
        assert!((rows[1][0] - 1.0).abs() < 1e-12);
        // sma_2 at bar 1 = 15, ratio 20/15 - 1
        assert!((rows[1][1] - (20.0 / 15.0 - 1.0)).abs() < 1e-12);
        assert!(rows[2].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = FeaturePipeline::new(FeatureConfig {
            sma_windows: vec![0],
            ..config()
        })
        .unwrap_err();
        assert!(err.contains(">= 1"));
    }

    #[test]
    fn build_series_appends_extra_columns() {
        let pipeline = FeaturePipeline::new(config()).unwrap();
        let raw = bars(&[10.0, 11.0, 12.0]);
        let names = vec!["sent_score".to_string()];
        let rows = vec![vec![0.1], vec![0.2], vec![0.3]];
        let series = pipeline
            .build_series("BTCUSD", &raw, Some((names.as_slice(), rows.as_slice())))
            .unwrap();
        assert_eq!(series.feature_count(), 6);
        assert_eq!(series.feature_index("sent_score"), Some(5));
        assert_eq!(series.bar(2).unwrap().features[5], 0.3);
    }

    #[test]
    fn mismatched_extra_rows_are_rejected() {
        let pipeline = FeaturePipeline::new(config()).unwrap();
        let names = vec!["sent_score".to_string()];
        let rows = vec![vec![0.1]];
        assert!(pipeline
            .build_series("BTCUSD", &bars(&[10.0, 11.0]), Some((names.as_slice(), rows.as_slice())))
            .is_err());
    }
}
