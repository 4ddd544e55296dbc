use crate::error::EnvError;
use crate::value_objects::bar::Bar;
use std::sync::Arc;

/// Ordered, immutable bars with a fixed feature schema.
///
/// Cloning shares the underlying bars, so one series can back any number of
/// episodes or parallel environments without copying.
#[derive(Debug, Clone)]
pub struct MarketSeries {
    symbol: Arc<str>,
    feature_names: Arc<[String]>,
    bars: Arc<[Bar]>,
}

impl MarketSeries {
    pub fn new(
        symbol: impl Into<String>,
        feature_names: Vec<String>,
        bars: Vec<Bar>,
    ) -> Result<Self, EnvError> {
        if bars.is_empty() {
            return Err(EnvError::InvalidSeries(
                "series must contain at least one bar".to_string(),
            ));
        }

        let width = feature_names.len();
        let mut prev_ts: Option<i64> = None;
        for (idx, bar) in bars.iter().enumerate() {
            bar.validate().map_err(EnvError::InvalidSeries)?;
            if bar.features.len() != width {
                return Err(EnvError::InvalidSeries(format!(
                    "bar {idx} has {} feature values, schema has {width}",
                    bar.features.len()
                )));
            }
            if let Some(prev) = prev_ts {
                if bar.timestamp <= prev {
                    return Err(EnvError::InvalidSeries(format!(
                        "timestamps must be strictly increasing (bar {idx}: {} after {prev})",
                        bar.timestamp
                    )));
                }
            }
            prev_ts = Some(bar.timestamp);
        }

        Ok(Self {
            symbol: Arc::from(symbol.into()),
            feature_names: Arc::from(feature_names),
            bars: Arc::from(bars),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn bar(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    pub fn last_index(&self) -> usize {
        self.bars.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::MarketSeries;
    use crate::error::EnvError;
    use crate::value_objects::bar::Bar;

    fn bar(ts: i64, close: f64) -> Bar {
        Bar::new(ts, close, close, close, close, 1.0).with_features(vec![close / 100.0])
    }

    #[test]
    fn new_accepts_ordered_bars() {
        let series = MarketSeries::new(
            "BTCUSD",
            vec!["f".to_string()],
            vec![bar(1, 100.0), bar(2, 101.0)],
        )
        .expect("valid series");
        assert_eq!(series.len(), 2);
        assert_eq!(series.feature_index("f"), Some(0));
        assert_eq!(series.last_index(), 1);
    }

    #[test]
    fn new_rejects_empty_series() {
        let err = MarketSeries::new("BTCUSD", Vec::new(), Vec::new()).expect_err("empty");
        assert!(matches!(err, EnvError::InvalidSeries(_)));
    }

    #[test]
    fn new_rejects_non_increasing_timestamps() {
        let err = MarketSeries::new(
            "BTCUSD",
            vec!["f".to_string()],
            vec![bar(2, 100.0), bar(2, 101.0)],
        )
        .expect_err("duplicate timestamp");
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn new_rejects_feature_width_mismatch() {
        let err = MarketSeries::new("BTCUSD", Vec::new(), vec![bar(1, 100.0)])
            .expect_err("width mismatch");
        assert!(err.to_string().contains("feature values"));
    }

    #[test]
    fn clones_share_bars() {
        let series =
            MarketSeries::new("BTCUSD", vec!["f".to_string()], vec![bar(1, 100.0)]).unwrap();
        let copy = series.clone();
        assert!(std::ptr::eq(series.bars().as_ptr(), copy.bars().as_ptr()));
    }
}
