use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV observation plus the precomputed feature columns for that interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub features: Vec<f64>,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            features: Vec::new(),
        }
    }

    pub fn with_features(mut self, features: Vec<f64>) -> Self {
        self.features = features;
        self
    }

    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.timestamp, 0)
    }

    /// Checks `low <= min(open, close) <= max(open, close) <= high` with positive finite prices.
    pub fn validate(&self) -> Result<(), String> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (name, value) in prices {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!(
                    "bar ts={} has non-positive or non-finite {name}: {value}",
                    self.timestamp
                ));
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(format!(
                "bar ts={} has invalid volume: {}",
                self.timestamp, self.volume
            ));
        }
        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        if self.low > body_low || body_high > self.high {
            return Err(format!(
                "bar ts={} violates OHLC ordering (o={} h={} l={} c={})",
                self.timestamp, self.open, self.high, self.low, self.close
            ));
        }
        Ok(())
    }
}
