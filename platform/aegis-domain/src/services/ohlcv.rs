use crate::value_objects::bar::Bar;
use serde::{Deserialize, Serialize};

/// Problems found in a raw bar stream before it becomes a [`MarketSeries`].
///
/// [`MarketSeries`]: crate::value_objects::market_series::MarketSeries
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub rows: usize,
    pub duplicates: usize,
    pub gaps: usize,
    pub out_of_order: usize,
    pub invalid_bars: usize,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    pub first_gap: Option<i64>,
    pub first_duplicate: Option<i64>,
    pub first_out_of_order: Option<i64>,
    pub first_invalid: Option<i64>,
    pub max_gap_seconds: Option<i64>,
}

impl DataQualityReport {
    /// Whether the bars can be loaded into a series as-is.
    pub fn is_clean(&self) -> bool {
        self.duplicates == 0 && self.out_of_order == 0 && self.invalid_bars == 0
    }
}

pub fn data_quality_from_bars(
    bars: &[Bar],
    expected_step_seconds: Option<i64>,
) -> DataQualityReport {
    let mut report = DataQualityReport {
        rows: bars.len(),
        ..DataQualityReport::default()
    };
    if bars.is_empty() {
        return report;
    }

    let step = expected_step_seconds.unwrap_or(1).max(1);
    report.first_timestamp = Some(bars[0].timestamp);

    let mut last_ts: Option<i64> = None;
    for bar in bars {
        let ts = bar.timestamp;

        if bar.validate().is_err() {
            report.invalid_bars += 1;
            report.first_invalid.get_or_insert(ts);
        }

        if let Some(prev) = last_ts {
            if ts == prev {
                report.duplicates += 1;
                report.first_duplicate.get_or_insert(ts);
            } else if ts < prev {
                report.out_of_order += 1;
                report.first_out_of_order.get_or_insert(ts);
            } else if expected_step_seconds.is_some() && ts - prev > step {
                let diff = ts - prev;
                report.gaps += 1;
                report.first_gap.get_or_insert(ts);
                report.max_gap_seconds =
                    Some(report.max_gap_seconds.map_or(diff, |current| current.max(diff)));
            }
        }

        last_ts = Some(ts);
        report.last_timestamp = Some(ts);
    }

    report
}
