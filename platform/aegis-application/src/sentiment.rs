use aegis_domain::services::sentiment::SentimentPoint;
use std::collections::BTreeMap;

/// For each bar, the latest sentiment point at or before `bar_ts - lag_seconds`.
pub fn align_with_bars(
    bar_timestamps: &[i64],
    sentiment: &[SentimentPoint],
    lag_seconds: i64,
) -> Vec<Option<SentimentPoint>> {
    let map: BTreeMap<i64, &SentimentPoint> = sentiment
        .iter()
        .map(|point| (point.timestamp, point))
        .collect();

    bar_timestamps
        .iter()
        .map(|ts| {
            let cutoff = ts.saturating_sub(lag_seconds);
            map.range(..=cutoff)
                .next_back()
                .map(|(_, point)| (*point).clone())
        })
        .collect()
}

/// Feature column names for a sentiment schema.
pub fn sentiment_feature_names(schema: &[String]) -> Vec<String> {
    schema.iter().map(|name| format!("sent_{name}")).collect()
}

/// Dense feature rows from aligned points; bars without a point get zeros.
pub fn sentiment_rows(aligned: &[Option<SentimentPoint>], width: usize) -> Vec<Vec<f64>> {
    aligned
        .iter()
        .map(|point| match point {
            Some(point) => {
                let mut row: Vec<f64> = point
                    .values
                    .iter()
                    .map(|v| if v.is_finite() { *v } else { 0.0 })
                    .collect();
                row.resize(width, 0.0);
                row
            }
            None => vec![0.0; width],
        })
        .collect()
}
