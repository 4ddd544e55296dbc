use crate::timestamps::parse_timestamp;
use aegis_domain::repositories::market_data::{MarketDataRepository, OhlcvQuery};
use aegis_domain::services::ohlcv::{data_quality_from_bars, DataQualityReport};
use aegis_domain::value_objects::bar::Bar;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct OhlcvRecord {
    #[serde(alias = "timestamp_utc")]
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Reads `timestamp,open,high,low,close,volume` files in row order.
///
/// Rows are not reordered or deduplicated; the returned report says whether
/// the file is usable as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvMarketDataRepository;

impl CsvMarketDataRepository {
    pub fn new() -> Self {
        Self
    }
}

impl MarketDataRepository for CsvMarketDataRepository {
    fn load_ohlcv(&self, query: &OhlcvQuery) -> Result<(Vec<Bar>, DataQualityReport), String> {
        let start = Instant::now();
        let result = load_csv(&query.path, query.expected_step_seconds);
        let result_label = if result.is_ok() { "ok" } else { "err" };
        metrics::counter!("aegis.infra.ohlcv.load.calls_total", "result" => result_label)
            .increment(1);
        metrics::histogram!("aegis.infra.ohlcv.load_ms", "result" => result_label)
            .record(start.elapsed().as_millis() as f64);
        if let Ok((bars, report)) = &result {
            debug!(
                symbol = %query.symbol,
                path = %query.path.display(),
                rows = bars.len(),
                clean = report.is_clean(),
                "loaded OHLCV CSV"
            );
        }
        result
    }
}

pub fn load_csv(
    path: &Path,
    expected_step_seconds: Option<i64>,
) -> Result<(Vec<Bar>, DataQualityReport), String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open OHLCV CSV {}: {}", path.display(), err))?;
    let mut reader = ::csv::Reader::from_reader(file);

    let mut bars = Vec::new();
    for (row, result) in reader.deserialize::<OhlcvRecord>().enumerate() {
        let record =
            result.map_err(|err| format!("failed to parse CSV row {}: {}", row + 1, err))?;
        let timestamp = parse_timestamp(&record.timestamp)?;
        bars.push(Bar::new(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }

    let report = data_quality_from_bars(&bars, expected_step_seconds);
    Ok((bars, report))
}
