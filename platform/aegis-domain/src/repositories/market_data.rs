use crate::services::ohlcv::DataQualityReport;
use crate::value_objects::bar::Bar;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct OhlcvQuery {
    pub path: PathBuf,
    pub symbol: String,
    pub expected_step_seconds: Option<i64>,
}

/// Source of raw OHLCV bars; feature columns are added later by the pipeline.
pub trait MarketDataRepository {
    fn load_ohlcv(&self, query: &OhlcvQuery) -> Result<(Vec<Bar>, DataQualityReport), String>;
}
