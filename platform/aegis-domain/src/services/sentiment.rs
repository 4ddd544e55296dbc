use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    #[default]
    Error,
    ZeroFill,
    ForwardFill,
    DropRow,
}

/// Precomputed sentiment scores at one instant; scoring itself happens upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentPoint {
    pub timestamp: i64,
    pub values: Vec<f64>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub rows: usize,
    pub duplicates: usize,
    pub out_of_order: usize,
    pub missing_values: usize,
    pub invalid_values: usize,
    pub dropped_rows: usize,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    pub first_duplicate: Option<i64>,
    pub first_out_of_order: Option<i64>,
    pub schema: Vec<String>,
}
