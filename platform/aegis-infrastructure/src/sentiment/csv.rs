use crate::timestamps::parse_timestamp;
use aegis_domain::repositories::sentiment::{SentimentQuery, SentimentRepository};
use aegis_domain::services::sentiment::{MissingValuePolicy, SentimentPoint, SentimentReport};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// Loads precomputed sentiment scores: a timestamp column followed by one numeric column per score.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvSentimentRepository;

impl CsvSentimentRepository {
    pub fn new() -> Self {
        Self
    }
}

impl SentimentRepository for CsvSentimentRepository {
    fn load_sentiment(
        &self,
        query: &SentimentQuery,
    ) -> Result<(Vec<SentimentPoint>, SentimentReport), String> {
        let start = Instant::now();
        let result = load_csv(&query.path, query.missing_policy);
        let result_label = if result.is_ok() { "ok" } else { "err" };
        metrics::counter!("aegis.infra.sentiment.load.calls_total", "result" => result_label)
            .increment(1);
        metrics::histogram!("aegis.infra.sentiment.load_ms", "result" => result_label)
            .record(start.elapsed().as_millis() as f64);
        result
    }
}

/// Rows are keyed by timestamp; a later duplicate replaces the earlier row.
pub fn load_csv(
    path: &Path,
    policy: MissingValuePolicy,
) -> Result<(Vec<SentimentPoint>, SentimentReport), String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open sentiment CSV {}: {}", path.display(), err))?;
    let mut reader = ::csv::Reader::from_reader(file);

    let mut raw_by_ts: BTreeMap<i64, Vec<Option<f64>>> = BTreeMap::new();
    let mut report = SentimentReport::default();
    let mut last_ts: Option<i64> = None;

    let headers = reader
        .headers()
        .map_err(|err| format!("failed to read sentiment CSV headers: {}", err))?
        .clone();
    report.schema = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();
    let schema_len = report.schema.len();
    if schema_len == 0 {
        return Err(format!(
            "sentiment CSV {} has no score columns",
            path.display()
        ));
    }

    for result in reader.records() {
        let record = result.map_err(|err| format!("failed to parse sentiment CSV row: {}", err))?;
        report.rows += 1;
        let timestamp_str = record
            .get(0)
            .ok_or_else(|| "missing timestamp column".to_string())?;
        let timestamp = parse_timestamp(timestamp_str)?;

        report.first_timestamp.get_or_insert(timestamp);
        if let Some(prev) = last_ts {
            if timestamp < prev {
                report.out_of_order += 1;
                report.first_out_of_order.get_or_insert(timestamp);
            }
        }
        last_ts = Some(timestamp);
        report.last_timestamp = Some(timestamp);

        let mut values: Vec<Option<f64>> = vec![None; schema_len];
        for (idx, slot) in values.iter_mut().enumerate() {
            let raw = record.get(idx + 1).unwrap_or("").trim();
            if raw.is_empty() {
                report.missing_values += 1;
                continue;
            }
            match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => *slot = Some(value),
                _ => {
                    report.invalid_values += 1;
                    if policy == MissingValuePolicy::Error {
                        return Err(format!(
                            "invalid sentiment value '{}' in column {} at ts={}",
                            raw, report.schema[idx], timestamp
                        ));
                    }
                }
            }
        }

        if raw_by_ts.insert(timestamp, values).is_some() {
            report.duplicates += 1;
            report.first_duplicate.get_or_insert(timestamp);
        }
    }

    let mut points = Vec::with_capacity(raw_by_ts.len());
    let mut last_values: Vec<Option<f64>> = vec![None; schema_len];
    for (timestamp, values) in raw_by_ts {
        if policy == MissingValuePolicy::DropRow && values.iter().any(Option::is_none) {
            report.dropped_rows += 1;
            continue;
        }
        let mut resolved = Vec::with_capacity(schema_len);
        for (idx, value) in values.into_iter().enumerate() {
            let v = match value {
                Some(v) => {
                    last_values[idx] = Some(v);
                    v
                }
                None => match policy {
                    MissingValuePolicy::Error => {
                        return Err(format!(
                            "missing sentiment value in column {} at ts={}",
                            report.schema[idx], timestamp
                        ))
                    }
                    MissingValuePolicy::ZeroFill | MissingValuePolicy::DropRow => 0.0,
                    MissingValuePolicy::ForwardFill => last_values[idx].unwrap_or(0.0),
                },
            };
            resolved.push(v);
        }
        points.push(SentimentPoint {
            timestamp,
            values: resolved,
        });
    }

    Ok((points, report))
}
