use aegis_domain::entities::metrics::EpisodeMetrics;
use aegis_domain::repositories::artifacts::ArtifactWriter;
use aegis_domain::value_objects::step_info::StepInfo;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemArtifactWriter;

impl FilesystemArtifactWriter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Serialize)]
struct SummaryDocument<'a> {
    metrics: &'a EpisodeMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<&'a serde_json::Value>,
}

fn record_write_metrics(kind: &'static str, start: Instant, result: &Result<(), String>) {
    let result_label = if result.is_ok() { "ok" } else { "err" };
    metrics::counter!(
        "aegis.infra.artifacts.write.calls_total",
        "kind" => kind,
        "result" => result_label
    )
    .increment(1);
    metrics::histogram!("aegis.infra.artifacts.write_ms", "kind" => kind, "result" => result_label)
        .record(start.elapsed().as_millis() as f64);
}

fn write_equity(path: &Path, equity: &[f64], timestamps: &[i64]) -> Result<(), String> {
    if equity.len() != timestamps.len() {
        return Err(format!(
            "equity has {} points but {} timestamps",
            equity.len(),
            timestamps.len()
        ));
    }
    let mut wtr = ::csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create equity csv {}: {}", path.display(), err))?;
    wtr.write_record(["step", "timestamp", "equity"])
        .map_err(|err| format!("failed to write equity csv header: {}", err))?;
    for (step, (equity, ts)) in equity.iter().zip(timestamps).enumerate() {
        wtr.write_record([step.to_string(), ts.to_string(), equity.to_string()])
            .map_err(|err| format!("failed to write equity row: {}", err))?;
    }
    wtr.flush()
        .map_err(|err| format!("failed to flush equity csv: {}", err))
}

fn write_steps(path: &Path, steps: &[StepInfo]) -> Result<(), String> {
    let file = fs::File::create(path)
        .map_err(|err| format!("failed to create steps {}: {}", path.display(), err))?;
    let mut out = BufWriter::new(file);
    for step in steps {
        let line = serde_json::to_string(step)
            .map_err(|err| format!("failed to serialize step info: {}", err))?;
        out.write_all(line.as_bytes())
            .and_then(|_| out.write_all(b"\n"))
            .map_err(|err| format!("failed to write step info: {}", err))?;
    }
    out.flush()
        .map_err(|err| format!("failed to flush steps {}: {}", path.display(), err))
}

impl ArtifactWriter for FilesystemArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String> {
        let start = Instant::now();
        let result = fs::create_dir_all(path)
            .map_err(|err| format!("failed to create dir {}: {}", path.display(), err));
        record_write_metrics("ensure_dir", start, &result);
        result
    }

    fn write_equity_csv(&self, path: &Path, equity: &[f64], timestamps: &[i64]) -> Result<(), String> {
        let start = Instant::now();
        let result = write_equity(path, equity, timestamps);
        record_write_metrics("equity_csv", start, &result);
        result
    }

    fn write_steps_jsonl(&self, path: &Path, steps: &[StepInfo]) -> Result<(), String> {
        let start = Instant::now();
        let result = write_steps(path, steps);
        record_write_metrics("steps_jsonl", start, &result);
        result
    }

    fn write_summary_json(
        &self,
        path: &Path,
        metrics: &EpisodeMetrics,
        meta: Option<&serde_json::Value>,
    ) -> Result<(), String> {
        let start = Instant::now();
        let result = serde_json::to_string_pretty(&SummaryDocument { metrics, meta })
            .map_err(|err| format!("failed to serialize summary: {err}"))
            .and_then(|json| {
                fs::write(path, json)
                    .map_err(|err| format!("failed to write summary {}: {}", path.display(), err))
            });
        record_write_metrics("summary_json", start, &result);
        result
    }

    fn write_config_snapshot_toml(&self, path: &Path, contents: &str) -> Result<(), String> {
        let start = Instant::now();
        let result = fs::write(path, contents).map_err(|err| {
            format!(
                "failed to write config snapshot {}: {}",
                path.display(),
                err
            )
        });
        record_write_metrics("config_snapshot_toml", start, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::FilesystemArtifactWriter;
    use aegis_domain::entities::metrics::EpisodeMetrics;
    use aegis_domain::repositories::artifacts::ArtifactWriter;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_tmp_dir(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("aegis_{name}_{}_{}", std::process::id(), now))
    }

    #[test]
    fn writes_equity_and_summary() {
        let dir = unique_tmp_dir("artifacts");
        let writer = FilesystemArtifactWriter::new();
        writer.ensure_dir(&dir).expect("dir");

        let equity_path = dir.join("equity.csv");
        writer
            .write_equity_csv(&equity_path, &[100.0, 101.5], &[10, 20])
            .expect("equity");
        let equity = fs::read_to_string(&equity_path).expect("read equity");
        let lines: Vec<&str> = equity.lines().collect();
        assert_eq!(lines, vec!["step,timestamp,equity", "0,10,100", "1,20,101.5"]);

        let summary_path = dir.join("summary.json");
        let meta = serde_json::json!({"run_id": "t1"});
        let metrics = EpisodeMetrics {
            steps: 1,
            ..EpisodeMetrics::default()
        };
        writer
            .write_summary_json(&summary_path, &metrics, Some(&meta))
            .expect("summary");
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary_path).expect("read summary"))
                .expect("json");
        assert_eq!(parsed["meta"]["run_id"], "t1");
        assert_eq!(parsed["metrics"]["steps"], 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn mismatched_equity_lengths_are_rejected() {
        let dir = unique_tmp_dir("artifacts_mismatch");
        let writer = FilesystemArtifactWriter::new();
        writer.ensure_dir(&dir).expect("dir");
        let err = writer
            .write_equity_csv(&dir.join("equity.csv"), &[1.0, 2.0], &[1])
            .expect_err("length mismatch");
        assert!(err.contains("timestamps"));
        let _ = fs::remove_dir_all(&dir);
    }
}
