use crate::entities::metrics::EpisodeMetrics;
use crate::value_objects::step_info::StepInfo;
use std::path::Path;

pub trait ArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String>;
    fn write_equity_csv(&self, path: &Path, equity: &[f64], timestamps: &[i64]) -> Result<(), String>;
    fn write_steps_jsonl(&self, path: &Path, steps: &[StepInfo]) -> Result<(), String>;
    fn write_summary_json(
        &self,
        path: &Path,
        metrics: &EpisodeMetrics,
        meta: Option<&serde_json::Value>,
    ) -> Result<(), String>;
    fn write_config_snapshot_toml(&self, path: &Path, contents: &str) -> Result<(), String>;
}
