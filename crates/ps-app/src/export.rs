//! Run export: `manifest.json` plus one JSON line per tick in `history.jsonl`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ps_runtime::OutputHistory;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const HISTORY_FILE: &str = "history.jsonl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub run_name: String,
    /// RFC 3339 export time.
    pub timestamp: String,
    /// Ticks executed by the run (the history may retain fewer).
    pub ticks: u64,
    pub control_period_s: f64,
    #[serde(default)]
    pub modules: Vec<String>,
}

/// Every sample published at one tick, keyed by sample key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: u64,
    pub time_s: f64,
    pub samples: BTreeMap<String, f64>,
}

/// Merge the retained batches of all modules into per-tick records, oldest
/// first.
pub fn history_records(history: &OutputHistory, control_period_s: f64) -> Vec<TickRecord> {
    let mut by_tick: BTreeMap<u64, TickRecord> = BTreeMap::new();
    for module in history.modules() {
        for entry in history.batches(module) {
            let record = by_tick.entry(entry.tick).or_insert_with(|| TickRecord {
                tick: entry.tick,
                time_s: entry.tick as f64 * control_period_s,
                samples: BTreeMap::new(),
            });
            for sample in entry.samples.iter() {
                record.samples.insert(sample.key.clone(), sample.value);
            }
        }
    }
    by_tick.into_values().collect()
}

/// Write `history` into `dir` (created if missing).
pub fn export_history(
    dir: &Path,
    run_name: &str,
    ticks: u64,
    control_period_s: f64,
    history: &OutputHistory,
) -> AppResult<ExportManifest> {
    fs::create_dir_all(dir)?;

    let manifest = ExportManifest {
        run_name: run_name.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        ticks,
        control_period_s,
        modules: history.modules().to_vec(),
    };
    let manifest_json =
        serde_json::to_string_pretty(&manifest).map_err(|e| export_error(dir, e))?;
    fs::write(dir.join(MANIFEST_FILE), manifest_json)?;

    let mut content = String::new();
    for record in history_records(history, control_period_s) {
        let line = serde_json::to_string(&record).map_err(|e| export_error(dir, e))?;
        content.push_str(&line);
        content.push('\n');
    }
    fs::write(dir.join(HISTORY_FILE), content)?;

    tracing::info!(dir = %dir.display(), run = run_name, "exported run history");
    Ok(manifest)
}

pub fn load_export_manifest(dir: &Path) -> AppResult<ExportManifest> {
    let content = fs::read_to_string(dir.join(MANIFEST_FILE))?;
    serde_json::from_str(&content).map_err(|e| export_error(dir, e))
}

pub fn load_history(dir: &Path) -> AppResult<Vec<TickRecord>> {
    let content = fs::read_to_string(dir.join(HISTORY_FILE))?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(|e| export_error(dir, e)))
        .collect()
}

fn export_error(dir: &Path, err: serde_json::Error) -> AppError {
    AppError::Export {
        path: dir.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_controls::NamedSample;

    fn history() -> OutputHistory {
        let mut history = OutputHistory::new(10);
        history.record("cmd", 0, &[NamedSample::new("command", 0.0, 0.0)]);
        history.record("cmd", 1, &[NamedSample::new("command", 0.01, 1.0)]);
        history.record("pid", 1, &[NamedSample::new("u", 0.01, -2.0)]);
        history
    }

    #[test]
    fn records_merge_modules_per_tick() {
        let records = history_records(&history(), 0.01);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tick, 0);
        assert_eq!(records[0].samples.len(), 1);
        assert_eq!(records[1].samples["command"], 1.0);
        assert_eq!(records[1].samples["u"], -2.0);
        assert_eq!(records[1].time_s, 0.01);
    }

    #[test]
    fn export_then_load() {
        let dir = std::env::temp_dir().join(format!("ps_app_export_{}", std::process::id()));
        let manifest = export_history(&dir, "unit", 2, 0.01, &history()).unwrap();
        assert_eq!(manifest.modules, vec!["cmd".to_string(), "pid".to_string()]);
        assert!(chrono::DateTime::parse_from_rfc3339(&manifest.timestamp).is_ok());

        assert_eq!(load_export_manifest(&dir).unwrap(), manifest);
        let records = load_history(&dir).unwrap();
        assert_eq!(records, history_records(&history(), 0.01));
    }

    #[test]
    fn missing_export_is_io_error() {
        let dir = std::env::temp_dir().join("ps_app_export_missing_dir_for_test");
        assert!(matches!(load_history(&dir), Err(AppError::Io(_))));
    }
}
