//! Append-only JSONL ledgers and prompt snapshots.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::error::AlchemyResult;

pub const LEDGER_FILE: &str = "ledger.jsonl";
pub const RITUAL_LOG_FILE: &str = "ritual_log.jsonl";
const SNAPSHOT_DIR: &str = "snapshots";

/// Directory of JSONL ledgers. Files and the directory itself are created on
/// first write.
#[derive(Debug, Clone)]
pub struct Ledger {
    dir: PathBuf,
}

impl Ledger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append `{timestamp, mode, result}` to `ledger.jsonl`.
    pub fn append(&self, mode: &str, result: Value) -> AlchemyResult<()> {
        self.append_record(
            LEDGER_FILE,
            &json!({
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "mode": mode,
                "result": result,
            }),
        )
    }

    /// Append `{timestamp, mode, prompt, output}` to `ritual_log.jsonl`.
    pub fn log_ritual_event(&self, mode: &str, prompt: &str, output: &str) -> AlchemyResult<()> {
        self.append_record(
            RITUAL_LOG_FILE,
            &json!({
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "mode": mode,
                "prompt": prompt,
                "output": output,
            }),
        )
    }

    /// Write a before/after pair to `snapshots/<mode>_snapshot_<ts>.json`.
    pub fn save_snapshot(&self, original: &str, compressed: &str, mode: &str) -> AlchemyResult<PathBuf> {
        let dir = self.dir.join(SNAPSHOT_DIR);
        fs::create_dir_all(&dir)?;
        let ts = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{mode}_snapshot_{ts}.json"));
        let body = json!({ "original": original, "compressed": compressed });
        fs::write(&path, serde_json::to_string_pretty(&body)?)?;
        tracing::debug!(path = %path.display(), "snapshot saved");
        Ok(path)
    }

    /// Parse every line of `file`. A missing file is empty; lines that are
    /// not JSON are skipped.
    pub fn read_entries(&self, file: &str) -> AlchemyResult<Vec<Value>> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        let mut entries = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(value) => entries.push(value),
                Err(e) => {
                    tracing::warn!(file, line = lineno + 1, error = %e, "skipping malformed ledger line")
                }
            }
        }
        Ok(entries)
    }

    /// Append one JSON line to `file` under the ledger directory.
    pub fn append_record(&self, file: &str, entry: &Value) -> AlchemyResult<()> {
        fs::create_dir_all(&self.dir)?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file))?;
        writeln!(f, "{}", serde_json::to_string(entry)?)?;
        Ok(())
    }
}
