//! Bi-directional merge of the `a0` and `codex` vault documents.
//!
//! Both vaults are loose JSON objects holding `glyphs`, `rituals`, `spells`,
//! and `agents` lists. A sync backs up both files, merges each list by entity
//! key with newest-timestamp-wins, and writes the merged document to both
//! locations. Every step is appended to a plain-text sync log.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{expand_tilde, SyncPaths};
use crate::error::AlchemyResult;

/// Entity collections merged by [`VaultSync::sync_vaults`].
pub const COLLECTIONS: [&str; 4] = ["glyphs", "rituals", "spells", "agents"];
pub const SYNC_VERSION: &str = "1.0";
pub const DEFAULT_LOG_LIMIT: usize = 50;

const ENTITY_KEY: &str = "id";
const ENTITY_TIMESTAMP: &str = "updated_at";

pub type VaultDocument = Map<String, Value>;

/// A document with every collection present and empty.
pub fn empty_vault() -> VaultDocument {
    COLLECTIONS
        .iter()
        .map(|c| (c.to_string(), Value::Array(Vec::new())))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub glyphs: usize,
    pub rituals: usize,
    pub spells: usize,
    pub agents: usize,
    pub a0_saved: bool,
    pub codex_saved: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultPresence {
    pub a0: bool,
    pub codex: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub status: &'static str,
    pub vaults: VaultPresence,
    /// Last line of the sync log.
    pub last_sync: Option<String>,
    pub log_file: String,
    pub backup_dir: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncLogs {
    pub logs: Vec<String>,
    pub total_entries: usize,
    pub showing_last: usize,
}

/// Render an entity key or timestamp as the string used for comparison.
fn field_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Merge `b` into `a` by `key`, keeping the entity with the greater
/// `timestamp` string on conflict.
///
/// Entities without a key are keyed by their position (in `a`) or by the
/// merged length at the time they are seen (in `b`). The order of first
/// appearance is preserved. Returns the merged list and the keys that `b`
/// overwrote.
pub fn merge_entities(a: &[Value], b: &[Value], key: &str, timestamp: &str) -> (Vec<Value>, Vec<String>) {
    let mut merged: Vec<Value> = Vec::with_capacity(a.len() + b.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, entity) in a.iter().enumerate() {
        let k = entity.get(key).map(field_string).unwrap_or_else(|| i.to_string());
        match index.get(&k) {
            Some(&pos) => merged[pos] = entity.clone(),
            None => {
                index.insert(k, merged.len());
                merged.push(entity.clone());
            }
        }
    }

    let stamp = |v: &Value| v.get(timestamp).map(field_string).unwrap_or_default();
    let mut updated = Vec::new();
    for entity in b {
        let k = entity
            .get(key)
            .map(field_string)
            .unwrap_or_else(|| index.len().to_string());
        match index.get(&k) {
            Some(&pos) => {
                if stamp(entity) > stamp(&merged[pos]) {
                    merged[pos] = entity.clone();
                    updated.push(k);
                }
            }
            None => {
                index.insert(k, merged.len());
                merged.push(entity.clone());
            }
        }
    }

    (merged, updated)
}

fn collection<'a>(doc: &'a VaultDocument, name: &str) -> &'a [Value] {
    doc.get(name)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// File locations of one sync setup.
#[derive(Debug, Clone)]
pub struct VaultSync {
    a0_vault: PathBuf,
    codex_vault: PathBuf,
    codex_vault_alt: PathBuf,
    log_path: PathBuf,
    backup_dir: PathBuf,
}

impl VaultSync {
    pub fn new(paths: &SyncPaths) -> Self {
        Self {
            a0_vault: expand_tilde(&paths.a0_vault),
            codex_vault: expand_tilde(&paths.codex_vault),
            codex_vault_alt: expand_tilde(&paths.codex_vault_alt),
            log_path: expand_tilde(&paths.log_path),
            backup_dir: expand_tilde(&paths.backup_dir),
        }
    }

    /// Append `[timestamp] message` to the sync log. Failures to write the
    /// log are reported through tracing only.
    pub fn log(&self, message: &str) {
        tracing::info!("{message}");
        let line = format!("[{}] {message}\n", chrono::Utc::now().to_rfc3339());
        let result = self
            .log_path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| {
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.log_path)?
                    .write_all(line.as_bytes())
            });
        if let Err(e) = result {
            tracing::warn!(path = %self.log_path.display(), error = %e, "failed to write sync log");
        }
    }

    /// Load a vault document. A missing or unreadable file yields [`empty_vault`].
    pub fn load_vault(&self, path: &Path) -> VaultDocument {
        if !path.exists() {
            self.log(&format!("Vault not found: {}", path.display()));
            return empty_vault();
        }
        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<Value>(&s).map_err(|e| e.to_string()));
        match parsed {
            Ok(Value::Object(doc)) => {
                self.log(&format!(
                    "Loaded vault: {} ({} glyphs, {} rituals)",
                    path.display(),
                    collection(&doc, "glyphs").len(),
                    collection(&doc, "rituals").len()
                ));
                doc
            }
            Ok(_) => {
                self.log(&format!("Error loading vault {}: not a JSON object", path.display()));
                empty_vault()
            }
            Err(e) => {
                self.log(&format!("Error loading vault {}: {e}", path.display()));
                empty_vault()
            }
        }
    }

    /// Load the codex vault, falling back to the JSONL ritual log (one ritual
    /// per line) when the primary file is absent.
    pub fn load_codex_vault(&self) -> VaultDocument {
        if self.codex_vault.exists() {
            return self.load_vault(&self.codex_vault);
        }
        if self.codex_vault_alt.exists() {
            match read_jsonl(&self.codex_vault_alt) {
                Ok(rituals) => {
                    let mut doc = empty_vault();
                    doc.insert("rituals".into(), Value::Array(rituals));
                    return doc;
                }
                Err(e) => self.log(&format!("Error loading JSONL vault: {e}")),
            }
        }
        empty_vault()
    }

    /// Copy `vault` to `<backup_dir>/<prefix>vault_backup_<ts>.json`.
    pub fn backup_vault(&self, vault: &Path, prefix: &str) -> Option<PathBuf> {
        if !vault.exists() {
            return None;
        }
        let ts = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let dest = self.backup_dir.join(format!("{prefix}vault_backup_{ts}.json"));
        let result = fs::create_dir_all(&self.backup_dir).and_then(|_| fs::copy(vault, &dest));
        match result {
            Ok(_) => {
                self.log(&format!("Backup created: {}", dest.display()));
                Some(dest)
            }
            Err(e) => {
                self.log(&format!("Backup failed: {e}"));
                None
            }
        }
    }

    fn save_vault(&self, doc: &VaultDocument, path: &Path) -> bool {
        match write_vault(doc, path) {
            Ok(()) => {
                self.log(&format!("Saved vault: {}", path.display()));
                true
            }
            Err(e) => {
                self.log(&format!("Error saving vault {}: {e}", path.display()));
                false
            }
        }
    }

    /// Back up, merge, and write both vaults.
    pub fn sync_vaults(&self) -> SyncReport {
        self.log("Starting vault synchronization...");

        let a0 = self.load_vault(&self.a0_vault);
        let codex = self.load_codex_vault();

        self.backup_vault(&self.a0_vault, "a0_");
        self.backup_vault(&self.codex_vault, "codex_");

        let mut merged = Map::new();
        let mut counts = [0usize; 4];
        for (i, name) in COLLECTIONS.iter().enumerate() {
            let (entities, updated) = merge_entities(
                collection(&a0, name),
                collection(&codex, name),
                ENTITY_KEY,
                ENTITY_TIMESTAMP,
            );
            for key in updated {
                self.log(&format!("Updated {name} entity {key} (newer timestamp)"));
            }
            counts[i] = entities.len();
            merged.insert(name.to_string(), Value::Array(entities));
        }
        let now = chrono::Utc::now().to_rfc3339();
        merged.insert("last_sync".into(), Value::String(now.clone()));
        merged.insert("sync_version".into(), Value::String(SYNC_VERSION.into()));

        let a0_saved = self.save_vault(&merged, &self.a0_vault);
        let codex_saved = self.save_vault(&merged, &self.codex_vault);

        let [glyphs, rituals, spells, agents] = counts;
        self.log(&format!(
            "Sync completed: {glyphs} glyphs, {rituals} rituals, {spells} spells, {agents} agents"
        ));
        SyncReport {
            glyphs,
            rituals,
            spells,
            agents,
            a0_saved,
            codex_saved,
            timestamp: now,
        }
    }

    pub fn status(&self) -> AlchemyResult<SyncStatus> {
        let last_sync = if self.log_path.exists() {
            fs::read_to_string(&self.log_path)?
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(|l| l.trim().to_string())
        } else {
            None
        };
        Ok(SyncStatus {
            status: "ready",
            vaults: VaultPresence {
                a0: self.a0_vault.exists(),
                codex: self.codex_vault.exists() || self.codex_vault_alt.exists(),
            },
            last_sync,
            log_file: self.log_path.display().to_string(),
            backup_dir: self.backup_dir.display().to_string(),
        })
    }

    /// The last `limit` log lines.
    pub fn logs(&self, limit: usize) -> AlchemyResult<SyncLogs> {
        if !self.log_path.exists() {
            return Ok(SyncLogs {
                logs: Vec::new(),
                total_entries: 0,
                showing_last: 0,
            });
        }
        let content = fs::read_to_string(&self.log_path)?;
        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(limit);
        let logs: Vec<String> = lines[start..].iter().map(|l| l.trim().to_string()).collect();
        Ok(SyncLogs {
            total_entries: lines.len(),
            showing_last: logs.len(),
            logs,
        })
    }
}

fn write_vault(doc: &VaultDocument, path: &Path) -> AlchemyResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(doc)?)?;
    Ok(())
}

fn read_jsonl(path: &Path) -> AlchemyResult<Vec<Value>> {
    fs::read_to_string(path)?
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| Ok(serde_json::from_str(l)?))
        .collect()
}
