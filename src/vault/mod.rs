//! Flat-file sigil store.
//!
//! Each sigil is one pretty-printed JSON array at `<root>/<sigil>.json`.
//! [`VaultStore`] provides the whole read/write surface: restore, preserve,
//! list, ingest, bundle, reflect, and [`diff`](VaultStore::diff).

pub mod diff;

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{AlchemyError, AlchemyResult};
use crate::glyph::Glyph;

pub use diff::SigilDiff;

/// How many glyph names `restore` logs at debug level.
const RESTORE_LOG_LIMIT: usize = 20;

/// Maximum characters of a malformed entry echoed back in errors.
const ENTRY_PREVIEW_CHARS: usize = 120;

/// A directory of sigil files.
#[derive(Debug, Clone)]
pub struct VaultStore {
    root: PathBuf,
}

impl VaultStore {
    /// Open (and create if missing) a vault rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> AlchemyResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `sigil`. Validates the name.
    pub fn sigil_path(&self, sigil: &str) -> AlchemyResult<PathBuf> {
        validate_sigil_name(sigil)?;
        Ok(self.root.join(format!("{sigil}.json")))
    }

    pub fn exists(&self, sigil: &str) -> bool {
        self.sigil_path(sigil).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Load every glyph stored under `sigil`.
    pub fn restore(&self, sigil: &str) -> AlchemyResult<Vec<Glyph>> {
        let path = self.sigil_path(sigil)?;
        if !path.is_file() {
            return Err(AlchemyError::SigilNotFound {
                sigil: sigil.to_string(),
                path,
            });
        }

        let contents = std::fs::read_to_string(&path)?;
        let data: Value =
            serde_json::from_str(&contents).map_err(|source| AlchemyError::InvalidJson {
                sigil: sigil.to_string(),
                source,
            })?;

        let Value::Array(entries) = data else {
            return Err(AlchemyError::NotAList {
                sigil: sigil.to_string(),
            });
        };

        let glyphs = entries
            .into_iter()
            .map(|entry| parse_entry(sigil, entry))
            .collect::<AlchemyResult<Vec<_>>>()?;

        if glyphs.is_empty() {
            return Err(AlchemyError::EmptySigil {
                sigil: sigil.to_string(),
            });
        }

        tracing::info!(sigil, count = glyphs.len(), "restored glyphs");
        for g in glyphs.iter().take(RESTORE_LOG_LIMIT) {
            tracing::debug!(sigil, name = %g.name, dims = g.dims(), "glyph");
        }
        Ok(glyphs)
    }

    /// Restore, treating a missing or empty sigil as an empty list.
    pub fn restore_or_empty(&self, sigil: &str) -> AlchemyResult<Vec<Glyph>> {
        match self.restore(sigil) {
            Ok(glyphs) => Ok(glyphs),
            Err(e) if e.is_missing_sigil() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Write `glyphs` under `sigil`, replacing any previous contents.
    ///
    /// Uses an atomic write (tmp + rename) so readers never see a partial file.
    pub fn preserve(&self, sigil: &str, glyphs: &[Glyph]) -> AlchemyResult<PathBuf> {
        let path = self.sigil_path(sigil)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(glyphs)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &path)?;

        tracing::info!(sigil, count = glyphs.len(), path = %path.display(), "preserved glyphs");
        Ok(path)
    }

    /// Names of all sigils in the vault, sorted.
    pub fn list_sigils(&self) -> AlchemyResult<Vec<String>> {
        let mut sigils = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_sigil_name(stem).is_ok() {
                    sigils.push(stem.to_string());
                }
            }
        }
        sigils.sort();
        Ok(sigils)
    }

    /// Append `glyphs` to `sigil`. A missing sigil starts empty.
    /// Returns the new total.
    pub fn ingest(&self, sigil: &str, glyphs: &[Glyph]) -> AlchemyResult<usize> {
        let mut existing = self.restore_or_empty(sigil)?;
        existing.extend_from_slice(glyphs);
        self.preserve(sigil, &existing)?;
        tracing::info!(sigil, added = glyphs.len(), total = existing.len(), "ingested glyphs");
        Ok(existing.len())
    }

    /// Concatenate several sigils into `bundle_name`. Missing sigils are skipped.
    /// Returns the number of glyphs bundled.
    pub fn bundle(&self, sigils: &[String], bundle_name: &str) -> AlchemyResult<usize> {
        let mut bundled = Vec::new();
        for sigil in sigils {
            match self.restore(sigil) {
                Ok(glyphs) => bundled.extend(glyphs),
                Err(e) if e.is_missing_sigil() => {
                    tracing::warn!(sigil = %sigil, error = %e, "skipping sigil in bundle");
                }
                Err(e) => return Err(e),
            }
        }
        self.preserve(bundle_name, &bundled)?;
        tracing::info!(sigils = sigils.len(), bundle = bundle_name, "bundled sigils");
        Ok(bundled.len())
    }

    /// Gather every other sigil into `reflection_sigil`.
    /// Unreadable sigils are skipped. Returns the number of glyphs reflected.
    pub fn reflect_all(&self, reflection_sigil: &str) -> AlchemyResult<usize> {
        validate_sigil_name(reflection_sigil)?;
        let mut all = Vec::new();
        for sigil in self.list_sigils()? {
            if sigil == reflection_sigil {
                continue;
            }
            match self.restore(&sigil) {
                Ok(glyphs) => all.extend(glyphs),
                Err(e) => tracing::warn!(sigil = %sigil, error = %e, "skipping sigil in reflection"),
            }
        }
        self.preserve(reflection_sigil, &all)?;
        tracing::info!(reflection = reflection_sigil, count = all.len(), "reflected all glyphs");
        Ok(all.len())
    }

    /// Compare two sigils by glyph name.
    pub fn diff(&self, sigil_a: &str, sigil_b: &str) -> AlchemyResult<SigilDiff> {
        let a = self.restore(sigil_a)?;
        let b = self.restore(sigil_b)?;
        Ok(SigilDiff::compute(sigil_a, &a, sigil_b, &b))
    }
}

/// Reject names that are empty, hidden, or could escape the vault directory.
pub fn validate_sigil_name(sigil: &str) -> AlchemyResult<()> {
    let bad = sigil.is_empty()
        || sigil.starts_with('.')
        || sigil.contains(['/', '\\', '\0']);
    if bad {
        return Err(AlchemyError::InvalidSigilName(sigil.to_string()));
    }
    Ok(())
}

fn parse_entry(sigil: &str, entry: Value) -> AlchemyResult<Glyph> {
    let preview = || {
        let text = entry.to_string();
        match text.char_indices().nth(ENTRY_PREVIEW_CHARS) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text,
        }
    };
    let well_formed = entry.get("name").is_some_and(Value::is_string)
        && entry.get("vector").is_some_and(Value::is_array);
    if !well_formed {
        return Err(AlchemyError::MalformedGlyph {
            sigil: sigil.to_string(),
            entry: preview(),
        });
    }
    let entry_text = preview();
    serde_json::from_value(entry).map_err(|_| AlchemyError::MalformedGlyph {
        sigil: sigil.to_string(),
        entry: entry_text,
    })
}
