//! Flat-file backup → SQLite migration.
//!
//! Reads a `{"RecoveredSigil": [...]}` backup (a bare list is accepted and
//! treated as the `RecoveredSigil` contents), wipes the glyph, ritual, and
//! metadata tables, and reloads them in one transaction.

use std::path::Path;

use indicatif::ProgressBar;
use rusqlite::{params, Connection};
use serde::Serialize;
use serde_json::{json, Value};

use super::glyphs::{insert_glyph, write_metadata};
use super::{GlyphType, SigilMetadata};
use crate::error::{AlchemyError, AlchemyResult};
use crate::glyph::Glyph;

pub const RECOVERED_SIGIL: &str = "RecoveredSigil";
const DEDUCTION_PREFIX: &str = "deduction_ritual_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    /// Standalone `evolved` glyphs.
    pub glyphs: usize,
    /// Rituals created, each with one `ritual_generated` glyph.
    pub rituals: usize,
    /// Entries found under `RecoveredSigil`, skipped ones included.
    pub total_items: usize,
    /// True when the backup was a bare list.
    pub repaired: bool,
}

/// Wrap a bare list into `{"RecoveredSigil": list}`. Returns whether a
/// repair was needed.
pub fn repair_backup(data: Value) -> AlchemyResult<(Value, bool)> {
    match data {
        Value::Array(items) => Ok((json!({ RECOVERED_SIGIL: items }), true)),
        Value::Object(_) => Ok((data, false)),
        other => Err(AlchemyError::Validation(format!(
            "unknown vault backup format (top level is {})",
            json_kind(&other)
        ))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Pull a usable glyph out of a backup entry; `None` when the name or the
/// vector is missing or empty.
fn entry_glyph(item: &Value) -> Option<Glyph> {
    let name = item.get("name")?.as_str()?;
    let vector: Vec<f64> = item
        .get("vector")?
        .as_array()?
        .iter()
        .map(Value::as_f64)
        .collect::<Option<_>>()?;
    if name.is_empty() || vector.is_empty() {
        return None;
    }
    let mut glyph = Glyph::new(name, vector);
    glyph.hash = item.get("hash").and_then(Value::as_str).map(str::to_string);
    Some(glyph)
}

/// Replace the database contents with the glyphs of the backup at `path`.
pub fn migrate_backup(
    conn: &mut Connection,
    path: &Path,
    progress: Option<&ProgressBar>,
) -> AlchemyResult<MigrationSummary> {
    let raw = std::fs::read_to_string(path)?;
    let (data, repaired) = repair_backup(serde_json::from_str(&raw)?)?;
    if repaired {
        tracing::warn!(path = %path.display(), "backup is a bare list, treating it as {RECOVERED_SIGIL}");
    }

    let items = data
        .get(RECOVERED_SIGIL)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    tracing::info!(count = items.len(), "found glyphs in {RECOVERED_SIGIL}");
    if let Some(pb) = progress {
        pb.set_length(items.len() as u64);
    }

    let tx = conn.transaction()?;
    tx.execute_batch("DELETE FROM glyphs; DELETE FROM rituals; DELETE FROM sigil_metadata;")?;

    let now = chrono::Utc::now().to_rfc3339();
    let mut summary = MigrationSummary {
        total_items: items.len(),
        repaired,
        ..Default::default()
    };

    for item in &items {
        if let Some(pb) = progress {
            pb.inc(1);
        }
        let Some(glyph) = entry_glyph(item) else {
            tracing::debug!("skipping backup entry without name or vector");
            continue;
        };

        if glyph.name.starts_with(DEDUCTION_PREFIX) {
            // a repeated ritual name links its glyph to the first ritual row
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO rituals (name, description, ritual_type, created_at) VALUES (?1, ?2, 'deduction', ?3)",
                params![glyph.name, format!("Evolved deduction ritual {}", glyph.name), now],
            )?;
            let ritual_id: i64 = tx.query_row(
                "SELECT id FROM rituals WHERE name = ?1",
                params![glyph.name],
                |row| row.get(0),
            )?;
            insert_glyph(&tx, &glyph, GlyphType::RitualGenerated, Some(ritual_id), Some(RECOVERED_SIGIL))?;
            summary.rituals += inserted;
        } else {
            insert_glyph(&tx, &glyph, GlyphType::Evolved, None, Some(RECOVERED_SIGIL))?;
            summary.glyphs += 1;
        }
    }

    let source = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    write_metadata(
        &tx,
        &SigilMetadata {
            sigil_name: RECOVERED_SIGIL.to_string(),
            description: Some("Evolved glyphs recovered from ritual evolution process".to_string()),
            glyph_count: summary.glyphs as i64,
            ritual_count: summary.rituals as i64,
            last_updated: now.clone(),
            meta_data: Some(json!({
                "source": source,
                "migration_date": now,
                "total_items": summary.total_items,
            })),
        },
    )?;
    tx.commit()?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    tracing::info!(
        glyphs = summary.glyphs,
        rituals = summary.rituals,
        total = summary.total_items,
        "vault migration complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::records::{get_metadata, list_glyphs, list_rituals};

    #[test]
    fn repair_wraps_bare_lists() {
        let (fixed, repaired) = repair_backup(json!([{"name": "a"}])).unwrap();
        assert!(repaired);
        assert_eq!(fixed[RECOVERED_SIGIL][0]["name"], "a");

        let (same, repaired) = repair_backup(json!({"other": []})).unwrap();
        assert!(!repaired);
        assert!(same.get("other").is_some());

        assert!(repair_backup(json!(3)).is_err());
    }

    #[test]
    fn entries_without_name_or_vector_are_skipped() {
        assert!(entry_glyph(&json!({"name": "", "vector": [1.0]})).is_none());
        assert!(entry_glyph(&json!({"name": "a", "vector": []})).is_none());
        assert!(entry_glyph(&json!({"name": "a", "vector": ["x"]})).is_none());
        assert!(entry_glyph(&json!({"vector": [1.0]})).is_none());
        let g = entry_glyph(&json!({"name": "a", "vector": [1, 2.5], "hash": "h"})).unwrap();
        assert_eq!(g.vector, vec![1.0, 2.5]);
        assert_eq!(g.hash.as_deref(), Some("h"));
    }

    #[test]
    fn migrates_rituals_and_glyphs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codex_vault_backup.json");
        std::fs::write(
            &path,
            json!([
                {"name": "deduction_ritual_1", "vector": [0.1, 0.2], "hash": "abc"},
                {"name": "spark", "vector": [1.0, 2.0]},
                {"name": "broken", "vector": []},
            ])
            .to_string(),
        )
        .unwrap();

        let mut conn = open_memory_database().unwrap();
        let summary = migrate_backup(&mut conn, &path, None).unwrap();
        assert_eq!(
            summary,
            MigrationSummary {
                glyphs: 1,
                rituals: 1,
                total_items: 3,
                repaired: true
            }
        );

        let rituals = list_rituals(&conn).unwrap();
        assert_eq!(rituals[0].ritual_type.as_deref(), Some("deduction"));
        let ritual_glyphs = list_glyphs(&conn, Some(GlyphType::RitualGenerated)).unwrap();
        assert_eq!(ritual_glyphs[0].ritual_id, Some(rituals[0].id));
        assert_eq!(ritual_glyphs[0].hash.as_deref(), Some("abc"));

        let meta = get_metadata(&conn, Some(RECOVERED_SIGIL)).unwrap();
        assert_eq!(meta.glyph_count, 1);
        assert_eq!(meta.ritual_count, 1);
        assert_eq!(meta.meta_data.unwrap()["source"], "codex_vault_backup.json");

        // a second run replaces rather than appends
        migrate_backup(&mut conn, &path, None).unwrap();
        assert_eq!(list_glyphs(&conn, None).unwrap().len(), 2);
    }
}
