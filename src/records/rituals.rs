//! CRUD for the `rituals` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{GlyphRecord, NewRitual, Ritual, RitualUpdate, RitualWithGlyphs};
use crate::error::{AlchemyError, AlchemyResult};

/// Rituals inserted by [`seed_rituals`].
pub const DEFAULT_RITUALS: [(&str, &str); 4] = [
    ("Script Synthesizer", "Synthesizes code from text patterns"),
    ("Deep Research", "Launches AI-based research on specified themes"),
    ("Agent Builder", "Constructs task-specific AI agents"),
    ("REPL Loop", "Interactive correction loop with LLM"),
];

const RITUAL_COLUMNS: &str = "id, name, description, ritual_type, created_at";

pub(crate) fn ritual_from_row(row: &Row<'_>) -> rusqlite::Result<Ritual> {
    Ok(Ritual {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        ritual_type: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn validate_name(name: &str) -> AlchemyResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AlchemyError::Validation("ritual name must not be empty".into()));
    }
    Ok(name)
}

fn name_taken(conn: &Connection, name: &str, except: Option<i64>) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM rituals WHERE name = ?1 AND id != ?2",
        params![name, except.unwrap_or(-1)],
        |row| row.get(0),
    )
}

/// Insert a ritual. Names are trimmed and must be non-empty and unique.
pub fn create_ritual(conn: &Connection, new: &NewRitual) -> AlchemyResult<Ritual> {
    let name = validate_name(&new.name)?;
    if name_taken(conn, name, None)? {
        return Err(AlchemyError::DuplicateRitual(name.to_string()));
    }

    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO rituals (name, description, ritual_type, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![name, new.description, new.ritual_type, now],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, name, "ritual created");

    get_ritual(conn, id)
}

/// All rituals, oldest first.
pub fn list_rituals(conn: &Connection) -> AlchemyResult<Vec<Ritual>> {
    let mut stmt = conn.prepare(&format!("SELECT {RITUAL_COLUMNS} FROM rituals ORDER BY id"))?;
    let rituals = stmt
        .query_map([], ritual_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rituals)
}

pub fn get_ritual(conn: &Connection, id: i64) -> AlchemyResult<Ritual> {
    conn.query_row(
        &format!("SELECT {RITUAL_COLUMNS} FROM rituals WHERE id = ?1"),
        params![id],
        ritual_from_row,
    )
    .optional()?
    .ok_or(AlchemyError::RitualNotFound(id))
}

/// Apply the `Some` fields of `update` to ritual `id`.
pub fn update_ritual(conn: &Connection, id: i64, update: &RitualUpdate) -> AlchemyResult<Ritual> {
    let mut ritual = get_ritual(conn, id)?;

    if let Some(ref name) = update.name {
        let name = validate_name(name)?;
        if name_taken(conn, name, Some(id))? {
            return Err(AlchemyError::DuplicateRitual(name.to_string()));
        }
        ritual.name = name.to_string();
    }
    if update.description.is_some() {
        ritual.description = update.description.clone();
    }
    if update.ritual_type.is_some() {
        ritual.ritual_type = update.ritual_type.clone();
    }

    conn.execute(
        "UPDATE rituals SET name = ?1, description = ?2, ritual_type = ?3 WHERE id = ?4",
        params![ritual.name, ritual.description, ritual.ritual_type, id],
    )?;
    tracing::info!(id, "ritual updated");
    Ok(ritual)
}

/// Delete ritual `id`. Linked glyphs are kept with `ritual_id` cleared.
pub fn delete_ritual(conn: &Connection, id: i64) -> AlchemyResult<()> {
    let deleted = conn.execute("DELETE FROM rituals WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(AlchemyError::RitualNotFound(id));
    }
    tracing::info!(id, "ritual deleted");
    Ok(())
}

/// Insert the [`DEFAULT_RITUALS`] that do not exist yet. Returns how many were added.
pub fn seed_rituals(conn: &mut Connection) -> AlchemyResult<usize> {
    let tx = conn.transaction()?;
    let now = chrono::Utc::now().to_rfc3339();
    let mut added = 0;
    for (name, description) in DEFAULT_RITUALS {
        added += tx.execute(
            "INSERT OR IGNORE INTO rituals (name, description, created_at) VALUES (?1, ?2, ?3)",
            params![name, description, now],
        )?;
    }
    tx.commit()?;
    tracing::info!(added, "rituals seeded");
    Ok(added)
}

/// Every ritual with the glyphs whose `ritual_id` points at it.
pub fn list_rituals_with_glyphs(conn: &Connection) -> AlchemyResult<Vec<RitualWithGlyphs>> {
    let rituals = list_rituals(conn)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM glyphs WHERE ritual_id = ?1 ORDER BY rowid",
        super::glyphs::GLYPH_COLUMNS
    ))?;

    let mut out = Vec::with_capacity(rituals.len());
    for ritual in rituals {
        let glyphs: Vec<GlyphRecord> = stmt
            .query_map(params![ritual.id], super::glyphs::glyph_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        out.push(RitualWithGlyphs { ritual, glyphs });
    }
    Ok(out)
}
