//! Glyph rows, sigil partitions, and sigil metadata.

use std::collections::BTreeMap;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{GlyphRecord, GlyphType, SigilMetadata, VaultStats};
use crate::error::{AlchemyError, AlchemyResult};
use crate::glyph::{hash_glyph, Glyph};

pub(crate) const GLYPH_COLUMNS: &str =
    "id, name, vector, hash, glyph_type, ritual_id, sigil, lineage_depth, produced_at, created_at";

const METADATA_COLUMNS: &str =
    "sigil_name, description, glyph_count, ritual_count, last_updated, meta_data";

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(crate) fn glyph_from_row(row: &Row<'_>) -> rusqlite::Result<GlyphRecord> {
    let vector_json: String = row.get(2)?;
    let glyph_type: String = row.get(4)?;
    Ok(GlyphRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        vector: serde_json::from_str(&vector_json).map_err(|e| conversion_error(2, e))?,
        hash: row.get(3)?,
        glyph_type: glyph_type
            .parse()
            .map_err(|_| rusqlite::Error::InvalidColumnType(4, "glyph_type".into(), Type::Text))?,
        ritual_id: row.get(5)?,
        sigil: row.get(6)?,
        lineage_depth: row.get(7)?,
        timestamp: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn metadata_from_row(row: &Row<'_>) -> rusqlite::Result<SigilMetadata> {
    let meta: Option<String> = row.get(5)?;
    Ok(SigilMetadata {
        sigil_name: row.get(0)?,
        description: row.get(1)?,
        glyph_count: row.get(2)?,
        ritual_count: row.get(3)?,
        last_updated: row.get(4)?,
        meta_data: meta.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

/// Insert one glyph row and return its generated id. The hash is computed
/// when the glyph does not carry one.
pub(crate) fn insert_glyph(
    conn: &Connection,
    glyph: &Glyph,
    glyph_type: GlyphType,
    ritual_id: Option<i64>,
    sigil: Option<&str>,
) -> AlchemyResult<String> {
    let id = uuid::Uuid::now_v7().to_string();
    let hash = match glyph.hash.as_deref() {
        Some(h) if !h.is_empty() => h.to_string(),
        _ => hash_glyph(glyph),
    };
    conn.execute(
        "INSERT INTO glyphs (id, name, hash, vector, glyph_type, ritual_id, sigil, lineage_depth, produced_at, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            glyph.name,
            hash,
            serde_json::to_string(&glyph.vector)?,
            glyph_type.as_str(),
            ritual_id,
            sigil,
            glyph.lineage_depth,
            glyph.timestamp,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(id)
}

/// Insert or replace the metadata row for `meta.sigil_name`.
pub(crate) fn write_metadata(conn: &Connection, meta: &SigilMetadata) -> AlchemyResult<()> {
    let meta_json = meta.meta_data.as_ref().map(serde_json::to_string).transpose()?;
    conn.execute(
        "INSERT INTO sigil_metadata (sigil_name, description, glyph_count, ritual_count, last_updated, meta_data) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         ON CONFLICT(sigil_name) DO UPDATE SET \
           description = COALESCE(excluded.description, sigil_metadata.description), \
           glyph_count = excluded.glyph_count, \
           ritual_count = excluded.ritual_count, \
           last_updated = excluded.last_updated, \
           meta_data = COALESCE(excluded.meta_data, sigil_metadata.meta_data)",
        params![
            meta.sigil_name,
            meta.description,
            meta.glyph_count,
            meta.ritual_count,
            meta.last_updated,
            meta_json,
        ],
    )?;
    Ok(())
}

/// All glyph rows, optionally restricted to one type, in insertion order.
pub fn list_glyphs(conn: &Connection, glyph_type: Option<GlyphType>) -> AlchemyResult<Vec<GlyphRecord>> {
    let glyphs = match glyph_type {
        Some(t) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {GLYPH_COLUMNS} FROM glyphs WHERE glyph_type = ?1 ORDER BY rowid"
            ))?;
            let rows = stmt.query_map(params![t.as_str()], glyph_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!("SELECT {GLYPH_COLUMNS} FROM glyphs ORDER BY rowid"))?;
            let rows = stmt.query_map([], glyph_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(glyphs)
}

/// Replace the `sigil` partition with `glyphs` and refresh its metadata.
/// Returns the number of rows written.
pub fn store_sigil(
    conn: &mut Connection,
    sigil: &str,
    glyphs: &[Glyph],
    glyph_type: GlyphType,
) -> AlchemyResult<usize> {
    let tx = conn.transaction()?;
    let removed = tx.execute("DELETE FROM glyphs WHERE sigil = ?1", params![sigil])?;
    for glyph in glyphs {
        insert_glyph(&tx, glyph, glyph_type, None, Some(sigil))?;
    }
    write_metadata(
        &tx,
        &SigilMetadata {
            sigil_name: sigil.to_string(),
            description: None,
            glyph_count: glyphs.len() as i64,
            ritual_count: 0,
            last_updated: chrono::Utc::now().to_rfc3339(),
            meta_data: None,
        },
    )?;
    tx.commit()?;

    tracing::info!(sigil, removed, stored = glyphs.len(), "sigil stored in database");
    Ok(glyphs.len())
}

/// Glyphs of the `sigil` partition in insertion order.
///
/// An empty partition is reported as [`AlchemyError::EmptySigil`].
pub fn load_sigil(conn: &Connection, sigil: &str) -> AlchemyResult<Vec<Glyph>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {GLYPH_COLUMNS} FROM glyphs WHERE sigil = ?1 ORDER BY rowid"
    ))?;
    let glyphs: Vec<Glyph> = stmt
        .query_map(params![sigil], glyph_from_row)?
        .map(|r| r.map(|record| record.to_glyph()))
        .collect::<Result<Vec<_>, _>>()?;
    if glyphs.is_empty() {
        return Err(AlchemyError::EmptySigil {
            sigil: sigil.to_string(),
        });
    }
    Ok(glyphs)
}

fn latest_metadata(conn: &Connection) -> AlchemyResult<Option<SigilMetadata>> {
    Ok(conn
        .query_row(
            &format!("SELECT {METADATA_COLUMNS} FROM sigil_metadata ORDER BY last_updated DESC LIMIT 1"),
            [],
            metadata_from_row,
        )
        .optional()?)
}

/// Metadata for `sigil`, or for the most recently updated sigil when `None`.
pub fn get_metadata(conn: &Connection, sigil: Option<&str>) -> AlchemyResult<SigilMetadata> {
    match sigil {
        Some(name) => conn
            .query_row(
                &format!("SELECT {METADATA_COLUMNS} FROM sigil_metadata WHERE sigil_name = ?1"),
                params![name],
                metadata_from_row,
            )
            .optional()?
            .ok_or_else(|| AlchemyError::MetadataNotFound(format!("sigil '{name}'"))),
        None => latest_metadata(conn)?
            .ok_or_else(|| AlchemyError::MetadataNotFound("the vault".to_string())),
    }
}

/// Glyph totals by type plus the most recent sigil metadata.
pub fn vault_stats(conn: &Connection) -> AlchemyResult<VaultStats> {
    let total_glyphs: i64 = conn.query_row("SELECT COUNT(*) FROM glyphs", [], |row| row.get(0))?;

    let mut stmt = conn.prepare("SELECT glyph_type, COUNT(*) FROM glyphs GROUP BY glyph_type")?;
    let glyph_type_counts: BTreeMap<String, i64> = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<_, _>>()?;

    Ok(VaultStats {
        total_glyphs,
        glyph_type_counts,
        sigil_metadata: latest_metadata(conn)?,
    })
}
