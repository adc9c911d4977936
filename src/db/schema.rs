//! SQL DDL for the document-sink tables.
//!
//! Defines `rituals`, `glyphs`, `sigil_metadata`, and `schema_meta`. All DDL
//! uses `IF NOT EXISTS` so initialization is idempotent. Columns added after
//! v1 (such as `glyphs.sigil`) live in [`super::migrations`].

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS rituals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    ritual_type TEXT,
    created_at TEXT NOT NULL
);

-- Vectors are stored as JSON text
CREATE TABLE IF NOT EXISTS glyphs (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    hash TEXT,
    vector TEXT NOT NULL,
    glyph_type TEXT NOT NULL DEFAULT 'evolved' CHECK(glyph_type IN ('evolved','ritual_generated')),
    ritual_id INTEGER REFERENCES rituals(id) ON DELETE SET NULL,
    lineage_depth INTEGER,
    produced_at REAL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_glyphs_name ON glyphs(name);
CREATE INDEX IF NOT EXISTS idx_glyphs_type ON glyphs(glyph_type);
CREATE INDEX IF NOT EXISTS idx_glyphs_ritual ON glyphs(ritual_id);

CREATE TABLE IF NOT EXISTS sigil_metadata (
    sigil_name TEXT PRIMARY KEY,
    description TEXT,
    glyph_count INTEGER NOT NULL DEFAULT 0,
    ritual_count INTEGER NOT NULL DEFAULT 0,
    last_updated TEXT NOT NULL,
    meta_data TEXT
);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
