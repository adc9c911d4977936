pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the Codex database at the given path with the schema
/// initialized and migrations applied.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&mut conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open a fully migrated in-memory database.
pub fn open_memory_database() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&mut conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Result of [`check_database_health`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthReport {
    pub schema_version: u32,
    pub ritual_count: i64,
    pub glyph_count: i64,
    pub sigil_count: i64,
    pub integrity_ok: bool,
    pub integrity_details: String,
}

/// Collect schema version, row counts, and the result of `PRAGMA integrity_check`.
pub fn check_database_health(conn: &Connection) -> rusqlite::Result<HealthReport> {
    let count = |table: &str| -> rusqlite::Result<i64> {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
    };

    let integrity: Vec<String> = conn
        .prepare("PRAGMA integrity_check")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    let integrity_ok = integrity.len() == 1 && integrity[0] == "ok";

    Ok(HealthReport {
        schema_version: migrations::get_schema_version(conn)?,
        ritual_count: count("rituals")?,
        glyph_count: count("glyphs")?,
        sigil_count: count("sigil_metadata")?,
        integrity_ok,
        integrity_details: integrity.join("; "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_database_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("codex.db");
        let conn = open_database(&path).unwrap();
        assert!(path.exists());
        assert_eq!(
            migrations::get_schema_version(&conn).unwrap(),
            migrations::CURRENT_SCHEMA_VERSION
        );
    }

    #[test]
    fn health_report_on_empty_db() {
        let conn = open_memory_database().unwrap();
        let report = check_database_health(&conn).unwrap();
        assert!(report.integrity_ok);
        assert_eq!(report.integrity_details, "ok");
        assert_eq!(report.glyph_count, 0);
        assert_eq!(report.schema_version, migrations::CURRENT_SCHEMA_VERSION);
    }
}
