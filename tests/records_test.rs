mod helpers;

use helpers::{glyph, test_db, test_vault};
use codex_alchemy::db;
use codex_alchemy::records::{self, migrate::RECOVERED_SIGIL, GlyphType, NewRitual};
use serde_json::json;

fn write_backup(dir: &std::path::Path, body: serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("codex_vault_backup.json");
    std::fs::write(&path, body.to_string()).unwrap();
    path
}

#[test]
fn migration_links_deduction_glyphs_to_rituals() {
    let dir = tempfile::tempdir().unwrap();
    let backup = write_backup(
        dir.path(),
        json!({
            "RecoveredSigil": [
                {"name": "deduction_ritual_alpha", "vector": [0.1, 0.2]},
                {"name": "ember", "vector": [1.0, 2.0], "hash": "abc"},
                {"name": "deduction_ritual_beta", "vector": [0.3, 0.4]},
                {"name": "", "vector": [1.0]},
            ]
        }),
    );

    let mut conn = test_db();
    // stale rows are cleared by the migration
    records::create_ritual(&conn, &NewRitual { name: "old".into(), ..Default::default() }).unwrap();

    let summary = records::migrate_backup(&mut conn, &backup, None).unwrap();
    assert_eq!(summary.glyphs, 1);
    assert_eq!(summary.rituals, 2);
    assert_eq!(summary.total_items, 4);
    assert!(!summary.repaired);

    let rituals = records::list_rituals_with_glyphs(&conn).unwrap();
    assert_eq!(rituals.len(), 2);
    for r in &rituals {
        assert_eq!(r.ritual.ritual_type.as_deref(), Some("deduction"));
        assert_eq!(r.glyphs.len(), 1);
        assert_eq!(r.glyphs[0].name, r.ritual.name);
        assert_eq!(r.glyphs[0].glyph_type, GlyphType::RitualGenerated);
    }

    let evolved = records::list_glyphs(&conn, Some(GlyphType::Evolved)).unwrap();
    assert_eq!(evolved.len(), 1);
    assert_eq!(evolved[0].hash.as_deref(), Some("abc"));

    let meta = records::get_metadata(&conn, Some(RECOVERED_SIGIL)).unwrap();
    assert_eq!(meta.glyph_count, 1);
    assert_eq!(meta.ritual_count, 2);
    assert_eq!(meta.meta_data.unwrap()["source"], "codex_vault_backup.json");
}

#[test]
fn bare_list_backup_is_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let backup = write_backup(dir.path(), json!([{"name": "lone", "vector": [1.0]}]));

    let mut conn = test_db();
    let summary = records::migrate_backup(&mut conn, &backup, None).unwrap();
    assert!(summary.repaired);
    assert_eq!(summary.glyphs, 1);
    assert_eq!(records::load_sigil(&conn, RECOVERED_SIGIL).unwrap()[0].name, "lone");
}

#[test]
fn push_and_pull_preserve_lineage() {
    let (_dir, vault) = test_vault();
    let mut first = glyph("ember", &[0.5, 1.5]).with_hash();
    first.lineage_depth = Some(2);
    first.timestamp = Some(1_700_000_000.5);
    vault.preserve("fire", &[first.clone(), glyph("ash", &[0.0, 0.0])]).unwrap();

    let mut conn = test_db();
    let glyphs = vault.restore("fire").unwrap();
    assert_eq!(records::store_sigil(&mut conn, "fire", &glyphs, GlyphType::Evolved).unwrap(), 2);

    let pulled = records::load_sigil(&conn, "fire").unwrap();
    assert_eq!(pulled[0], first);
    assert_eq!(pulled[1].name, "ash");
    // hashes are filled in on the way into the database
    assert!(pulled[1].hash.is_some());

    // pushing again replaces the partition instead of appending
    records::store_sigil(&mut conn, "fire", &glyphs[..1], GlyphType::Evolved).unwrap();
    assert_eq!(records::load_sigil(&conn, "fire").unwrap().len(), 1);

    let stats = records::vault_stats(&conn).unwrap();
    assert_eq!(stats.total_glyphs, 1);
    assert_eq!(stats.sigil_metadata.unwrap().sigil_name, "fire");
}

#[test]
fn file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("codex.db");

    {
        let mut conn = db::open_database(&path).unwrap();
        assert_eq!(records::seed_rituals(&mut conn).unwrap(), 4);
    }

    let mut conn = db::open_database(&path).unwrap();
    assert_eq!(records::seed_rituals(&mut conn).unwrap(), 0);
    let health = db::check_database_health(&conn).unwrap();
    assert!(health.integrity_ok);
    assert_eq!(health.ritual_count, 4);
    assert_eq!(health.schema_version, db::migrations::CURRENT_SCHEMA_VERSION);
}
