use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use codex_alchemy::config::AlchemyConfig;
use codex_alchemy::records;

/// Rebuild the database from a vault backup file.
pub fn migrate(config: &AlchemyConfig, backup: Option<&Path>) -> Result<()> {
    let backup = backup
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.resolved_backup_path());
    anyhow::ensure!(backup.exists(), "backup file not found: {}", backup.display());

    let mut conn = super::open_db(config)?;

    println!("Migrating {} into {}", backup.display(), config.resolved_db_path().display());
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")
            .expect("valid template")
            .progress_chars("##-"),
    );

    let summary = records::migrate_backup(&mut conn, &backup, Some(&pb))
        .with_context(|| format!("migration from {} failed", backup.display()))?;

    if summary.repaired {
        println!("Backup was a bare list; imported it as '{}'.", records::migrate::RECOVERED_SIGIL);
    }
    println!("Migration complete:");
    println!("  Glyphs:          {}", summary.glyphs);
    println!("  Rituals:         {}", summary.rituals);
    println!("  Items in backup: {}", summary.total_items);
    Ok(())
}
