//! CLI `doctor` command: check the vault directory and database and print a
//! health report.

use anyhow::{Context, Result};

use codex_alchemy::config::AlchemyConfig;
use codex_alchemy::db;

/// Run vault and database diagnostics and print a health report.
pub fn doctor(config: &AlchemyConfig) -> Result<()> {
    println!("Codex Alchemy Health Report");
    println!("===========================");
    println!();

    let vault_dir = config.resolved_vault_dir();
    println!("Vault:             {}", vault_dir.display());
    match super::open_vault(config).and_then(|v| Ok(v.list_sigils()?)) {
        Ok(sigils) => println!("  Sigils:          {}", sigils.len()),
        Err(e) => println!("  ERROR:           {e:#}"),
    }
    println!("Ledger:            {}", config.resolved_ledger_dir().display());
    println!(
        "Assistant key:     {}",
        if config.assistant.api_key.is_some() { "configured" } else { "(not set, online mode unavailable)" }
    );
    println!();

    let db_path = config.resolved_db_path();
    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `codex migrate` or `codex serve` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let conn = db::open_database(&db_path)
        .context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn)
        .context("failed to run health check")?;

    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!();
    println!("Row counts:");
    println!("  Rituals:         {}", report.ritual_count);
    println!("  Glyphs:          {}", report.glyph_count);
    println!("  Sigil metadata:  {}", report.sigil_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db {}", db_path.display());
        println!("  2. Or rebuild from the vault backup:");
        println!("     codex migrate {}", config.resolved_backup_path().display());
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_humanized() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
