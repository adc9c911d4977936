use anyhow::Result;

use codex_alchemy::config::AlchemyConfig;
use codex_alchemy::sync::VaultSync;

pub fn sync(config: &AlchemyConfig) -> Result<()> {
    let report = VaultSync::new(&config.storage.sync).sync_vaults();
    println!("Vault synchronization completed at {}", report.timestamp);
    println!("  Glyphs:   {}", report.glyphs);
    println!("  Rituals:  {}", report.rituals);
    println!("  Spells:   {}", report.spells);
    println!("  Agents:   {}", report.agents);
    println!("  A0 vault saved:    {}", report.a0_saved);
    println!("  Codex vault saved: {}", report.codex_saved);
    anyhow::ensure!(report.a0_saved && report.codex_saved, "one or more vaults could not be written; see the sync log");
    Ok(())
}

pub fn status(config: &AlchemyConfig) -> Result<()> {
    let status = VaultSync::new(&config.storage.sync).status()?;
    println!("A0 vault:     {}", if status.vaults.a0 { "present" } else { "missing" });
    println!("Codex vault:  {}", if status.vaults.codex { "present" } else { "missing" });
    println!("Last sync:    {}", status.last_sync.as_deref().unwrap_or("never"));
    println!("Log file:     {}", status.log_file);
    println!("Backups:      {}", status.backup_dir);
    Ok(())
}

pub fn logs(config: &AlchemyConfig, limit: usize) -> Result<()> {
    let logs = VaultSync::new(&config.storage.sync).logs(limit)?;
    for line in &logs.logs {
        println!("{line}");
    }
    eprintln!("showing {} of {} entries", logs.showing_last, logs.total_entries);
    Ok(())
}
