use anyhow::Result;

use codex_alchemy::config::AlchemyConfig;
use codex_alchemy::records;

/// Display database glyph statistics in the terminal.
pub fn stats(config: &AlchemyConfig) -> Result<()> {
    let conn = super::open_db(config)?;
    let stats = records::vault_stats(&conn)?;
    let rituals = records::list_rituals(&conn)?;

    println!("Vault Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total glyphs:        {}", stats.total_glyphs);
    println!("  Rituals:             {}", rituals.len());
    println!();

    println!("By Type:");
    for t in &["evolved", "ritual_generated"] {
        let count = stats.glyph_type_counts.get(*t).copied().unwrap_or(0);
        println!("  {:<18} {}", t, count);
    }
    println!();

    match stats.sigil_metadata {
        Some(meta) => {
            println!("Latest sigil:          {}", meta.sigil_name);
            println!("  Glyphs:              {}", meta.glyph_count);
            println!("  Rituals:             {}", meta.ritual_count);
            println!("  Updated:             {}", meta.last_updated);
        }
        None => println!("No sigil metadata recorded yet."),
    }

    Ok(())
}
