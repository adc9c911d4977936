use anyhow::Result;

use codex_alchemy::config::AlchemyConfig;
use codex_alchemy::records::{self, NewRitual};

pub fn list(config: &AlchemyConfig) -> Result<()> {
    let conn = super::open_db(config)?;
    let rituals = records::list_rituals(&conn)?;
    if rituals.is_empty() {
        println!("No rituals. Run `codex rituals seed` to add the defaults.");
        return Ok(());
    }
    for r in rituals {
        println!(
            "  [{:>3}] {:<28} {:<12} {}",
            r.id,
            r.name,
            r.ritual_type.as_deref().unwrap_or("-"),
            r.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub fn add(config: &AlchemyConfig, new: NewRitual) -> Result<()> {
    let conn = super::open_db(config)?;
    let ritual = records::create_ritual(&conn, &new)?;
    println!("Created ritual {} ({})", ritual.id, ritual.name);
    Ok(())
}

pub fn remove(config: &AlchemyConfig, id: i64) -> Result<()> {
    let conn = super::open_db(config)?;
    records::delete_ritual(&conn, id)?;
    println!("Deleted ritual {id}");
    Ok(())
}

pub fn seed(config: &AlchemyConfig) -> Result<()> {
    let mut conn = super::open_db(config)?;
    let added = records::seed_rituals(&mut conn)?;
    println!("Seeded {added} default rituals");
    Ok(())
}
