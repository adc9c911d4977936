//! CLI commands over the flat-file vault, plus the database push/pull bridge
//! and the evolution rituals.

use std::path::Path;

use anyhow::{Context, Result};

use codex_alchemy::config::AlchemyConfig;
use codex_alchemy::glyph::{vector_preview, Glyph};
use codex_alchemy::records::{self, GlyphType};
use codex_alchemy::rituals;

const PREVIEW_DIMS: usize = 5;

pub fn list(config: &AlchemyConfig) -> Result<()> {
    let vault = super::open_vault(config)?;
    let sigils = vault.list_sigils()?;
    if sigils.is_empty() {
        println!("No sigils in {}", vault.root().display());
        return Ok(());
    }
    println!("Sigils in {}:", vault.root().display());
    for sigil in sigils {
        match vault.restore(&sigil) {
            Ok(glyphs) => println!("  {:<24} {} glyphs", sigil, glyphs.len()),
            Err(e) => println!("  {:<24} ({e})", sigil),
        }
    }
    Ok(())
}

pub fn show(config: &AlchemyConfig, sigil: &str) -> Result<()> {
    let vault = super::open_vault(config)?;
    let glyphs = vault.restore(sigil)?;
    println!("Sigil '{sigil}': {} glyphs", glyphs.len());
    for g in &glyphs {
        let depth = g.lineage_depth.map(|d| format!(" depth={d}")).unwrap_or_default();
        println!(
            "  {:<28} [{}] ({} dims){depth}",
            g.name,
            vector_preview(&g.vector, PREVIEW_DIMS),
            g.dims()
        );
    }
    Ok(())
}

pub fn diff(config: &AlchemyConfig, a: &str, b: &str) -> Result<()> {
    let vault = super::open_vault(config)?;
    let diff = vault.diff(a, b)?;

    println!("{} ({} glyphs) vs {} ({} glyphs)", diff.sigil_a, diff.count_a, diff.sigil_b, diff.count_b);
    if diff.identical {
        println!("Sigils are identical.");
        return Ok(());
    }
    print_names(&format!("Only in {a}"), &diff.only_in_a);
    print_names(&format!("Only in {b}"), &diff.only_in_b);
    print_names("Changed", &diff.differing);
    println!("Common: {} ({} unchanged)", diff.common(), diff.unchanged.len());
    Ok(())
}

fn print_names(title: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    println!("{title}:");
    for name in names {
        println!("  {name}");
    }
}

/// Append the glyphs listed in a JSON file to `sigil`.
pub fn ingest(config: &AlchemyConfig, sigil: &str, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let glyphs: Vec<Glyph> = serde_json::from_str(&content)
        .with_context(|| format!("{} must be a JSON list of {{name, vector}} glyphs", file.display()))?;

    let vault = super::open_vault(config)?;
    let total = vault.ingest(sigil, &glyphs)?;
    println!("Ingested {} glyphs into '{sigil}' ({total} total)", glyphs.len());
    Ok(())
}

pub fn bundle(config: &AlchemyConfig, sigils: &[String], name: &str) -> Result<()> {
    let vault = super::open_vault(config)?;
    let count = vault.bundle(sigils, name)?;
    println!("Bundled {count} glyphs from {} sigils into '{name}'", sigils.len());
    Ok(())
}

pub fn reflect(config: &AlchemyConfig, name: &str) -> Result<()> {
    let vault = super::open_vault(config)?;
    let count = vault.reflect_all(name)?;
    println!("Reflected {count} glyphs into '{name}'");
    Ok(())
}

/// Copy a flat-file sigil into the database partition of the same name.
pub fn push(config: &AlchemyConfig, sigil: &str, glyph_type: GlyphType) -> Result<()> {
    let vault = super::open_vault(config)?;
    let glyphs = vault.restore(sigil)?;
    let mut conn = super::open_db(config)?;
    let stored = records::store_sigil(&mut conn, sigil, &glyphs, glyph_type)?;
    println!("Pushed {stored} glyphs from '{sigil}' into the database as {glyph_type}");
    Ok(())
}

/// Write a database partition back out as a flat-file sigil.
pub fn pull(config: &AlchemyConfig, sigil: &str) -> Result<()> {
    let conn = super::open_db(config)?;
    let glyphs = records::load_sigil(&conn, sigil)?;
    let vault = super::open_vault(config)?;
    let path = vault.preserve(sigil, &glyphs)?;
    println!("Pulled {} glyphs into {}", glyphs.len(), path.display());
    Ok(())
}

pub fn evolve(config: &AlchemyConfig, source: &str, target: &str) -> Result<()> {
    let vault = super::open_vault(config)?;
    let report = rituals::evolve_glyphs(&vault, source, target, &mut rand::rng())?;
    for m in &report.mutations {
        println!("  {} -> {}", m.from, m.to);
    }
    println!(
        "Evolved {} glyphs from '{}' into '{}' in {} ms",
        report.evolved, report.source, report.target, report.elapsed_ms
    );
    super::ledger(config).append("evolve", serde_json::to_value(&report)?)?;
    Ok(())
}

pub fn dream_loop(config: &AlchemyConfig) -> Result<()> {
    let vault = super::open_vault(config)?;
    let report = rituals::dream_loop(&vault, &mut rand::rng())?;
    if report.seeded {
        println!("Seeded '{}' with starter glyphs.", rituals::DREAM_SOURCE);
    }
    println!(
        "Dream loop complete: {} glyphs evolved into '{}'",
        report.evolved_glyphs,
        rituals::DREAM_TARGET
    );
    for g in &report.new_glyphs {
        println!("  {}", g.name);
    }
    Ok(())
}
