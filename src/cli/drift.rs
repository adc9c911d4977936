use anyhow::Result;

use codex_alchemy::config::AlchemyConfig;
use codex_alchemy::drift::{detect_sigil_drift, DriftStatus};

pub fn drift(config: &AlchemyConfig, sigil: &str, json: bool) -> Result<()> {
    let vault = super::open_vault(config)?;
    let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
    let report = detect_sigil_drift(&vault, sigil, now, &config.drift)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.status == DriftStatus::Empty {
        println!("Sigil '{sigil}' has no glyphs to scan.");
        return Ok(());
    }

    println!("Drift report for '{sigil}': {} of {} glyphs flagged", report.drifted.len(), report.total);
    for d in &report.drifted {
        let categories: Vec<&str> = d.categories.iter().map(|c| c.as_str()).collect();
        let cluster = if d.cluster < 0 { "noise".to_string() } else { d.cluster.to_string() };
        println!(
            "  {:<28} score={:.3} cluster={:<6} {}",
            d.name,
            d.drift_score,
            cluster,
            categories.join(", ")
        );
    }
    Ok(())
}
