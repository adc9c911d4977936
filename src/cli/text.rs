//! `codex compress` and `codex refine`.

use std::path::Path;

use anyhow::{Context, Result};

use codex_alchemy::compress::{compress_and_teach, reduce_prompt, CompressionProfile};
use codex_alchemy::config::AlchemyConfig;
use codex_alchemy::rituals::refine::{refine_script, Feedback};

pub struct CompressOptions<'a> {
    pub symbolic: bool,
    pub snapshot: bool,
    pub teach: Option<&'a str>,
    pub max_length: Option<usize>,
}

pub fn compress(config: &AlchemyConfig, file: &Path, opts: CompressOptions<'_>) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let max_length = opts.max_length.unwrap_or(config.compression.max_length);
    anyhow::ensure!(max_length > 0, "--max-length must be positive");
    let ledger = super::ledger(config);

    let result = match opts.teach {
        Some(label) => compress_and_teach(&text, label, max_length, &ledger)?,
        None => {
            let profile = if opts.symbolic {
                CompressionProfile::Symbolic
            } else {
                CompressionProfile::Plain
            };
            reduce_prompt(&text, profile, max_length)
        }
    };

    println!("{}", result.text);
    eprintln!(
        "{} -> {} chars ({} saved)",
        result.original_len,
        result.compressed_len,
        result.saved()
    );

    if opts.snapshot {
        let mode = if opts.symbolic { "symbolic" } else { "compress" };
        let path = ledger.save_snapshot(&text, &result.text, mode)?;
        eprintln!("Snapshot saved to {}", path.display());
    }
    Ok(())
}

pub fn refine(file: &Path, rating: i64, comments: &str) -> Result<()> {
    let script = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let feedback = Feedback {
        rating,
        comments: comments.to_string(),
    };
    println!("{}", refine_script(&script, &feedback));
    Ok(())
}
