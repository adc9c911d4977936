//! Regex prompt compression ("token guard").
//!
//! Two substitution tables are available. [`CompressionProfile::Plain`] strips
//! filler phrases; [`CompressionProfile::Symbolic`] also replaces politeness
//! and list structure with short symbols. Both finish with whitespace
//! collapsing and a character cap.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AlchemyResult;
use crate::ledger::Ledger;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionProfile {
    #[default]
    Plain,
    Symbolic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Compression {
    pub text: String,
    pub original_len: usize,
    pub compressed_len: usize,
}

impl Compression {
    /// Characters removed, never negative (the ellipsis can add three).
    pub fn saved(&self) -> usize {
        self.original_len.saturating_sub(self.compressed_len)
    }
}

fn compile(table: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    table
        .iter()
        .map(|(pattern, repl)| (Regex::new(pattern).expect("valid regex"), *repl))
        .collect()
}

static PLAIN_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)\bplease can you\b", ""),
        (r"(?i)\bcan you\b", ""),
        (r"(?i)\bcould you\b", ""),
        (r"(?i)\bi would like you to\b", ""),
        (r"(?i)\bi want you to\b", ""),
        (r"(?i)\bit is requested that you\b", ""),
        (r"(?i)\bthe goal is to\b", ""),
        (r"(?i)\bthis prompt asks you to\b", ""),
        (r"(?i)\byour task is to\b", ""),
        (r"(?i)\btask is\b", ""),
        (r"(?i)\bin order to\b", "to"),
        (r"(?i)\butilize\b", "use"),
        (r"(?i)\bwithin the context of\b", "in"),
        (r"(?i)\bthe following\b", ""),
        (r"(?i)\bmeaning within\b", "meaning in"),
        (r"(?i)\brecursive meaning\b", "recursion"),
        (r"(?i)\bsymbolic glyph lineage\b", "glyph lineage"),
        (r"(?i)\bvault system\b", "vault"),
        (r"(?i)\bsummarize and analyze\b", "analyze"),
    ])
});

static SYMBOLIC_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)\bplease\s+(can you|could you)\b", "🧾"),
        (r"(?i)\bplease\s+(summarize|list|explain)\b", "$1"),
        (r"(?i)\bwhat is the\b", ""),
        (r"(?i)\bi want you to\b", ""),
        (r"(?i)\bit is important to\b", ""),
        (r"(?i)\bin the context of\b", ""),
        (r"(?i)\bmake sure to\b", "ensure"),
        (r"(?i)\bi would like to\b", "want to"),
        (r"(?i)\bplease\b", "⤵️"),
        (r"(?i)\bthank you\b", "🙏"),
    ])
});

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[-*][ \t]+").expect("valid regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static STEP_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(step|phase|part)\s*\d+\b").expect("valid regex"));

/// Compress `text` with the given profile, capping the result at
/// `max_length` characters (plus a trailing `...` when cut).
pub fn reduce_prompt(text: &str, profile: CompressionProfile, max_length: usize) -> Compression {
    let mut out = text.to_string();
    match profile {
        CompressionProfile::Plain => {
            for (re, repl) in PLAIN_RULES.iter() {
                out = re.replace_all(&out, *repl).into_owned();
            }
            out = WHITESPACE.replace_all(&out, " ").trim().to_string();
        }
        CompressionProfile::Symbolic => {
            for (re, repl) in SYMBOLIC_RULES.iter() {
                out = re.replace_all(&out, *repl).into_owned();
            }
            // list markers are only recognisable before newlines are collapsed
            out = LIST_MARKER.replace_all(&out, "• ").into_owned();
            out = BLANK_LINES.replace_all(&out, "\n").into_owned();
            out = WHITESPACE.replace_all(&out, " ").trim().to_string();
            out = STEP_MARKER.replace_all(&out, "↪️").into_owned();
        }
    }

    if out.chars().count() > max_length {
        out = out.chars().take(max_length).collect::<String>() + "...";
    }

    let compression = Compression {
        original_len: text.chars().count(),
        compressed_len: out.chars().count(),
        text: out,
    };
    tracing::debug!(
        ?profile,
        original = compression.original_len,
        compressed = compression.compressed_len,
        "prompt compressed"
    );
    compression
}

/// Compress with the plain profile and record the pair as a `train` ledger
/// entry under `label`.
pub fn compress_and_teach(
    text: &str,
    label: &str,
    max_length: usize,
    ledger: &Ledger,
) -> AlchemyResult<Compression> {
    let compression = reduce_prompt(text, CompressionProfile::Plain, max_length);
    ledger.append(
        "train",
        serde_json::json!({
            "original": text,
            "compressed": compression.text,
            "label": label,
        }),
    )?;
    Ok(compression)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_strips_filler() {
        let c = reduce_prompt(
            "Could you   utilize the vault system in order to\n\nsummarize and analyze glyphs?",
            CompressionProfile::Plain,
            1024,
        );
        assert_eq!(c.text, "use the vault to analyze glyphs?");
        assert!(c.saved() > 0);
    }

    #[test]
    fn plain_respects_word_boundaries() {
        let c = reduce_prompt("pecan your toast", CompressionProfile::Plain, 1024);
        assert_eq!(c.text, "pecan your toast");
    }

    #[test]
    fn truncates_on_characters() {
        let c = reduce_prompt("🧬🧬🧬🧬🧬", CompressionProfile::Plain, 3);
        assert_eq!(c.text, "🧬🧬🧬...");
        assert_eq!(c.original_len, 5);
        assert_eq!(c.compressed_len, 6);
        assert_eq!(c.saved(), 0);
    }

    #[test]
    fn symbolic_replaces_politeness() {
        let c = reduce_prompt(
            "Please could you help. Please explain this. Thank you",
            CompressionProfile::Symbolic,
            1024,
        );
        assert_eq!(c.text, "🧾 help. explain this. 🙏");
    }

    #[test]
    fn symbolic_lists_and_steps() {
        let text = "Make sure to:\n- read input\n\n* write output\nthen step 2 and part3";
        let c = reduce_prompt(text, CompressionProfile::Symbolic, 1024);
        assert_eq!(c.text, "ensure: • read input • write output then ↪️ and ↪️");
    }

    #[test]
    fn teach_appends_train_entry() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path());
        let c = compress_and_teach("can you list glyphs", "unit", 1024, &ledger).unwrap();
        assert_eq!(c.text, "list glyphs");

        let entries = ledger.read_entries(crate::ledger::LEDGER_FILE).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["mode"], "train");
        assert_eq!(entries[0]["result"]["label"], "unit");
        assert_eq!(entries[0]["result"]["compressed"], "list glyphs");
    }
}
