//! The [`Glyph`] record and its deterministic content hash.
//!
//! A glyph is a name plus a numeric vector. Timestamp, lineage depth, and hash
//! are optional so that legacy `{name, vector}` files round-trip unchanged.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of hash bytes kept when fingerprinting a glyph.
const HASH_BYTES: usize = 16;

/// A named vector, the atomic unit of stored data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub name: String,
    pub vector: Vec<f64>,
    /// Unix seconds at which the glyph was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    /// Number of evolution steps separating this glyph from its seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage_depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl Glyph {
    pub fn new(name: impl Into<String>, vector: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            vector,
            timestamp: None,
            lineage_depth: None,
            hash: None,
        }
    }

    pub fn dims(&self) -> usize {
        self.vector.len()
    }

    /// Fill in `hash` from the current name and vector.
    pub fn with_hash(mut self) -> Self {
        self.hash = Some(hash_glyph(&self));
        self
    }
}

/// Deterministic fingerprint of a glyph's content.
///
/// Only `name` and `vector` contribute; volatile fields (timestamp, hash) are
/// ignored. The canonical form is sorted-key JSON, hashed with SHA-256 and
/// truncated to 16 bytes of lowercase hex.
pub fn hash_glyph(glyph: &Glyph) -> String {
    // serde_json's default Map is a BTreeMap, so keys serialize sorted.
    let canonical = serde_json::json!({
        "name": glyph.name,
        "vector": glyph.vector,
    });
    let digest = Sha256::digest(canonical.to_string().as_bytes());
    digest[..HASH_BYTES]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Short "0.12, -0.40, ..." preview of a vector for terminal output.
pub fn vector_preview(vector: &[f64], max: usize) -> String {
    let head: Vec<String> = vector.iter().take(max).map(|v| format!("{v:.2}")).collect();
    let mut out = head.join(", ");
    if vector.len() > max {
        out.push_str("...");
    }
    out
}
