//! Database-backed rituals, glyphs, and sigil metadata.
//!
//! Every function takes a borrowed [`rusqlite::Connection`]; callers own the
//! connection (the server keeps one behind a mutex, the CLI opens its own).
//! Multi-statement writes run inside a transaction.

pub mod glyphs;
pub mod migrate;
pub mod rituals;

use serde::{Deserialize, Serialize};

pub use glyphs::{get_metadata, list_glyphs, load_sigil, store_sigil, vault_stats};
pub use migrate::{migrate_backup, MigrationSummary};
pub use rituals::{
    create_ritual, delete_ritual, get_ritual, list_rituals, list_rituals_with_glyphs,
    seed_rituals, update_ritual,
};

/// Origin of a stored glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlyphType {
    /// Produced by an evolution ritual or ingested directly.
    Evolved,
    /// Attached to a ritual row.
    RitualGenerated,
}

impl GlyphType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evolved => "evolved",
            Self::RitualGenerated => "ritual_generated",
        }
    }
}

impl std::fmt::Display for GlyphType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GlyphType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "evolved" => Ok(Self::Evolved),
            "ritual_generated" | "ritual-generated" => Ok(Self::RitualGenerated),
            _ => Err(format!("unknown glyph type: {s}")),
        }
    }
}

/// A row of the `rituals` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ritual {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub ritual_type: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Input for [`create_ritual`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRitual {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ritual_type: Option<String>,
}

/// Partial update for [`update_ritual`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RitualUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ritual_type: Option<String>,
}

/// A row of the `glyphs` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlyphRecord {
    /// UUID v7 primary key.
    pub id: String,
    pub name: String,
    pub vector: Vec<f64>,
    pub hash: Option<String>,
    pub glyph_type: GlyphType,
    pub ritual_id: Option<i64>,
    pub sigil: Option<String>,
    pub lineage_depth: Option<u32>,
    /// Unix seconds carried over from the flat-file glyph.
    pub timestamp: Option<f64>,
    pub created_at: String,
}

impl GlyphRecord {
    /// The flat-file view of this row.
    pub fn to_glyph(&self) -> crate::glyph::Glyph {
        crate::glyph::Glyph {
            name: self.name.clone(),
            vector: self.vector.clone(),
            timestamp: self.timestamp,
            lineage_depth: self.lineage_depth,
            hash: self.hash.clone(),
        }
    }
}

/// A ritual together with the glyphs linked to it.
#[derive(Debug, Clone, Serialize)]
pub struct RitualWithGlyphs {
    #[serde(flatten)]
    pub ritual: Ritual,
    pub glyphs: Vec<GlyphRecord>,
}

/// A row of the `sigil_metadata` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SigilMetadata {
    pub sigil_name: String,
    pub description: Option<String>,
    pub glyph_count: i64,
    pub ritual_count: i64,
    pub last_updated: String,
    pub meta_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultStats {
    pub total_glyphs: i64,
    pub glyph_type_counts: std::collections::BTreeMap<String, i64>,
    /// The most recently updated sigil, if any metadata exists.
    pub sigil_metadata: Option<SigilMetadata>,
}
