//! Domain errors shared by the vault, records, and drift modules.

use std::path::PathBuf;

/// Errors raised by vault and record operations.
///
/// The HTTP layer maps these onto status codes; the CLI prints them through
/// `anyhow`.
#[derive(Debug, thiserror::Error)]
pub enum AlchemyError {
    #[error("vault sigil '{sigil}' not found at {}", path.display())]
    SigilNotFound { sigil: String, path: PathBuf },

    #[error("vault file '{sigil}.json' is not valid JSON: {source}")]
    InvalidJson {
        sigil: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("vault file for sigil '{sigil}' must be a list of glyphs")]
    NotAList { sigil: String },

    #[error("malformed glyph entry in sigil '{sigil}': {entry}")]
    MalformedGlyph { sigil: String, entry: String },

    #[error("sigil '{sigil}' contains zero glyphs")]
    EmptySigil { sigil: String },

    #[error("invalid sigil name: {0:?}")]
    InvalidSigilName(String),

    #[error("glyph '{name}' has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("ritual not found: {0}")]
    RitualNotFound(i64),

    #[error("ritual already exists: {0}")]
    DuplicateRitual(String),

    #[error("no metadata found for {0}")]
    MetadataNotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

impl AlchemyError {
    /// True for the "nothing stored under this sigil" family of errors.
    pub fn is_missing_sigil(&self) -> bool {
        matches!(self, Self::SigilNotFound { .. } | Self::EmptySigil { .. })
    }
}

pub type AlchemyResult<T> = Result<T, AlchemyError>;
