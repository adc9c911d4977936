//! Glyph vaults, evolution rituals, and drift detection.
//!
//! A *glyph* is a named numeric vector; a *sigil* is a named collection of
//! glyphs stored as one JSON file in the vault directory. Rituals derive new
//! sigils from old ones, the drift detector flags glyphs that have wandered
//! from their neighbours, and an SQLite database mirrors sigils and rituals
//! for the REST API.
//!
//! # Modules
//!
//! - [`config`]: configuration from TOML files and environment variables
//! - [`vault`]: flat-file sigil store (restore, preserve, bundle, diff)
//! - [`rituals`]: glyph evolution, the dream loop, and script refinement
//! - [`drift`]: DBSCAN + EWMA drift scoring
//! - [`compress`]: prompt compression ("token guard")
//! - [`ledger`]: append-only JSONL records and snapshots
//! - [`db`] and [`records`]: SQLite schema, migrations, and entity queries
//! - [`sync`]: merging of the A0 and Codex vault documents
//! - [`assistant`]: the offline Gene assistant and the online chat client
//! - [`server`]: the axum REST API

pub mod assistant;
pub mod compress;
pub mod config;
pub mod db;
pub mod drift;
pub mod error;
pub mod glyph;
pub mod ledger;
pub mod records;
pub mod rituals;
pub mod server;
pub mod sync;
pub mod vault;
