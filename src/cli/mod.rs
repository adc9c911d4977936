pub mod assist;
pub mod doctor;
pub mod drift;
pub mod migrate;
pub mod rituals;
pub mod stats;
pub mod sync;
pub mod text;
pub mod vault;

use anyhow::{Context, Result};
use rusqlite::Connection;

use codex_alchemy::config::AlchemyConfig;
use codex_alchemy::ledger::Ledger;
use codex_alchemy::vault::VaultStore;

/// Open the flat-file vault at the configured location.
pub fn open_vault(config: &AlchemyConfig) -> Result<VaultStore> {
    let dir = config.resolved_vault_dir();
    VaultStore::open(&dir).with_context(|| format!("failed to open vault at {}", dir.display()))
}

/// Open (and migrate) the configured database.
pub fn open_db(config: &AlchemyConfig) -> Result<Connection> {
    let path = config.resolved_db_path();
    codex_alchemy::db::open_database(&path)
        .with_context(|| format!("failed to open database at {}", path.display()))
}

pub fn ledger(config: &AlchemyConfig) -> Ledger {
    Ledger::new(config.resolved_ledger_dir())
}
