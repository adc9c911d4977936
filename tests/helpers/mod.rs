#![allow(dead_code)]

use std::path::Path;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use rusqlite::Connection;
use serde_json::Value;
use tower::ServiceExt;

use codex_alchemy::config::AlchemyConfig;
use codex_alchemy::glyph::Glyph;
use codex_alchemy::server::{build_router, AppState};
use codex_alchemy::vault::VaultStore;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    codex_alchemy::db::open_memory_database().unwrap()
}

/// A vault rooted in a new temp dir. Keep the `TempDir` alive for the test.
pub fn test_vault() -> (tempfile::TempDir, VaultStore) {
    let dir = tempfile::tempdir().unwrap();
    let vault = VaultStore::open(dir.path().join("sigils")).unwrap();
    (dir, vault)
}

pub fn glyph(name: &str, vector: &[f64]) -> Glyph {
    Glyph::new(name, vector.to_vec())
}

/// Config with every file location under `root`.
pub fn test_config(root: &Path) -> AlchemyConfig {
    let path = |p: &str| root.join(p).to_string_lossy().into_owned();
    let mut config = AlchemyConfig::default();
    config.server.cors_origins = vec!["http://localhost:3000".to_string()];
    config.storage.vault_dir = path("sigils");
    config.storage.db_path = path("codex.db");
    config.storage.ledger_dir = path("ledger");
    config.storage.backup_path = path("backup.json");
    config.storage.sync.a0_vault = path("a0/vault.json");
    config.storage.sync.codex_vault = path("codex/vault.json");
    config.storage.sync.codex_vault_alt = path("codex/ritual_log.jsonl");
    config.storage.sync.log_path = path("sync/vault_sync.log");
    config.storage.sync.backup_dir = path("sync/backups");
    config.assistant.api_key = None;
    config
}

/// The full router over an in-memory database and a vault under `root`.
pub fn test_app(root: &Path) -> Router {
    let state = AppState::new(test_config(root), test_db()).unwrap();
    build_router(state)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn send_json(app: Router, method: Method, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
