//! REST API over the vault, the database records, and the assistant.
//!
//! [`build_router`] is shared by [`serve`] and the integration tests so both
//! run the same middleware stack. Handlers never touch SQLite or the
//! filesystem on the async runtime; they hop onto the blocking pool through
//! [`AppState::with_db`] and [`blocking`].

pub mod error;
pub mod extract;
pub mod handlers;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use rusqlite::Connection;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::assistant::GeneAssistant;
use crate::config::{AlchemyConfig, ServerConfig};
use crate::error::AlchemyResult;
use crate::ledger::Ledger;
use crate::sync::VaultSync;
use crate::vault::VaultStore;
use error::{ApiError, ApiResult};

/// Shared state handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub vault: Arc<VaultStore>,
    pub ledger: Arc<Ledger>,
    pub gene: Arc<GeneAssistant>,
    pub sync: Arc<VaultSync>,
    pub config: Arc<AlchemyConfig>,
}

impl AppState {
    /// Assemble state around an already opened connection.
    pub fn new(config: AlchemyConfig, conn: Connection) -> Result<Self> {
        let vault_dir = config.resolved_vault_dir();
        let vault = VaultStore::open(&vault_dir)
            .with_context(|| format!("failed to open vault at {}", vault_dir.display()))?;
        let ledger = Ledger::new(config.resolved_ledger_dir());
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            vault: Arc::new(vault),
            gene: Arc::new(GeneAssistant::new(ledger.clone())),
            ledger: Arc::new(ledger),
            sync: Arc::new(VaultSync::new(&config.storage.sync)),
            config: Arc::new(config),
        })
    }

    /// Open the configured database and build state from it.
    pub fn from_config(config: AlchemyConfig) -> Result<Self> {
        let db_path = config.resolved_db_path();
        let conn = crate::db::open_database(&db_path)?;
        tracing::info!(db = %db_path.display(), "database ready");
        Self::new(config, conn)
    }

    /// Run `f` against the locked connection on the blocking pool.
    pub async fn with_db<T, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&mut Connection) -> AlchemyResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| ApiError::Internal(format!("db lock poisoned: {e}")))?;
            Ok(f(&mut *conn)?)
        })
        .await
    }
}

/// Run synchronous vault or file work on the blocking pool.
pub async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
}

/// Build the full application [`Router`] with CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/rituals",
            get(handlers::rituals::list).post(handlers::rituals::create),
        )
        .route(
            "/api/rituals/{id}",
            get(handlers::rituals::show)
                .put(handlers::rituals::update)
                .delete(handlers::rituals::remove),
        )
        .route(
            "/api/gene/rituals",
            get(handlers::rituals::list).post(handlers::rituals::create),
        )
        .route(
            "/api/gene/rituals_with_glyphs",
            get(handlers::rituals::with_glyphs),
        )
        .route("/api/gene/invoke", post(handlers::assistant::invoke))
        .route("/api/dream-loop", post(handlers::rituals::dream_loop))
        .route("/api/vault/glyphs", get(handlers::vault::glyphs))
        .route("/api/vault/glyphs/evolved", get(handlers::vault::evolved_glyphs))
        .route(
            "/api/vault/glyphs/ritual-generated",
            get(handlers::vault::ritual_generated_glyphs),
        )
        .route("/api/vault/metadata", get(handlers::vault::metadata))
        .route("/api/vault/stats", get(handlers::vault::stats))
        .route("/api/vault/sigils", get(handlers::vault::sigils))
        .route("/api/vault/sigils/{sigil}", get(handlers::vault::sigil))
        .route("/api/vault/diff", get(handlers::vault::diff))
        .route("/api/drift/status", get(handlers::drift::status))
        .route("/api/compress", post(handlers::text::compress))
        .route("/api/refine-script", post(handlers::text::refine))
        .route("/api/sync/vault", get(handlers::sync::run))
        .route("/api/sync/status", get(handlers::sync::status))
        .route("/api/sync/logs", get(handlers::sync::logs))
        .route("/api/assistant/respond", post(handlers::assistant::respond))
        .route("/api/assistant/status", get(handlers::assistant::status))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// CORS for the configured origins. Origins that are not valid header values
/// are skipped with a warning.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Serve the REST API until Ctrl-C.
pub async fn serve(config: AlchemyConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config)?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "Codex Alchemy API listening at http://{bind_addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down API server");
        })
        .await?;

    Ok(())
}
