use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::server::extract::{ApiQuery};
use crate::server::error::ApiResult;
use crate::server::{blocking, AppState};
use crate::sync::{SyncLogs, SyncStatus, DEFAULT_LOG_LIMIT};

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

/// `GET /api/sync/vault`
pub async fn run(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let sync = state.sync.clone();
    let report = blocking(move || Ok(sync.sync_vaults())).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Vault synchronization completed",
        "data": report,
    })))
}

pub async fn status(State(state): State<AppState>) -> ApiResult<Json<SyncStatus>> {
    let sync = state.sync.clone();
    let status = blocking(move || Ok(sync.status()?)).await?;
    Ok(Json(status))
}

pub async fn logs(State(state): State<AppState>, ApiQuery(query): ApiQuery<LogsQuery>) -> ApiResult<Json<SyncLogs>> {
    let sync = state.sync.clone();
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    let logs = blocking(move || Ok(sync.logs(limit)?)).await?;
    Ok(Json(logs))
}
