use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::drift::{detect_sigil_drift, DriftReport};
use crate::server::extract::{ApiQuery};
use crate::server::error::ApiResult;
use crate::server::{blocking, AppState};

#[derive(Debug, Deserialize)]
pub struct DriftQuery {
    #[serde(default = "default_sigil")]
    pub sigil: String,
}

fn default_sigil() -> String {
    "default".to_string()
}

/// `GET /api/drift/status?sigil=`
pub async fn status(State(state): State<AppState>, ApiQuery(query): ApiQuery<DriftQuery>) -> ApiResult<Json<DriftReport>> {
    let vault = state.vault.clone();
    let config = state.config.drift.clone();
    let report = blocking(move || {
        let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
        Ok(detect_sigil_drift(&vault, &query.sigil, now, &config)?)
    })
    .await?;
    tracing::debug!(total = report.total, drifted = report.drifted.len(), "drift scan complete");
    Ok(Json(report))
}
