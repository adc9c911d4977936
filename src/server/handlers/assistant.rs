use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::assistant::{gene_invoke, AssistantContext, GeneInvocation, GeneResponse, GeneStatus};
use crate::server::extract::{ApiJson};
use crate::server::error::{ApiError, ApiResult};
use crate::server::{blocking, AppState};

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub prompt: String,
    #[serde(default)]
    pub context: AssistantContext,
}

#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    pub prompt: String,
}

/// `POST /api/assistant/respond`
pub async fn respond(State(state): State<AppState>, ApiJson(req): ApiJson<RespondRequest>) -> ApiResult<Json<GeneResponse>> {
    if req.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".into()));
    }
    let gene = state.gene.clone();
    let reply = blocking(move || Ok(gene.respond(&req.prompt, &req.context))).await?;
    Ok(Json(reply))
}

pub async fn status(State(state): State<AppState>) -> ApiResult<Json<GeneStatus>> {
    let gene = state.gene.clone();
    let status = blocking(move || Ok(gene.status()?)).await?;
    Ok(Json(status))
}

/// `POST /api/gene/invoke`
pub async fn invoke(ApiJson(req): ApiJson<InvokeRequest>) -> Json<GeneInvocation> {
    tracing::info!(prompt = %req.prompt, "gene invoked");
    Json(gene_invoke(&req.prompt))
}
