use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::compress::{compress_and_teach, reduce_prompt, Compression, CompressionProfile};
use crate::rituals::refine::{refine_script, Feedback};
use crate::server::extract::{ApiJson};
use crate::server::error::{ApiError, ApiResult};
use crate::server::{blocking, AppState};

#[derive(Debug, Deserialize)]
pub struct CompressRequest {
    pub text: String,
    #[serde(default)]
    pub profile: CompressionProfile,
    pub max_length: Option<usize>,
    /// When set, the result is also recorded as a `train` ledger entry.
    pub teach: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    pub script: String,
    #[serde(default)]
    pub feedback: Feedback,
}

#[derive(Debug, Serialize)]
pub struct RefineResponse {
    pub refined_script: String,
}

/// `POST /api/compress`
pub async fn compress(State(state): State<AppState>, ApiJson(req): ApiJson<CompressRequest>) -> ApiResult<Json<Compression>> {
    let max_length = req.max_length.unwrap_or(state.config.compression.max_length);
    if max_length == 0 {
        return Err(ApiError::BadRequest("max_length must be positive".into()));
    }

    let result = match req.teach {
        Some(label) => {
            let ledger = state.ledger.clone();
            blocking(move || Ok(compress_and_teach(&req.text, &label, max_length, &ledger)?)).await?
        }
        None => reduce_prompt(&req.text, req.profile, max_length),
    };
    Ok(Json(result))
}

/// `POST /api/refine-script`
pub async fn refine(ApiJson(req): ApiJson<RefineRequest>) -> ApiResult<Json<RefineResponse>> {
    Ok(Json(RefineResponse {
        refined_script: refine_script(&req.script, &req.feedback),
    }))
}
