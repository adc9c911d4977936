use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::records::{self, NewRitual, Ritual, RitualUpdate, RitualWithGlyphs};
use crate::rituals::DreamLoopReport;
use crate::server::extract::{ApiJson, ApiPath};
use crate::server::error::ApiResult;
use crate::server::{blocking, AppState};

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Ritual>>> {
    let rituals = state.with_db(|conn| records::list_rituals(conn)).await?;
    Ok(Json(rituals))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewRitual>,
) -> ApiResult<(StatusCode, Json<Ritual>)> {
    let ritual = state.with_db(move |conn| records::create_ritual(conn, &new)).await?;
    tracing::info!(id = ritual.id, name = %ritual.name, "ritual created");
    Ok((StatusCode::CREATED, Json(ritual)))
}

pub async fn show(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Ritual>> {
    let ritual = state.with_db(move |conn| records::get_ritual(conn, id)).await?;
    Ok(Json(ritual))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<RitualUpdate>,
) -> ApiResult<Json<Ritual>> {
    let ritual = state
        .with_db(move |conn| records::update_ritual(conn, id, &update))
        .await?;
    Ok(Json(ritual))
}

pub async fn remove(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<StatusCode> {
    state.with_db(move |conn| records::delete_ritual(conn, id)).await?;
    tracing::info!(id, "ritual deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn with_glyphs(State(state): State<AppState>) -> ApiResult<Json<Vec<RitualWithGlyphs>>> {
    let rituals = state
        .with_db(|conn| records::list_rituals_with_glyphs(conn))
        .await?;
    Ok(Json(rituals))
}

/// `POST /api/dream-loop`
pub async fn dream_loop(State(state): State<AppState>) -> ApiResult<Json<DreamLoopReport>> {
    let vault = state.vault.clone();
    let report = blocking(move || {
        let mut rng = rand::rng();
        Ok(crate::rituals::dream_loop(&vault, &mut rng)?)
    })
    .await?;
    Ok(Json(report))
}
