use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::glyph::Glyph;
use crate::records::{self, GlyphType, SigilMetadata, VaultStats};
use crate::server::extract::{ApiPath, ApiQuery};
use crate::server::error::{ApiError, ApiResult};
use crate::server::{blocking, AppState};
use crate::vault::SigilDiff;

#[derive(Debug, Deserialize)]
pub struct GlyphQuery {
    pub glyph_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    pub sigil: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DiffQuery {
    pub a: String,
    pub b: String,
}

/// Database glyph as exposed over HTTP.
#[derive(Debug, Serialize)]
pub struct GlyphSummary {
    pub name: String,
    pub vector: Vec<f64>,
    pub hash: Option<String>,
}

async fn glyphs_of(state: &AppState, glyph_type: Option<GlyphType>) -> ApiResult<Json<Vec<GlyphSummary>>> {
    let rows = state
        .with_db(move |conn| records::list_glyphs(conn, glyph_type))
        .await?;
    Ok(Json(
        rows.into_iter()
            .map(|g| GlyphSummary {
                name: g.name,
                vector: g.vector,
                hash: g.hash,
            })
            .collect(),
    ))
}

/// `GET /api/vault/glyphs?glyph_type=`
pub async fn glyphs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<GlyphQuery>,
) -> ApiResult<Json<Vec<GlyphSummary>>> {
    let glyph_type = query
        .glyph_type
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<GlyphType>())
        .transpose()
        .map_err(ApiError::BadRequest)?;
    glyphs_of(&state, glyph_type).await
}

pub async fn evolved_glyphs(State(state): State<AppState>) -> ApiResult<Json<Vec<GlyphSummary>>> {
    glyphs_of(&state, Some(GlyphType::Evolved)).await
}

pub async fn ritual_generated_glyphs(State(state): State<AppState>) -> ApiResult<Json<Vec<GlyphSummary>>> {
    glyphs_of(&state, Some(GlyphType::RitualGenerated)).await
}

pub async fn metadata(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MetadataQuery>,
) -> ApiResult<Json<SigilMetadata>> {
    let meta = state
        .with_db(move |conn| records::get_metadata(conn, query.sigil.as_deref()))
        .await?;
    Ok(Json(meta))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<VaultStats>> {
    let stats = state.with_db(|conn| records::vault_stats(conn)).await?;
    Ok(Json(stats))
}

/// `GET /api/vault/sigils`: flat-file sigil names.
pub async fn sigils(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let vault = state.vault.clone();
    let names = blocking(move || Ok(vault.list_sigils()?)).await?;
    Ok(Json(names))
}

pub async fn sigil(State(state): State<AppState>, ApiPath(sigil): ApiPath<String>) -> ApiResult<Json<Vec<Glyph>>> {
    let vault = state.vault.clone();
    let glyphs = blocking(move || Ok(vault.restore(&sigil)?)).await?;
    Ok(Json(glyphs))
}

/// `GET /api/vault/diff?a=&b=`
pub async fn diff(State(state): State<AppState>, ApiQuery(query): ApiQuery<DiffQuery>) -> ApiResult<Json<SigilDiff>> {
    if query.a.trim().is_empty() || query.b.trim().is_empty() {
        return Err(ApiError::BadRequest("both 'a' and 'b' sigils are required".into()));
    }
    let vault = state.vault.clone();
    let diff = blocking(move || Ok(vault.diff(&query.a, &query.b)?)).await?;
    Ok(Json(diff))
}
