//! Route handlers, grouped by the part of the system they expose.

pub mod assistant;
pub mod drift;
pub mod rituals;
pub mod sync;
pub mod text;
pub mod vault;

use axum::Json;
use serde_json::{json, Value};

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
