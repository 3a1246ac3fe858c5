//! Case listing and lookup. Read-only: cases are never modified over HTTP.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::Case;

/// `GET /cases` — all cases, newest first.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Case>>, ApiError> {
    let store = ctx.store().clone();
    let cases = tokio::task::spawn_blocking(move || store.list()).await??;
    Ok(Json(cases))
}

/// `GET /cases/:id` — one case by identifier.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<Case>, ApiError> {
    let store = ctx.store().clone();
    let case = tokio::task::spawn_blocking(move || store.get(id)).await??;
    case.map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Case {id} not found")))
}
