//! Reference data API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mesa_core::{CreateReferenceRequest, ReferenceItem, ReferenceKind, ReferenceUpdate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::error::{not_found, reference_error, ApiError};
use crate::state::AppState;

/// Request body for creating a reference item
#[derive(Debug, Deserialize)]
pub struct ReferenceItemBody {
    pub name: String,
    pub value: Option<i64>,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListReferenceResponse {
    pub kind: ReferenceKind,
    pub items: Vec<ReferenceItem>,
}

fn parse_kind(kind: &str) -> Result<ReferenceKind, ApiError> {
    kind.parse::<ReferenceKind>().map_err(not_found)
}

/// Refresh failures are logged; the write itself already succeeded.
fn refresh_cache(state: &AppState) {
    if let Err(e) = state.refresh_reference_cache() {
        warn!("Failed to refresh reference cache: {}", e);
    }
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<ListReferenceResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let items = state.references().list(kind).map_err(reference_error)?;
    Ok(Json(ListReferenceResponse { kind, items }))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<ReferenceItem>, ApiError> {
    let kind = parse_kind(&kind)?;
    match state.references().get(kind, id).map_err(reference_error)? {
        Some(item) => Ok(Json(item)),
        None => Err(not_found(format!("{} {} not found", kind, id))),
    }
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Json(body): Json<ReferenceItemBody>,
) -> Result<(StatusCode, Json<ReferenceItem>), ApiError> {
    let kind = parse_kind(&kind)?;
    let item = state
        .references()
        .create(CreateReferenceRequest {
            kind,
            name: body.name,
            value: body.value,
            parent_id: body.parent_id,
        })
        .map_err(reference_error)?;

    refresh_cache(&state);
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, i64)>,
    Json(body): Json<ReferenceUpdate>,
) -> Result<Json<ReferenceItem>, ApiError> {
    let kind = parse_kind(&kind)?;
    let item = state
        .references()
        .update(kind, id, body)
        .map_err(reference_error)?;

    refresh_cache(&state);
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<ReferenceItem>, ApiError> {
    let kind = parse_kind(&kind)?;
    let item = state
        .references()
        .delete(kind, id)
        .map_err(reference_error)?;

    refresh_cache(&state);
    Ok(Json(item))
}
