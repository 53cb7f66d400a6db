//! Organizational placement API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mesa_core::{CreatePlacementRequest, Placement, PlacementUpdate};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::error::{not_found, record_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ListPlacementsResponse {
    pub collaborator_id: String,
    pub placements: Vec<Placement>,
}

pub async fn create_placement(
    State(state): State<Arc<AppState>>,
    Path(collaborator_id): Path<String>,
    Json(body): Json<CreatePlacementRequest>,
) -> Result<(StatusCode, Json<Placement>), ApiError> {
    let placement = state
        .placements()
        .create(&collaborator_id, body)
        .map_err(record_error)?;

    info!(id = %placement.id, contract_id = %placement.contract_id, "Placement added");
    Ok((StatusCode::CREATED, Json(placement)))
}

pub async fn list_placements(
    State(state): State<Arc<AppState>>,
    Path(collaborator_id): Path<String>,
) -> Result<Json<ListPlacementsResponse>, ApiError> {
    let placements = state
        .placements()
        .list(&collaborator_id)
        .map_err(record_error)?;
    Ok(Json(ListPlacementsResponse {
        collaborator_id,
        placements,
    }))
}

/// Placements that name the collaborator as supervisor
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    Path(collaborator_id): Path<String>,
) -> Result<Json<ListPlacementsResponse>, ApiError> {
    let placements = state
        .placements()
        .reports_of(&collaborator_id)
        .map_err(record_error)?;
    Ok(Json(ListPlacementsResponse {
        collaborator_id,
        placements,
    }))
}

pub async fn get_placement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Placement>, ApiError> {
    match state.placements().get(&id).map_err(record_error)? {
        Some(placement) => Ok(Json(placement)),
        None => Err(not_found(format!("Placement not found: {}", id))),
    }
}

pub async fn update_placement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<PlacementUpdate>,
) -> Result<Json<Placement>, ApiError> {
    let placement = state.placements().update(&id, body).map_err(record_error)?;
    Ok(Json(placement))
}

pub async fn delete_placement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Placement>, ApiError> {
    let placement = state.placements().delete(&id).map_err(record_error)?;
    Ok(Json(placement))
}
