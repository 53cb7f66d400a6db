//! Education record API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mesa_core::{CreateEducationRequest, EducationRecord, EducationUpdate};
use serde::Serialize;
use std::sync::Arc;

use super::error::{not_found, record_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ListEducationResponse {
    pub collaborator_id: String,
    pub education: Vec<EducationRecord>,
}

pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Path(collaborator_id): Path<String>,
    Json(body): Json<CreateEducationRequest>,
) -> Result<(StatusCode, Json<EducationRecord>), ApiError> {
    let record = state
        .education()
        .create(&collaborator_id, body)
        .map_err(record_error)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Path(collaborator_id): Path<String>,
) -> Result<Json<ListEducationResponse>, ApiError> {
    let education = state
        .education()
        .list(&collaborator_id)
        .map_err(record_error)?;
    Ok(Json(ListEducationResponse {
        collaborator_id,
        education,
    }))
}

pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EducationRecord>, ApiError> {
    match state.education().get(&id).map_err(record_error)? {
        Some(record) => Ok(Json(record)),
        None => Err(not_found(format!("Education record not found: {}", id))),
    }
}

pub async fn update_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<EducationUpdate>,
) -> Result<Json<EducationRecord>, ApiError> {
    let record = state.education().update(&id, body).map_err(record_error)?;
    Ok(Json(record))
}

pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EducationRecord>, ApiError> {
    let record = state.education().delete(&id).map_err(record_error)?;
    Ok(Json(record))
}
