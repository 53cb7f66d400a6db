//! Collaborator API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use mesa_core::{
    validate_run, Collaborator, CollaboratorFilter, CollaboratorUpdate, CreateCollaboratorRequest,
    RunFormat,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::{collaborator_error, not_found, ApiError};
use crate::state::AppState;

/// Maximum allowed limit for collaborator queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for collaborator queries
const DEFAULT_LIMIT: i64 = 100;

/// Query parameters for listing collaborators
#[derive(Debug, Deserialize)]
pub struct ListCollaboratorsParams {
    /// Filter by RUN, in any accepted notation
    pub run: Option<String>,
    pub email: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CollaboratorResponse {
    pub id: String,
    pub run: String,
    /// RUN with thousands separators and hyphen, for display.
    pub formatted_run: String,
    pub email: String,
    pub full_name: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub birth_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landline_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
    pub hire_date: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Collaborator> for CollaboratorResponse {
    fn from(c: Collaborator) -> Self {
        // Stored RUNs are always compact and valid
        let formatted_run = validate_run(&c.run, RunFormat::Strict)
            .map(|run| run.formatted())
            .unwrap_or_else(|_| c.run.clone());
        let full_name = c.full_name();

        Self {
            id: c.id,
            run: c.run,
            formatted_run,
            email: c.email,
            full_name,
            first_name: c.first_name,
            middle_name: c.middle_name,
            paternal_surname: c.paternal_surname,
            maternal_surname: c.maternal_surname,
            birth_date: c.birth_date,
            address: c.address,
            landline_phone: c.landline_phone,
            mobile_phone: c.mobile_phone,
            hire_date: c.hire_date,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListCollaboratorsResponse {
    pub collaborators: Vec<CollaboratorResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Register a collaborator
pub async fn create_collaborator(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateCollaboratorRequest>,
) -> Result<(StatusCode, Json<CollaboratorResponse>), ApiError> {
    let collaborator = state
        .collaborators()
        .create(body)
        .map_err(collaborator_error)?;

    info!(id = %collaborator.id, "Collaborator registered");
    Ok((StatusCode::CREATED, Json(collaborator.into())))
}

/// Get a collaborator by ID
pub async fn get_collaborator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CollaboratorResponse>, ApiError> {
    match state.collaborators().get(&id).map_err(collaborator_error)? {
        Some(collaborator) => Ok(Json(collaborator.into())),
        None => Err(not_found(format!("Collaborator not found: {}", id))),
    }
}

/// List collaborators with optional filters
pub async fn list_collaborators(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListCollaboratorsParams>,
) -> Result<Json<ListCollaboratorsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = CollaboratorFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref run) = params.run {
        filter = filter.with_run(run);
    }

    if let Some(ref email) = params.email {
        filter = filter.with_email(email);
    }

    let collaborators = state
        .collaborators()
        .list(&filter)
        .map_err(collaborator_error)?;
    let total = state
        .collaborators()
        .count(&filter)
        .map_err(collaborator_error)?;

    Ok(Json(ListCollaboratorsResponse {
        collaborators: collaborators.into_iter().map(Into::into).collect(),
        total,
        limit,
        offset,
    }))
}

/// Partially update a collaborator
pub async fn update_collaborator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CollaboratorUpdate>,
) -> Result<Json<CollaboratorResponse>, ApiError> {
    let collaborator = state
        .collaborators()
        .update(&id, body)
        .map_err(collaborator_error)?;
    Ok(Json(collaborator.into()))
}

/// Remove a collaborator together with their tickets
pub async fn delete_collaborator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CollaboratorResponse>, ApiError> {
    let collaborator = state
        .collaborators()
        .delete(&id)
        .map_err(collaborator_error)?;

    info!(id = %collaborator.id, "Collaborator removed");
    Ok(Json(collaborator.into()))
}
