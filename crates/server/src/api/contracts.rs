//! Contract API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mesa_core::{Contract, ContractUpdate, CreateContractRequest, Placement};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::error::{not_found, record_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ListContractsResponse {
    pub collaborator_id: String,
    pub contracts: Vec<Contract>,
}

/// Add a contract to a collaborator
pub async fn create_contract(
    State(state): State<Arc<AppState>>,
    Path(collaborator_id): Path<String>,
    Json(body): Json<CreateContractRequest>,
) -> Result<(StatusCode, Json<Contract>), ApiError> {
    let contract = state
        .contracts()
        .create(&collaborator_id, body)
        .map_err(record_error)?;

    info!(id = %contract.id, collaborator_id = %collaborator_id, "Contract added");
    Ok((StatusCode::CREATED, Json(contract)))
}

/// List a collaborator's contracts, most recent first
pub async fn list_contracts(
    State(state): State<Arc<AppState>>,
    Path(collaborator_id): Path<String>,
) -> Result<Json<ListContractsResponse>, ApiError> {
    let contracts = state
        .contracts()
        .list(&collaborator_id)
        .map_err(record_error)?;
    Ok(Json(ListContractsResponse {
        collaborator_id,
        contracts,
    }))
}

pub async fn get_contract(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Contract>, ApiError> {
    match state.contracts().get(&id).map_err(record_error)? {
        Some(contract) => Ok(Json(contract)),
        None => Err(not_found(format!("Contract not found: {}", id))),
    }
}

pub async fn update_contract(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ContractUpdate>,
) -> Result<Json<Contract>, ApiError> {
    let contract = state.contracts().update(&id, body).map_err(record_error)?;
    Ok(Json(contract))
}

/// Remove a contract together with its placement
pub async fn delete_contract(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Contract>, ApiError> {
    let contract = state.contracts().delete(&id).map_err(record_error)?;

    info!(id = %contract.id, "Contract removed");
    Ok(Json(contract))
}

/// Placement attached to a contract
pub async fn get_contract_placement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Placement>, ApiError> {
    match state.placements().for_contract(&id).map_err(record_error)? {
        Some(placement) => Ok(Json(placement)),
        None => Err(not_found(format!("Contract {} has no placement", id))),
    }
}
