//! Activity log API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use mesa_core::{Activity, ActivityFilter, ActivityUpdate, CreateActivityRequest};
use serde::Serialize;
use std::sync::Arc;

use super::error::{api_error, not_found, record_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    #[serde(flatten)]
    pub activity: Activity,
    /// Minutes between start and end, once the activity has ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
}

impl From<Activity> for ActivityResponse {
    fn from(activity: Activity) -> Self {
        let duration_minutes = activity.duration().map(|d| d.num_minutes());
        Self {
            activity,
            duration_minutes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListActivitiesResponse {
    pub collaborator_id: String,
    pub activities: Vec<ActivityResponse>,
    /// Sum over the ended activities in the list.
    pub total_minutes: i64,
}

pub async fn create_activity(
    State(state): State<Arc<AppState>>,
    Path(collaborator_id): Path<String>,
    Json(body): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<ActivityResponse>), ApiError> {
    let activity = state
        .activities()
        .create(&collaborator_id, body)
        .map_err(record_error)?;
    Ok((StatusCode::CREATED, Json(activity.into())))
}

/// List a collaborator's activities, optionally within `from`..=`to`
pub async fn list_activities(
    State(state): State<Arc<AppState>>,
    Path(collaborator_id): Path<String>,
    Query(filter): Query<ActivityFilter>,
) -> Result<Json<ListActivitiesResponse>, ApiError> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "from must not be after to",
            ));
        }
    }

    let activities: Vec<ActivityResponse> = state
        .activities()
        .list(&collaborator_id, &filter)
        .map_err(record_error)?
        .into_iter()
        .map(Into::into)
        .collect();
    let total_minutes = activities
        .iter()
        .filter_map(|a| a.duration_minutes)
        .sum();

    Ok(Json(ListActivitiesResponse {
        collaborator_id,
        activities,
        total_minutes,
    }))
}

pub async fn get_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ActivityResponse>, ApiError> {
    match state.activities().get(&id).map_err(record_error)? {
        Some(activity) => Ok(Json(activity.into())),
        None => Err(not_found(format!("Activity not found: {}", id))),
    }
}

pub async fn update_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ActivityUpdate>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let activity = state.activities().update(&id, body).map_err(record_error)?;
    Ok(Json(activity.into()))
}

pub async fn delete_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let activity = state.activities().delete(&id).map_err(record_error)?;
    Ok(Json(activity.into()))
}
