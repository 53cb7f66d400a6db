//! Ticket API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use mesa_core::{
    initial_value, value_at, CreateMessageRequest, CreateTicketRequest, HistoryEntry,
    ReferenceCache, ReferenceKind, Ticket, TicketFilter, TicketMessage, TicketUpdate, TrackedField,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{api_error, not_found, ticket_error, ApiError};
use super::middleware::AuthUser;
use crate::metrics::{TICKETS_CREATED_TOTAL, TICKET_HISTORY_ENTRIES_TOTAL};
use crate::state::AppState;

/// Maximum allowed limit for ticket queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for ticket queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing tickets
#[derive(Debug, Deserialize)]
pub struct ListTicketsParams {
    /// Filter by stage ID
    pub stage_id: Option<i64>,
    /// Filter by stage name (resolved through the reference cache)
    pub stage: Option<String>,
    pub assignee_id: Option<String>,
    pub requester_id: Option<String>,
    /// Maximum number of tickets to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Query parameters for reading ticket history
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Also reconstruct the tracked fields as they were at this instant.
    pub at: Option<DateTime<Utc>>,
}

/// Response for ticket operations
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: String,
    pub subject: String,
    pub description: String,
    pub requester_id: String,
    pub assignee_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator_id: Option<String>,
    pub stage_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    pub priority_id: i64,
    pub ticket_type_id: i64,
    pub origin_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub requested_at: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TicketResponse {
    fn new(ticket: Ticket, cache: &ReferenceCache) -> Self {
        Self {
            stage: cache.name_of(ReferenceKind::Stage, ticket.stage_id),
            difficulty: ticket
                .difficulty_id
                .and_then(|id| cache.name_of(ReferenceKind::Difficulty, id)),
            id: ticket.id,
            subject: ticket.subject,
            description: ticket.description,
            requester_id: ticket.requester_id,
            assignee_id: ticket.assignee_id,
            validator_id: ticket.validator_id,
            stage_id: ticket.stage_id,
            difficulty_id: ticket.difficulty_id,
            priority_id: ticket.priority_id,
            ticket_type_id: ticket.ticket_type_id,
            origin_id: ticket.origin_id,
            version: ticket.version,
            due_date: ticket.due_date,
            url: ticket.url,
            requested_at: ticket.requested_at.to_rfc3339(),
            created_at: ticket.created_at.to_rfc3339(),
            updated_at: ticket.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing tickets
#[derive(Debug, Serialize)]
pub struct ListTicketsResponse {
    pub tickets: Vec<TicketResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for a ticket update
#[derive(Debug, Serialize)]
pub struct UpdateTicketResponse {
    pub ticket: TicketResponse,
    /// History entries written by this update.
    pub changes: Vec<HistoryEntryResponse>,
}

/// A history entry with reference IDs resolved to names
#[derive(Debug, Serialize)]
pub struct HistoryEntryResponse {
    pub id: i64,
    pub field: TrackedField,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_label: Option<String>,
    pub changed_by: Option<String>,
    pub changed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl HistoryEntryResponse {
    fn new(entry: HistoryEntry, cache: &ReferenceCache) -> Self {
        Self {
            old_label: label(cache, entry.field, entry.old_value.as_deref()),
            new_label: label(cache, entry.field, entry.new_value.as_deref()),
            id: entry.id,
            field: entry.field,
            old_value: entry.old_value,
            new_value: entry.new_value,
            changed_by: entry.changed_by,
            changed_at: entry.changed_at.to_rfc3339(),
            note: entry.note,
        }
    }
}

/// Tracked fields as they stood at a past instant
#[derive(Debug, Serialize)]
pub struct TrackedSnapshot {
    pub at: String,
    pub assignee_id: Option<String>,
    pub stage_id: Option<String>,
    pub stage: Option<String>,
    pub difficulty_id: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListMessagesResponse {
    pub ticket_id: String,
    pub messages: Vec<TicketMessage>,
}

#[derive(Debug, Serialize)]
pub struct TicketHistoryResponse {
    pub ticket_id: String,
    pub entries: Vec<HistoryEntryResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<TrackedSnapshot>,
}

/// Name of the reference item a stored value points at, for reference fields.
fn label(cache: &ReferenceCache, field: TrackedField, value: Option<&str>) -> Option<String> {
    let kind = field.reference_kind()?;
    let id = value?.parse::<i64>().ok()?;
    cache.name_of(kind, id)
}

fn snapshot(
    ticket: &Ticket,
    entries: &[HistoryEntry],
    at: DateTime<Utc>,
    cache: &ReferenceCache,
) -> TrackedSnapshot {
    let field_at = |field: TrackedField| {
        let initial = initial_value(entries, field, ticket.tracked_value(field));
        value_at(initial, entries, field, at)
    };

    let stage_id = field_at(TrackedField::Stage);
    let difficulty_id = field_at(TrackedField::Difficulty);

    TrackedSnapshot {
        at: at.to_rfc3339(),
        assignee_id: field_at(TrackedField::Assignee),
        stage: label(cache, TrackedField::Stage, stage_id.as_deref()),
        difficulty: label(cache, TrackedField::Difficulty, difficulty_id.as_deref()),
        stage_id,
        difficulty_id,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new ticket
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<TicketResponse>), ApiError> {
    let ticket = state.tickets().create(body).map_err(ticket_error)?;
    TICKETS_CREATED_TOTAL.inc();

    Ok((
        StatusCode::CREATED,
        Json(TicketResponse::new(ticket, state.reference_cache())),
    ))
}

/// Get a ticket by ID
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TicketResponse>, ApiError> {
    match state.tickets().get(&id).map_err(ticket_error)? {
        Some(ticket) => Ok(Json(TicketResponse::new(ticket, state.reference_cache()))),
        None => Err(not_found(format!("Ticket not found: {}", id))),
    }
}

/// List tickets with optional filters
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTicketsParams>,
) -> Result<Json<ListTicketsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = TicketFilter::new().with_limit(limit).with_offset(offset);

    if let Some(stage_id) = params.stage_id {
        filter = filter.with_stage(stage_id);
    } else if let Some(ref name) = params.stage {
        let stage = state
            .reference_cache()
            .find_by_name(ReferenceKind::Stage, name)
            .ok_or_else(|| {
                api_error(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("Unknown stage: {}", name),
                )
            })?;
        filter = filter.with_stage(stage.id);
    }

    if let Some(ref assignee_id) = params.assignee_id {
        filter = filter.with_assignee(assignee_id);
    }

    if let Some(ref requester_id) = params.requester_id {
        filter = filter.with_requester(requester_id);
    }

    let tickets = state.tickets().list(&filter).map_err(ticket_error)?;
    let total = state.tickets().count(&filter).map_err(ticket_error)?;

    let cache = state.reference_cache();
    Ok(Json(ListTicketsResponse {
        tickets: tickets
            .into_iter()
            .map(|ticket| TicketResponse::new(ticket, cache))
            .collect(),
        total,
        limit,
        offset,
    }))
}

/// Apply a partial update, recording history for tracked fields
pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<TicketUpdate>,
) -> Result<Json<UpdateTicketResponse>, ApiError> {
    let outcome = state
        .tickets()
        .update(&id, body, user.actor())
        .map_err(ticket_error)?;

    for entry in &outcome.entries {
        TICKET_HISTORY_ENTRIES_TOTAL
            .with_label_values(&[entry.field.as_str()])
            .inc();
    }

    let cache = state.reference_cache();
    Ok(Json(UpdateTicketResponse {
        ticket: TicketResponse::new(outcome.ticket, cache),
        changes: outcome
            .entries
            .into_iter()
            .map(|entry| HistoryEntryResponse::new(entry, cache))
            .collect(),
    }))
}

/// Full change history of a ticket, oldest first
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<TicketHistoryResponse>, ApiError> {
    let ticket = state
        .tickets()
        .get(&id)
        .map_err(ticket_error)?
        .ok_or_else(|| not_found(format!("Ticket not found: {}", id)))?;
    let entries = state.tickets().history(&id).map_err(ticket_error)?;
    let cache = state.reference_cache();

    let snapshot = match params.at {
        Some(at) if at < ticket.created_at => {
            return Err(api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Ticket {} did not exist at {}", id, at.to_rfc3339()),
            ));
        }
        Some(at) => Some(snapshot(&ticket, &entries, at, cache)),
        None => None,
    };

    Ok(Json(TicketHistoryResponse {
        ticket_id: ticket.id,
        entries: entries
            .into_iter()
            .map(|entry| HistoryEntryResponse::new(entry, cache))
            .collect(),
        snapshot,
    }))
}

/// Messages posted on a ticket, oldest first
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ListMessagesResponse>, ApiError> {
    let messages = state.tickets().messages(&id).map_err(ticket_error)?;
    Ok(Json(ListMessagesResponse {
        ticket_id: id,
        messages,
    }))
}

/// Post a message on a ticket
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<TicketMessage>), ApiError> {
    let message = state
        .tickets()
        .add_message(&id, body)
        .map_err(ticket_error)?;
    Ok((StatusCode::CREATED, Json(message)))
}
