//! Mapping of store errors to HTTP responses.

use axum::{http::StatusCode, Json};
use mesa_core::{CollaboratorError, RecordError, ReferenceError, RunError, TicketError};
use serde::Serialize;
use tracing::error;

use crate::metrics::TICKET_UPDATE_FAILURES_TOTAL;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable RUN failure kind (`format` or `checksum`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            kind: None,
        }),
    )
}

pub fn not_found(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::NOT_FOUND, message)
}

fn internal(message: String) -> ApiError {
    error!("Request failed: {}", message);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, message)
}

pub fn run_error(e: &RunError) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            error: e.to_string(),
            kind: Some(e.kind()),
        }),
    )
}

pub fn collaborator_error(e: CollaboratorError) -> ApiError {
    match e {
        CollaboratorError::NotFound(_) => not_found(e.to_string()),
        CollaboratorError::InvalidRun(ref run) => run_error(run),
        CollaboratorError::Duplicate { .. } => api_error(StatusCode::CONFLICT, e.to_string()),
        CollaboratorError::Invalid(_) => api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        CollaboratorError::Database(_) => internal(e.to_string()),
    }
}

pub fn ticket_error(e: TicketError) -> ApiError {
    match e {
        TicketError::NotFound(_) => not_found(e.to_string()),
        TicketError::InvalidReference { .. } | TicketError::Invalid(_) => {
            api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        TicketError::Persistence(_) => {
            TICKET_UPDATE_FAILURES_TOTAL.inc();
            internal(e.to_string())
        }
        TicketError::Database(_) => internal(e.to_string()),
    }
}

pub fn reference_error(e: ReferenceError) -> ApiError {
    match e {
        ReferenceError::NotFound { .. } => not_found(e.to_string()),
        ReferenceError::Duplicate { .. } | ReferenceError::InUse { .. } => {
            api_error(StatusCode::CONFLICT, e.to_string())
        }
        ReferenceError::Invalid(_) => api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        ReferenceError::Database(_) => internal(e.to_string()),
    }
}

pub fn record_error(e: RecordError) -> ApiError {
    match e {
        RecordError::NotFound { .. } => not_found(e.to_string()),
        RecordError::InvalidReference { .. } | RecordError::Invalid { .. } => {
            api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        RecordError::Conflict(_) => api_error(StatusCode::CONFLICT, e.to_string()),
        RecordError::Database(_) => internal(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesa_core::{validate_run, ReferenceKind, RunFormat};

    #[test]
    fn test_run_error_carries_kind() {
        let e = validate_run("12345678-9", RunFormat::Permissive).unwrap_err();
        let (status, Json(body)) = run_error(&e);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.kind, Some("checksum"));

        let e = validate_run("12.345.678-5", RunFormat::Strict).unwrap_err();
        let (_, Json(body)) = run_error(&e);
        assert_eq!(body.kind, Some("format"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ticket_error(TicketError::NotFound("x".to_string())).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ticket_error(TicketError::Persistence("disk full".to_string())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            collaborator_error(CollaboratorError::Duplicate {
                field: "RUN",
                value: "123456785".to_string()
            })
            .0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            reference_error(ReferenceError::InUse {
                kind: ReferenceKind::Stage,
                id: 1,
                count: 3
            })
            .0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            record_error(RecordError::InvalidReference {
                field: "bank_id",
                value: "7".to_string()
            })
            .0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            record_error(RecordError::Conflict("taken".to_string())).0,
            StatusCode::CONFLICT
        );
    }
}
