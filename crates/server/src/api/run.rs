//! Standalone RUN validation endpoint.

use axum::{extract::State, Json};
use mesa_core::{validate_run, RunFormat};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::metrics::RUN_VALIDATIONS_TOTAL;
use crate::state::AppState;

/// Request body for validating a RUN
#[derive(Debug, Deserialize)]
pub struct ValidateRunBody {
    pub value: String,
    /// Overrides the configured format for this request.
    pub format: Option<RunFormat>,
}

#[derive(Debug, Serialize)]
pub struct ValidateRunResponse {
    pub valid: bool,
    /// Compact normalized form, e.g. `123456785`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    /// Display form, e.g. `12.345.678-5`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// `format` or `checksum`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

/// Validate a RUN without storing anything.
///
/// Always answers 200; the outcome is in the body.
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValidateRunBody>,
) -> Json<ValidateRunResponse> {
    let format = body.format.unwrap_or_else(|| state.run_format());

    let response = match validate_run(&body.value, format) {
        Ok(run) => {
            RUN_VALIDATIONS_TOTAL.with_label_values(&["valid"]).inc();
            ValidateRunResponse {
                valid: true,
                formatted: Some(run.formatted()),
                run: Some(run.to_string()),
                error: None,
                kind: None,
            }
        }
        Err(e) => {
            RUN_VALIDATIONS_TOTAL.with_label_values(&[e.kind()]).inc();
            ValidateRunResponse {
                valid: false,
                run: None,
                formatted: None,
                error: Some(e.to_string()),
                kind: Some(e.kind()),
            }
        }
    };

    Json(response)
}
