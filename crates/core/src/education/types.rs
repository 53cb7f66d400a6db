//! Education data types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EducationRecord {
    pub id: String,
    pub collaborator_id: String,
    pub education_type_id: i64,
    pub career_id: i64,
    pub education_status_id: i64,
    pub institution_id: i64,
    /// Completion date, or the expected one while still in progress.
    pub completion_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEducationRequest {
    pub education_type_id: i64,
    pub career_id: i64,
    pub education_status_id: i64,
    pub institution_id: i64,
    pub completion_date: NaiveDate,
}

/// Partial update of an education record. Every field is required on the
/// record, so there is nothing to clear.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EducationUpdate {
    pub education_type_id: Option<i64>,
    pub career_id: Option<i64>,
    pub education_status_id: Option<i64>,
    pub institution_id: Option<i64>,
    pub completion_date: Option<NaiveDate>,
}

impl EducationUpdate {
    pub fn is_empty(&self) -> bool {
        self.education_type_id.is_none()
            && self.career_id.is_none()
            && self.education_status_id.is_none()
            && self.institution_id.is_none()
            && self.completion_date.is_none()
    }
}
