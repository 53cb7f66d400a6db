//! Activity log data types.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_util::nullable;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: String,
    pub collaborator_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// Unset while the activity is still open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    pub activity_type_id: i64,
    pub project_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    /// Time spent, once the activity has ended.
    pub fn duration(&self) -> Option<TimeDelta> {
        self.end_time.map(|end| end - self.start_time)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateActivityRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    pub activity_type_id: i64,
    pub project_id: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update of an activity. An explicit `null` clears the end time or
/// the notes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivityUpdate {
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    #[serde(deserialize_with = "nullable")]
    pub end_time: Option<Option<NaiveTime>>,
    pub activity_type_id: Option<i64>,
    pub project_id: Option<i64>,
    #[serde(deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl ActivityUpdate {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.activity_type_id.is_none()
            && self.project_id.is_none()
            && self.notes.is_none()
    }
}

/// Inclusive date range for listing activities.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub project_id: Option<i64>,
}
