//! Ticket data types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::reference::ReferenceKind;
use crate::serde_util::nullable;

/// A help-desk ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub subject: String,
    pub description: String,
    /// Collaborator who asked for the work.
    pub requester_id: String,
    /// Collaborator currently responsible for the ticket.
    pub assignee_id: String,
    /// Collaborator who signs off on the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator_id: Option<String>,
    /// Current stage (reference item of kind `stage`).
    pub stage_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_id: Option<i64>,
    pub priority_id: i64,
    pub ticket_type_id: i64,
    pub origin_id: i64,
    /// Affected software version, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Link to the affected resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Current value of a tracked field, as stored in history entries.
    pub fn tracked_value(&self, field: TrackedField) -> Option<String> {
        match field {
            TrackedField::Assignee => Some(self.assignee_id.clone()),
            TrackedField::Stage => Some(self.stage_id.to_string()),
            TrackedField::Difficulty => self.difficulty_id.map(|id| id.to_string()),
        }
    }
}

/// Fields whose every change is recorded in the ticket history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    Assignee,
    Stage,
    Difficulty,
}

impl TrackedField {
    pub const ALL: [TrackedField; 3] = [
        TrackedField::Assignee,
        TrackedField::Stage,
        TrackedField::Difficulty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedField::Assignee => "assignee",
            TrackedField::Stage => "stage",
            TrackedField::Difficulty => "difficulty",
        }
    }

    /// Reference kind the field's values point at, if any.
    pub fn reference_kind(&self) -> Option<ReferenceKind> {
        match self {
            TrackedField::Assignee => None,
            TrackedField::Stage => Some(ReferenceKind::Stage),
            TrackedField::Difficulty => Some(ReferenceKind::Difficulty),
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackedField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assignee" => Ok(TrackedField::Assignee),
            "stage" => Ok(TrackedField::Stage),
            "difficulty" => Ok(TrackedField::Difficulty),
            other => Err(format!("unknown tracked field: {}", other)),
        }
    }
}

/// One recorded transition of a tracked field. Never modified once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    pub ticket_id: String,
    pub field: TrackedField,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    /// Authenticated user that made the change.
    pub changed_by: Option<String>,
    pub changed_at: DateTime<Utc>,
    /// Free-text remark supplied with the update that produced this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A tracked field that differs between two versions of a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: TrackedField,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Request to create a ticket. Missing reference ids fall back to the first
/// configured item of their kind.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub description: String,
    pub requester_id: String,
    pub assignee_id: String,
    #[serde(default)]
    pub validator_id: Option<String>,
    #[serde(default)]
    pub stage_id: Option<i64>,
    #[serde(default)]
    pub difficulty_id: Option<i64>,
    #[serde(default)]
    pub priority_id: Option<i64>,
    #[serde(default)]
    pub ticket_type_id: Option<i64>,
    #[serde(default)]
    pub origin_id: Option<i64>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub url: Option<String>,
    /// Defaults to the creation time.
    #[serde(default)]
    pub requested_at: Option<DateTime<Utc>>,
}

impl CreateTicketRequest {
    pub fn new(
        subject: impl Into<String>,
        description: impl Into<String>,
        requester_id: impl Into<String>,
        assignee_id: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            description: description.into(),
            requester_id: requester_id.into(),
            assignee_id: assignee_id.into(),
            validator_id: None,
            stage_id: None,
            difficulty_id: None,
            priority_id: None,
            ticket_type_id: None,
            origin_id: None,
            version: None,
            due_date: None,
            url: None,
            requested_at: None,
        }
    }
}

/// Partial update of a ticket.
///
/// Absent fields are left untouched. For nullable fields, an explicit JSON
/// `null` clears the value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TicketUpdate {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub assignee_id: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub validator_id: Option<Option<String>>,
    pub stage_id: Option<i64>,
    #[serde(deserialize_with = "nullable")]
    pub difficulty_id: Option<Option<i64>>,
    pub priority_id: Option<i64>,
    pub ticket_type_id: Option<i64>,
    pub origin_id: Option<i64>,
    #[serde(deserialize_with = "nullable")]
    pub version: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "nullable")]
    pub url: Option<Option<String>>,
    /// Remark stored on every history entry this update writes. Not a field
    /// of the ticket itself.
    pub note: Option<String>,
}

impl TicketUpdate {
    /// Whether the update changes no field. The note does not count.
    pub fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.description.is_none()
            && self.assignee_id.is_none()
            && self.validator_id.is_none()
            && self.stage_id.is_none()
            && self.difficulty_id.is_none()
            && self.priority_id.is_none()
            && self.ticket_type_id.is_none()
            && self.origin_id.is_none()
            && self.version.is_none()
            && self.due_date.is_none()
            && self.url.is_none()
    }

    pub fn stage(stage_id: i64) -> Self {
        Self {
            stage_id: Some(stage_id),
            ..Default::default()
        }
    }

    pub fn assignee(assignee_id: impl Into<String>) -> Self {
        Self {
            assignee_id: Some(assignee_id.into()),
            ..Default::default()
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// A message posted on a ticket's thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketMessage {
    pub id: i64,
    pub ticket_id: String,
    /// Collaborator who wrote the message.
    pub author_id: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Request to post a message on a ticket.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessageRequest {
    pub author_id: String,
    pub subject: String,
    pub body: String,
}

impl CreateMessageRequest {
    pub fn new(
        author_id: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            author_id: author_id.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Result of a ticket update: the new ticket and the history it produced.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub ticket: Ticket,
    pub entries: Vec<HistoryEntry>,
}
