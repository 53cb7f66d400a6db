//! Ticket storage trait and types.

use std::fmt;

use super::{
    CreateMessageRequest, CreateTicketRequest, HistoryEntry, Ticket, TicketMessage, TicketUpdate,
    UpdateOutcome,
};

/// Error type for ticket operations.
#[derive(Debug)]
pub enum TicketError {
    /// Ticket not found.
    NotFound(String),
    /// A referenced collaborator or reference item does not exist.
    InvalidReference { field: &'static str, value: String },
    /// A field failed validation.
    Invalid(String),
    /// Writing the update or its history failed; nothing was applied.
    Persistence(String),
    /// Database error.
    Database(String),
}

impl fmt::Display for TicketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketError::NotFound(id) => write!(f, "Ticket not found: {}", id),
            TicketError::InvalidReference { field, value } => {
                write!(f, "Invalid {}: {} does not exist", field, value)
            }
            TicketError::Invalid(msg) => write!(f, "Invalid ticket: {}", msg),
            TicketError::Persistence(msg) => {
                write!(f, "Ticket update was not applied: {}", msg)
            }
            TicketError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for TicketError {}

/// Filter for querying tickets.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    /// Filter by stage.
    pub stage_id: Option<i64>,
    /// Filter by assignee.
    pub assignee_id: Option<String>,
    /// Filter by requester.
    pub requester_id: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl TicketFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            limit: 100,
            ..Default::default()
        }
    }

    pub fn with_stage(mut self, stage_id: i64) -> Self {
        self.stage_id = Some(stage_id);
        self
    }

    pub fn with_assignee(mut self, assignee_id: impl Into<String>) -> Self {
        self.assignee_id = Some(assignee_id.into());
        self
    }

    pub fn with_requester(mut self, requester_id: impl Into<String>) -> Self {
        self.requester_id = Some(requester_id.into());
        self
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for ticket storage backends.
///
/// Implementations must record one [`HistoryEntry`] per changed tracked field
/// in the same atomic write as the change itself.
pub trait TicketStore: Send + Sync {
    /// Create a new ticket. Creation is not recorded in the history.
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError>;

    /// Get a ticket by ID.
    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError>;

    /// List tickets matching the filter, newest first.
    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError>;

    /// Count tickets matching the filter.
    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError>;

    /// Apply a partial update on behalf of `actor`.
    fn update(
        &self,
        id: &str,
        update: TicketUpdate,
        actor: Option<&str>,
    ) -> Result<UpdateOutcome, TicketError>;

    /// History of a ticket, oldest first.
    fn history(&self, id: &str) -> Result<Vec<HistoryEntry>, TicketError>;

    /// Post a message on a ticket's thread.
    fn add_message(
        &self,
        ticket_id: &str,
        request: CreateMessageRequest,
    ) -> Result<TicketMessage, TicketError>;

    /// Messages of a ticket, oldest first.
    fn messages(&self, ticket_id: &str) -> Result<Vec<TicketMessage>, TicketError>;
}
