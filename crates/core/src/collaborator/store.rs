//! Collaborator storage trait and types.

use thiserror::Error;

use super::{Collaborator, CollaboratorUpdate, CreateCollaboratorRequest};
use crate::run::RunError;

/// Error type for collaborator operations.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// Collaborator not found.
    #[error("Collaborator not found: {0}")]
    NotFound(String),

    /// RUN failed validation.
    #[error(transparent)]
    InvalidRun(#[from] RunError),

    /// Another collaborator already uses this RUN or email.
    #[error("A collaborator with {field} {value} already exists")]
    Duplicate { field: &'static str, value: String },

    /// A field failed validation.
    #[error("Invalid collaborator: {0}")]
    Invalid(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Filter for querying collaborators.
#[derive(Debug, Clone, Default)]
pub struct CollaboratorFilter {
    /// Filter by RUN (any accepted format).
    pub run: Option<String>,
    /// Filter by email.
    pub email: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl CollaboratorFilter {
    pub fn new() -> Self {
        Self {
            limit: 100,
            ..Default::default()
        }
    }

    pub fn with_run(mut self, run: impl Into<String>) -> Self {
        self.run = Some(run.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for collaborator storage backends.
pub trait CollaboratorStore: Send + Sync {
    /// Create a new collaborator. The RUN is validated and normalized.
    fn create(&self, request: CreateCollaboratorRequest) -> Result<Collaborator, CollaboratorError>;

    /// Get a collaborator by ID.
    fn get(&self, id: &str) -> Result<Option<Collaborator>, CollaboratorError>;

    /// Get a collaborator by RUN.
    fn get_by_run(&self, run: &str) -> Result<Option<Collaborator>, CollaboratorError>;

    /// List collaborators matching the filter, ordered by surname.
    fn list(&self, filter: &CollaboratorFilter) -> Result<Vec<Collaborator>, CollaboratorError>;

    /// Count collaborators matching the filter.
    fn count(&self, filter: &CollaboratorFilter) -> Result<i64, CollaboratorError>;

    /// Apply a partial update.
    fn update(&self, id: &str, update: CollaboratorUpdate)
        -> Result<Collaborator, CollaboratorError>;

    /// Delete a collaborator along with the tickets they requested or own.
    fn delete(&self, id: &str) -> Result<Collaborator, CollaboratorError>;
}
