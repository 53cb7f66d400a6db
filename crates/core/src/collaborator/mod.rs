//! Collaborator (employee) records.
//!
//! Every collaborator carries a RUN that is validated on write with the
//! configured [`RunFormat`](crate::run::RunFormat) and stored in compact form.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteCollaboratorStore;
pub use store::{CollaboratorError, CollaboratorFilter, CollaboratorStore};
pub use types::{Collaborator, CollaboratorUpdate, CreateCollaboratorRequest};
