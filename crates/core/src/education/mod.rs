//! Education records of a collaborator.
//!
//! Each record names an education type, a career, its status and the
//! institution that granted it.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteEducationStore;
pub use store::EducationStore;
pub use types::{CreateEducationRequest, EducationRecord, EducationUpdate};
