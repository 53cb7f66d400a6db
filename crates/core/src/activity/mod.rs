//! Activity log: what a collaborator worked on, and when.
//!
//! An entry records a day, a start time, an optional end time, the activity
//! type and the project it was billed to.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteActivityStore;
pub use store::ActivityStore;
pub use types::{Activity, ActivityFilter, ActivityUpdate, CreateActivityRequest};
