//! Runtime-configurable reference data.
//!
//! Ticket stages, priorities, difficulties, ticket types and origins are rows
//! rather than Rust enums, so operators can add or rename them without a
//! release. [`ReferenceCache`] keeps an in-process copy for lookups.

mod cache;
mod sqlite_store;
mod store;
mod types;

pub use cache::ReferenceCache;
pub use sqlite_store::SqliteReferenceStore;
pub use store::{
    seed_defaults, CreateReferenceRequest, ReferenceError, ReferenceStore, ReferenceUpdate,
};
pub use types::{ReferenceItem, ReferenceKind};
