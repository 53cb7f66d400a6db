//! Organizational placement: where a collaborator sits under a contract.
//!
//! Each contract has at most one placement naming the position, unit,
//! responsibility level, cost center and direct supervisor.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqlitePlacementStore;
pub use store::PlacementStore;
pub use types::{CreatePlacementRequest, Placement, PlacementUpdate};
