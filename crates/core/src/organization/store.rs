//! Placement storage trait.

use super::{CreatePlacementRequest, Placement, PlacementUpdate};
use crate::record::RecordError;

/// Trait for placement storage backends.
pub trait PlacementStore: Send + Sync {
    /// Place a collaborator under one of their own contracts. A contract
    /// holds at most one placement.
    fn create(
        &self,
        collaborator_id: &str,
        request: CreatePlacementRequest,
    ) -> Result<Placement, RecordError>;

    fn get(&self, id: &str) -> Result<Option<Placement>, RecordError>;

    /// Placement of a contract, if any.
    fn for_contract(&self, contract_id: &str) -> Result<Option<Placement>, RecordError>;

    /// Placements across all contracts of a collaborator, newest contract first.
    fn list(&self, collaborator_id: &str) -> Result<Vec<Placement>, RecordError>;

    /// Collaborators whose placement names this supervisor.
    fn reports_of(&self, supervisor_id: &str) -> Result<Vec<Placement>, RecordError>;

    fn update(&self, id: &str, update: PlacementUpdate) -> Result<Placement, RecordError>;

    fn delete(&self, id: &str) -> Result<Placement, RecordError>;
}
