//! Contract storage trait.

use super::{Contract, ContractUpdate, CreateContractRequest};
use crate::record::RecordError;

/// Trait for contract storage backends.
pub trait ContractStore: Send + Sync {
    /// Create a contract for an existing collaborator.
    fn create(
        &self,
        collaborator_id: &str,
        request: CreateContractRequest,
    ) -> Result<Contract, RecordError>;

    fn get(&self, id: &str) -> Result<Option<Contract>, RecordError>;

    /// Contracts of a collaborator, most recent start first.
    fn list(&self, collaborator_id: &str) -> Result<Vec<Contract>, RecordError>;

    /// Apply a partial update.
    fn update(&self, id: &str, update: ContractUpdate) -> Result<Contract, RecordError>;

    /// Delete a contract and its organizational placement.
    fn delete(&self, id: &str) -> Result<Contract, RecordError>;
}
