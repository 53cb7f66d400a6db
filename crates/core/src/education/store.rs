//! Education storage trait.

use super::{CreateEducationRequest, EducationRecord, EducationUpdate};
use crate::record::RecordError;

/// Trait for education storage backends.
pub trait EducationStore: Send + Sync {
    fn create(
        &self,
        collaborator_id: &str,
        request: CreateEducationRequest,
    ) -> Result<EducationRecord, RecordError>;

    fn get(&self, id: &str) -> Result<Option<EducationRecord>, RecordError>;

    /// Records of a collaborator, latest completion first.
    fn list(&self, collaborator_id: &str) -> Result<Vec<EducationRecord>, RecordError>;

    fn update(&self, id: &str, update: EducationUpdate) -> Result<EducationRecord, RecordError>;

    fn delete(&self, id: &str) -> Result<EducationRecord, RecordError>;
}
