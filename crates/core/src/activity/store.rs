//! Activity storage trait.

use super::{Activity, ActivityFilter, ActivityUpdate, CreateActivityRequest};
use crate::record::RecordError;

/// Trait for activity storage backends.
pub trait ActivityStore: Send + Sync {
    fn create(
        &self,
        collaborator_id: &str,
        request: CreateActivityRequest,
    ) -> Result<Activity, RecordError>;

    fn get(&self, id: &str) -> Result<Option<Activity>, RecordError>;

    /// Activities of a collaborator in chronological order.
    fn list(
        &self,
        collaborator_id: &str,
        filter: &ActivityFilter,
    ) -> Result<Vec<Activity>, RecordError>;

    fn update(&self, id: &str, update: ActivityUpdate) -> Result<Activity, RecordError>;

    fn delete(&self, id: &str) -> Result<Activity, RecordError>;
}
