//! Placement data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_util::nullable;

/// Organizational data attached to one contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    pub id: String,
    pub contract_id: String,
    /// Owner of the contract.
    pub collaborator_id: String,
    pub position_id: i64,
    pub unit_id: i64,
    pub responsibility_level_id: i64,
    /// Direct supervisor. Cleared when the supervisor is removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<String>,
    pub cost_center_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlacementRequest {
    pub contract_id: String,
    pub position_id: i64,
    pub unit_id: i64,
    pub responsibility_level_id: i64,
    #[serde(default)]
    pub supervisor_id: Option<String>,
    pub cost_center_id: i64,
}

/// Partial update of a placement. The contract cannot change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlacementUpdate {
    pub position_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub responsibility_level_id: Option<i64>,
    #[serde(deserialize_with = "nullable")]
    pub supervisor_id: Option<Option<String>>,
    pub cost_center_id: Option<i64>,
}

impl PlacementUpdate {
    pub fn is_empty(&self) -> bool {
        self.position_id.is_none()
            && self.unit_id.is_none()
            && self.responsibility_level_id.is_none()
            && self.supervisor_id.is_none()
            && self.cost_center_id.is_none()
    }
}
