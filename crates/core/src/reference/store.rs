//! Reference data storage trait.

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::{ReferenceItem, ReferenceKind};
use crate::serde_util::nullable;

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("{kind} {id} not found")]
    NotFound { kind: ReferenceKind, id: i64 },

    #[error("{kind} named {name:?} already exists")]
    Duplicate { kind: ReferenceKind, name: String },

    #[error("{kind} {id} is still referenced by {count} record(s)")]
    InUse {
        kind: ReferenceKind,
        id: i64,
        count: i64,
    },

    #[error("Invalid reference item: {0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Request to create a reference item.
#[derive(Debug, Clone)]
pub struct CreateReferenceRequest {
    pub kind: ReferenceKind,
    pub name: String,
    pub value: Option<i64>,
    pub parent_id: Option<i64>,
}

impl CreateReferenceRequest {
    pub fn new(kind: ReferenceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            value: None,
            parent_id: None,
        }
    }

    pub fn with_value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Partial update of a reference item. Absent fields are left untouched;
/// an explicit `null` value clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReferenceUpdate {
    pub name: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub value: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub parent_id: Option<Option<i64>>,
}

impl ReferenceUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.value.is_none() && self.parent_id.is_none()
    }
}

/// Trait for reference data storage backends.
pub trait ReferenceStore: Send + Sync {
    /// Create a new item. Names are unique per kind.
    fn create(&self, request: CreateReferenceRequest) -> Result<ReferenceItem, ReferenceError>;

    /// Get an item by kind and ID.
    fn get(&self, kind: ReferenceKind, id: i64) -> Result<Option<ReferenceItem>, ReferenceError>;

    /// List all items of a kind, ordered by value then ID.
    fn list(&self, kind: ReferenceKind) -> Result<Vec<ReferenceItem>, ReferenceError>;

    /// Apply a partial update to an item.
    fn update(
        &self,
        kind: ReferenceKind,
        id: i64,
        update: ReferenceUpdate,
    ) -> Result<ReferenceItem, ReferenceError>;

    /// Delete an item that no ticket, collaborator record or child item
    /// references.
    fn delete(&self, kind: ReferenceKind, id: i64) -> Result<ReferenceItem, ReferenceError>;
}

/// Default rows inserted into an empty database.
const DEFAULTS: &[(ReferenceKind, &str, Option<i64>)] = &[
    (ReferenceKind::Stage, "open", None),
    (ReferenceKind::Stage, "in_progress", None),
    (ReferenceKind::Stage, "in_review", None),
    (ReferenceKind::Stage, "closed", None),
    (ReferenceKind::Priority, "low", Some(1)),
    (ReferenceKind::Priority, "normal", Some(2)),
    (ReferenceKind::Priority, "high", Some(3)),
    (ReferenceKind::Priority, "urgent", Some(4)),
    (ReferenceKind::Difficulty, "standard", None),
    (ReferenceKind::TicketType, "incident", None),
    (ReferenceKind::Origin, "email", None),
    (ReferenceKind::ContractType, "indefinite", None),
    (ReferenceKind::ContractType, "fixed_term", None),
    (ReferenceKind::ContractType, "per_project", None),
    (ReferenceKind::PensionFund, "capital", None),
    (ReferenceKind::PensionFund, "cuprum", None),
    (ReferenceKind::PensionFund, "habitat", None),
    (ReferenceKind::PensionFund, "modelo", None),
    (ReferenceKind::PensionFund, "planvital", None),
    (ReferenceKind::PensionFund, "provida", None),
    (ReferenceKind::PensionFund, "uno", None),
    (ReferenceKind::HealthInsurance, "fonasa", None),
    (ReferenceKind::HealthInsurance, "isapre", None),
    (ReferenceKind::AccountType, "checking", None),
    (ReferenceKind::AccountType, "savings", None),
    (ReferenceKind::AccountType, "demand", None),
    (ReferenceKind::EducationStatus, "in_progress", None),
    (ReferenceKind::EducationStatus, "completed", None),
    (ReferenceKind::EducationStatus, "incomplete", None),
];

/// Insert the default rows for every kind that currently has none.
///
/// Returns the number of rows inserted.
pub fn seed_defaults(store: &dyn ReferenceStore) -> Result<usize, ReferenceError> {
    let mut inserted = 0;
    for kind in ReferenceKind::ALL {
        if !store.list(kind)?.is_empty() {
            continue;
        }
        for (_, name, value) in DEFAULTS.iter().filter(|(k, _, _)| *k == kind) {
            let mut request = CreateReferenceRequest::new(kind, *name);
            request.value = *value;
            store.create(request)?;
            inserted += 1;
        }
    }
    if inserted > 0 {
        info!(inserted, "Seeded default reference data");
    }
    Ok(inserted)
}
