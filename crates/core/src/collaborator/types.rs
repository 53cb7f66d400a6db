//! Collaborator data types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_util::nullable;

/// An employee record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collaborator {
    pub id: String,
    /// RUN in compact form (`123456785`).
    pub run: String,
    pub email: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub birth_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landline_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
    pub hire_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collaborator {
    /// Full display name: first, middle, paternal and maternal surnames.
    pub fn full_name(&self) -> String {
        [
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.paternal_surname.as_str()),
            Some(self.maternal_surname.as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Request to create a collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCollaboratorRequest {
    pub run: String,
    pub email: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub landline_phone: Option<String>,
    #[serde(default)]
    pub mobile_phone: Option<String>,
    pub hire_date: NaiveDate,
}

/// Partial update of a collaborator.
///
/// Absent fields are left untouched. For optional fields, an explicit JSON
/// `null` clears the value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CollaboratorUpdate {
    pub run: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub middle_name: Option<Option<String>>,
    pub paternal_surname: Option<String>,
    pub maternal_surname: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[serde(deserialize_with = "nullable")]
    pub address: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub landline_phone: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub mobile_phone: Option<Option<String>>,
    pub hire_date: Option<NaiveDate>,
}

impl CollaboratorUpdate {
    pub fn is_empty(&self) -> bool {
        self.run.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.middle_name.is_none()
            && self.paternal_surname.is_none()
            && self.maternal_surname.is_none()
            && self.birth_date.is_none()
            && self.address.is_none()
            && self.landline_phone.is_none()
            && self.mobile_phone.is_none()
            && self.hire_date.is_none()
    }
}
