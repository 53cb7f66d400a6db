//! Pieces shared by the records a collaborator owns: contracts, education,
//! organizational placements and activity logs.
//!
//! Every such record is deleted together with its collaborator, and every
//! lookup column points at a [`ReferenceItem`](crate::reference::ReferenceItem)
//! of a fixed [`ReferenceKind`].

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::reference::ReferenceKind;

/// Error type for collaborator-owned records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The record, or the collaborator it belongs to, does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A referenced collaborator, record or reference item does not exist.
    #[error("Invalid {field}: {value} does not exist")]
    InvalidReference { field: &'static str, value: String },

    /// The write would break a uniqueness rule.
    #[error("{0}")]
    Conflict(String),

    /// A field failed validation.
    #[error("Invalid {entity}: {message}")]
    Invalid {
        entity: &'static str,
        message: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl RecordError {
    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        RecordError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid(entity: &'static str, message: impl Into<String>) -> Self {
        RecordError::Invalid {
            entity,
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for RecordError {
    fn from(e: rusqlite::Error) -> Self {
        RecordError::Database(e.to_string())
    }
}

fn exists(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<bool, RecordError> {
    Ok(conn.query_row(sql, params, |row| row.get(0))?)
}

/// Fails with `NotFound` when the owning collaborator is missing.
pub(crate) fn require_collaborator(conn: &Connection, id: &str) -> Result<(), RecordError> {
    if exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM collaborators WHERE id = ?)",
        params![id],
    )? {
        Ok(())
    } else {
        Err(RecordError::not_found("Collaborator", id))
    }
}

/// Fails with `InvalidReference` when a collaborator named in a field is missing.
pub(crate) fn check_collaborator(
    conn: &Connection,
    field: &'static str,
    id: &str,
) -> Result<(), RecordError> {
    if exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM collaborators WHERE id = ?)",
        params![id],
    )? {
        Ok(())
    } else {
        Err(RecordError::InvalidReference {
            field,
            value: id.to_string(),
        })
    }
}

pub(crate) fn check_reference(
    conn: &Connection,
    field: &'static str,
    kind: ReferenceKind,
    id: i64,
) -> Result<(), RecordError> {
    if exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM reference_items WHERE kind = ? AND id = ?)",
        params![kind.as_str(), id],
    )? {
        Ok(())
    } else {
        Err(RecordError::InvalidReference {
            field,
            value: id.to_string(),
        })
    }
}

pub(crate) fn check_optional_reference(
    conn: &Connection,
    field: &'static str,
    kind: ReferenceKind,
    id: Option<i64>,
) -> Result<(), RecordError> {
    match id {
        Some(id) => check_reference(conn, field, kind, id),
        None => Ok(()),
    }
}

/// Trimmed text, with blank input treated as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}


/// Fixtures shared by the record stores' unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use chrono::NaiveDate;

    use crate::collaborator::{CollaboratorStore, CreateCollaboratorRequest, SqliteCollaboratorStore};
    use crate::db::Database;
    use crate::reference::{
        seed_defaults, CreateReferenceRequest, ReferenceKind, ReferenceStore, SqliteReferenceStore,
    };
    use crate::run::RunFormat;

    /// Seeded in-memory database.
    pub fn database() -> Database {
        let db = Database::in_memory().unwrap();
        seed_defaults(&SqliteReferenceStore::new(db.clone())).unwrap();
        db
    }

    pub fn collaborator(db: &Database, run: &str, email: &str) -> String {
        SqliteCollaboratorStore::new(db.clone(), RunFormat::Strict)
            .create(CreateCollaboratorRequest {
                run: run.to_string(),
                email: email.to_string(),
                first_name: "Ana".to_string(),
                middle_name: None,
                paternal_surname: "Rojas".to_string(),
                maternal_surname: "Soto".to_string(),
                birth_date: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
                address: None,
                landline_phone: None,
                mobile_phone: None,
                hire_date: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            })
            .unwrap()
            .id
    }

    pub fn delete_collaborator(db: &Database, id: &str) {
        SqliteCollaboratorStore::new(db.clone(), RunFormat::Strict)
            .delete(id)
            .unwrap();
    }

    /// ID of the item with this name, created on first use.
    pub fn reference(db: &Database, kind: ReferenceKind, name: &str) -> i64 {
        let store = SqliteReferenceStore::new(db.clone());
        if let Some(item) = store
            .list(kind)
            .unwrap()
            .into_iter()
            .find(|item| item.name == name)
        {
            return item.id;
        }
        store
            .create(CreateReferenceRequest::new(kind, name))
            .unwrap()
            .id
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }
}
