//! SQLite-backed reference data store.

use rusqlite::{params, types::Type, Connection, OptionalExtension};
use tracing::debug;

use super::{
    CreateReferenceRequest, ReferenceError, ReferenceItem, ReferenceKind, ReferenceStore,
    ReferenceUpdate,
};
use crate::db::{is_unique_violation, Database};

const SELECT_COLUMNS: &str = "SELECT id, kind, name, value, parent_id FROM reference_items";

/// Columns in other tables that point at reference items. Item ids are
/// unique across kinds, so matching on the id alone is exact.
const REFERENCE_COLUMNS: &[(&str, &[&str])] = &[
    (
        "tickets",
        &[
            "stage_id",
            "difficulty_id",
            "priority_id",
            "ticket_type_id",
            "origin_id",
        ],
    ),
    (
        "contracts",
        &[
            "contract_type_id",
            "pension_fund_id",
            "health_insurance_id",
            "bank_id",
            "account_type_id",
        ],
    ),
    (
        "education_records",
        &[
            "education_type_id",
            "career_id",
            "education_status_id",
            "institution_id",
        ],
    ),
    (
        "placements",
        &[
            "position_id",
            "unit_id",
            "responsibility_level_id",
            "cost_center_id",
        ],
    ),
    ("activities", &["activity_type_id", "project_id"]),
    ("reference_items", &["parent_id"]),
];

/// SQLite-backed reference data store.
pub struct SqliteReferenceStore {
    db: Database,
}

impl SqliteReferenceStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<ReferenceItem> {
        let kind_str: String = row.get(1)?;
        let kind = kind_str.parse::<ReferenceKind>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, Type::Text, e.into())
        })?;

        Ok(ReferenceItem {
            id: row.get(0)?,
            kind,
            name: row.get(2)?,
            value: row.get(3)?,
            parent_id: row.get(4)?,
        })
    }

    fn fetch(
        conn: &Connection,
        kind: ReferenceKind,
        id: i64,
    ) -> Result<Option<ReferenceItem>, ReferenceError> {
        conn.query_row(
            &format!("{} WHERE kind = ? AND id = ?", SELECT_COLUMNS),
            params![kind.as_str(), id],
            Self::row_to_item,
        )
        .optional()
        .map_err(|e| ReferenceError::Database(e.to_string()))
    }

    fn validate_name(name: &str) -> Result<String, ReferenceError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ReferenceError::Invalid("name cannot be empty".to_string()));
        }
        Ok(trimmed.to_string())
    }

    /// A parent must exist and be of the kind's parent kind.
    fn validate_parent(
        conn: &Connection,
        kind: ReferenceKind,
        parent_id: Option<i64>,
    ) -> Result<(), ReferenceError> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        let parent_kind = kind.parent_kind().ok_or_else(|| {
            ReferenceError::Invalid(format!("{} items cannot have a parent", kind))
        })?;
        if Self::fetch(conn, parent_kind, parent_id)?.is_none() {
            return Err(ReferenceError::Invalid(format!(
                "{} {} does not exist",
                parent_kind, parent_id
            )));
        }
        Ok(())
    }

    /// Number of rows anywhere in the database that point at an item.
    fn usage_count(conn: &Connection, id: i64) -> Result<i64, ReferenceError> {
        let sql = REFERENCE_COLUMNS
            .iter()
            .map(|(table, columns)| {
                let clause = columns
                    .iter()
                    .map(|column| format!("{} = ?1", column))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                format!("(SELECT COUNT(*) FROM {} WHERE {})", table, clause)
            })
            .collect::<Vec<_>>()
            .join(" + ");

        conn.query_row(&format!("SELECT {}", sql), params![id], |row| row.get(0))
            .map_err(|e| ReferenceError::Database(e.to_string()))
    }

    fn map_write_error(e: rusqlite::Error, kind: ReferenceKind, name: &str) -> ReferenceError {
        if is_unique_violation(&e) {
            ReferenceError::Duplicate {
                kind,
                name: name.to_string(),
            }
        } else {
            ReferenceError::Database(e.to_string())
        }
    }
}

impl ReferenceStore for SqliteReferenceStore {
    fn create(&self, request: CreateReferenceRequest) -> Result<ReferenceItem, ReferenceError> {
        let name = Self::validate_name(&request.name)?;
        let conn = self.db.lock();
        Self::validate_parent(&conn, request.kind, request.parent_id)?;

        conn.execute(
            "INSERT INTO reference_items (kind, name, value, parent_id) VALUES (?, ?, ?, ?)",
            params![request.kind.as_str(), name, request.value, request.parent_id],
        )
        .map_err(|e| Self::map_write_error(e, request.kind, &name))?;

        let item = ReferenceItem {
            id: conn.last_insert_rowid(),
            kind: request.kind,
            name,
            value: request.value,
            parent_id: request.parent_id,
        };
        debug!(kind = %item.kind, id = item.id, name = %item.name, "Created reference item");
        Ok(item)
    }

    fn get(&self, kind: ReferenceKind, id: i64) -> Result<Option<ReferenceItem>, ReferenceError> {
        let conn = self.db.lock();
        Self::fetch(&conn, kind, id)
    }

    fn list(&self, kind: ReferenceKind) -> Result<Vec<ReferenceItem>, ReferenceError> {
        let conn = self.db.lock();

        let mut stmt = conn
            .prepare(&format!(
                "{} WHERE kind = ? ORDER BY value IS NULL, value ASC, id ASC",
                SELECT_COLUMNS
            ))
            .map_err(|e| ReferenceError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![kind.as_str()], Self::row_to_item)
            .map_err(|e| ReferenceError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| ReferenceError::Database(e.to_string()))
    }

    fn update(
        &self,
        kind: ReferenceKind,
        id: i64,
        update: ReferenceUpdate,
    ) -> Result<ReferenceItem, ReferenceError> {
        let conn = self.db.lock();

        let current = Self::fetch(&conn, kind, id)?.ok_or(ReferenceError::NotFound { kind, id })?;
        if update.is_empty() {
            return Ok(current);
        }

        let name = match update.name {
            Some(ref name) => Self::validate_name(name)?,
            None => current.name,
        };
        let value = update.value.unwrap_or(current.value);
        let parent_id = match update.parent_id {
            Some(parent_id) => {
                Self::validate_parent(&conn, kind, parent_id)?;
                parent_id
            }
            None => current.parent_id,
        };

        conn.execute(
            "UPDATE reference_items SET name = ?, value = ?, parent_id = ? WHERE kind = ? AND id = ?",
            params![name, value, parent_id, kind.as_str(), id],
        )
        .map_err(|e| Self::map_write_error(e, kind, &name))?;

        debug!(kind = %kind, id, name = %name, "Updated reference item");
        Ok(ReferenceItem {
            id,
            kind,
            name,
            value,
            parent_id,
        })
    }

    fn delete(&self, kind: ReferenceKind, id: i64) -> Result<ReferenceItem, ReferenceError> {
        let conn = self.db.lock();

        let item = Self::fetch(&conn, kind, id)?.ok_or(ReferenceError::NotFound { kind, id })?;

        let count = Self::usage_count(&conn, id)?;
        if count > 0 {
            return Err(ReferenceError::InUse { kind, id, count });
        }

        conn.execute("DELETE FROM reference_items WHERE id = ?", params![id])
            .map_err(|e| ReferenceError::Database(e.to_string()))?;

        debug!(kind = %kind, id, "Deleted reference item");
        Ok(item)
    }
}
