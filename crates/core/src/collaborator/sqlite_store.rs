//! SQLite-backed collaborator store.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{
    Collaborator, CollaboratorError, CollaboratorFilter, CollaboratorStore, CollaboratorUpdate,
    CreateCollaboratorRequest,
};
use crate::db::{
    date_column, format_timestamp, is_unique_violation, now, timestamp_column, Database,
};
use crate::run::{validate_run, RunFormat};

const SELECT_COLUMNS: &str = "SELECT id, run, email, first_name, middle_name, paternal_surname, maternal_surname, birth_date, address, landline_phone, mobile_phone, hire_date, created_at, updated_at FROM collaborators";

/// SQLite-backed collaborator store.
pub struct SqliteCollaboratorStore {
    db: Database,
    run_format: RunFormat,
}

impl SqliteCollaboratorStore {
    /// Create a store that validates RUNs with the given format mode.
    pub fn new(db: Database, run_format: RunFormat) -> Self {
        Self { db, run_format }
    }

    pub fn run_format(&self) -> RunFormat {
        self.run_format
    }

    fn row_to_collaborator(row: &rusqlite::Row) -> rusqlite::Result<Collaborator> {
        Ok(Collaborator {
            id: row.get(0)?,
            run: row.get(1)?,
            email: row.get(2)?,
            first_name: row.get(3)?,
            middle_name: row.get(4)?,
            paternal_surname: row.get(5)?,
            maternal_surname: row.get(6)?,
            birth_date: date_column(row, 7)?,
            address: row.get(8)?,
            landline_phone: row.get(9)?,
            mobile_phone: row.get(10)?,
            hire_date: date_column(row, 11)?,
            created_at: timestamp_column(row, 12)?,
            updated_at: timestamp_column(row, 13)?,
        })
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<Collaborator>, CollaboratorError> {
        conn.query_row(
            &format!("{} WHERE id = ?", SELECT_COLUMNS),
            params![id],
            Self::row_to_collaborator,
        )
        .optional()
        .map_err(|e| CollaboratorError::Database(e.to_string()))
    }

    fn normalize_run(&self, run: &str) -> Result<String, CollaboratorError> {
        Ok(validate_run(run, self.run_format)?.to_string())
    }

    /// Canonical form for lookups; falls back to the raw input when it does
    /// not parse so the query simply matches nothing.
    fn lookup_run(run: &str) -> String {
        validate_run(run, RunFormat::Permissive)
            .map(|r| r.to_string())
            .unwrap_or_else(|_| run.trim().to_uppercase())
    }

    fn required(field: &str, value: &str) -> Result<String, CollaboratorError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CollaboratorError::Invalid(format!("{} cannot be empty", field)));
        }
        Ok(trimmed.to_string())
    }

    fn email(value: &str) -> Result<String, CollaboratorError> {
        let email = Self::required("email", value)?.to_lowercase();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
            _ => Err(CollaboratorError::Invalid(format!(
                "{} is not a valid email address",
                email
            ))),
        }
    }

    fn optional(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn map_write_error(e: rusqlite::Error, run: &str, email: &str) -> CollaboratorError {
        if is_unique_violation(&e) {
            let message = e.to_string();
            if message.contains("collaborators.email") {
                CollaboratorError::Duplicate {
                    field: "email",
                    value: email.to_string(),
                }
            } else {
                CollaboratorError::Duplicate {
                    field: "RUN",
                    value: run.to_string(),
                }
            }
        } else {
            CollaboratorError::Database(e.to_string())
        }
    }

    fn build_where_clause(filter: &CollaboratorFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref run) = filter.run {
            conditions.push("run = ?");
            params.push(Box::new(Self::lookup_run(run)));
        }

        if let Some(ref email) = filter.email {
            conditions.push("email = ?");
            params.push(Box::new(email.trim().to_lowercase()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }
}

impl CollaboratorStore for SqliteCollaboratorStore {
    fn create(&self, request: CreateCollaboratorRequest) -> Result<Collaborator, CollaboratorError> {
        let now = now();
        let collaborator = Collaborator {
            id: uuid::Uuid::new_v4().to_string(),
            run: self.normalize_run(&request.run)?,
            email: Self::email(&request.email)?,
            first_name: Self::required("first_name", &request.first_name)?,
            middle_name: Self::optional(request.middle_name),
            paternal_surname: Self::required("paternal_surname", &request.paternal_surname)?,
            maternal_surname: Self::required("maternal_surname", &request.maternal_surname)?,
            birth_date: request.birth_date,
            address: Self::optional(request.address),
            landline_phone: Self::optional(request.landline_phone),
            mobile_phone: Self::optional(request.mobile_phone),
            hire_date: request.hire_date,
            created_at: now,
            updated_at: now,
        };

        let conn = self.db.lock();
        conn.execute(
            "INSERT INTO collaborators (id, run, email, first_name, middle_name, paternal_surname, maternal_surname, birth_date, address, landline_phone, mobile_phone, hire_date, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                collaborator.id,
                collaborator.run,
                collaborator.email,
                collaborator.first_name,
                collaborator.middle_name,
                collaborator.paternal_surname,
                collaborator.maternal_surname,
                collaborator.birth_date.to_string(),
                collaborator.address,
                collaborator.landline_phone,
                collaborator.mobile_phone,
                collaborator.hire_date.to_string(),
                format_timestamp(&now),
                format_timestamp(&now),
            ],
        )
        .map_err(|e| Self::map_write_error(e, &collaborator.run, &collaborator.email))?;

        info!(id = %collaborator.id, run = %collaborator.run, "Created collaborator");
        Ok(collaborator)
    }

    fn get(&self, id: &str) -> Result<Option<Collaborator>, CollaboratorError> {
        let conn = self.db.lock();
        Self::fetch(&conn, id)
    }

    fn get_by_run(&self, run: &str) -> Result<Option<Collaborator>, CollaboratorError> {
        let conn = self.db.lock();
        conn.query_row(
            &format!("{} WHERE run = ?", SELECT_COLUMNS),
            params![Self::lookup_run(run)],
            Self::row_to_collaborator,
        )
        .optional()
        .map_err(|e| CollaboratorError::Database(e.to_string()))
    }

    fn list(&self, filter: &CollaboratorFilter) -> Result<Vec<Collaborator>, CollaboratorError> {
        let conn = self.db.lock();

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!(
            "{} {} ORDER BY paternal_surname ASC, maternal_surname ASC, first_name ASC LIMIT ? OFFSET ?",
            SELECT_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| CollaboratorError::Database(e.to_string()))?;

        let mut all_params = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));
        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_collaborator)
            .map_err(|e| CollaboratorError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| CollaboratorError::Database(e.to_string()))
    }

    fn count(&self, filter: &CollaboratorFilter) -> Result<i64, CollaboratorError> {
        let conn = self.db.lock();

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM collaborators {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| CollaboratorError::Database(e.to_string()))
    }

    fn update(
        &self,
        id: &str,
        update: CollaboratorUpdate,
    ) -> Result<Collaborator, CollaboratorError> {
        let conn = self.db.lock();

        let current =
            Self::fetch(&conn, id)?.ok_or_else(|| CollaboratorError::NotFound(id.to_string()))?;
        if update.is_empty() {
            return Ok(current);
        }

        let now = now();
        let updated = Collaborator {
            run: match update.run {
                Some(ref run) => self.normalize_run(run)?,
                None => current.run,
            },
            email: match update.email {
                Some(ref email) => Self::email(email)?,
                None => current.email,
            },
            first_name: match update.first_name {
                Some(ref v) => Self::required("first_name", v)?,
                None => current.first_name,
            },
            middle_name: match update.middle_name {
                Some(v) => Self::optional(v),
                None => current.middle_name,
            },
            paternal_surname: match update.paternal_surname {
                Some(ref v) => Self::required("paternal_surname", v)?,
                None => current.paternal_surname,
            },
            maternal_surname: match update.maternal_surname {
                Some(ref v) => Self::required("maternal_surname", v)?,
                None => current.maternal_surname,
            },
            birth_date: update.birth_date.unwrap_or(current.birth_date),
            address: match update.address {
                Some(v) => Self::optional(v),
                None => current.address,
            },
            landline_phone: match update.landline_phone {
                Some(v) => Self::optional(v),
                None => current.landline_phone,
            },
            mobile_phone: match update.mobile_phone {
                Some(v) => Self::optional(v),
                None => current.mobile_phone,
            },
            hire_date: update.hire_date.unwrap_or(current.hire_date),
            updated_at: now,
            ..current
        };

        conn.execute(
            "UPDATE collaborators SET run = ?, email = ?, first_name = ?, middle_name = ?, paternal_surname = ?, maternal_surname = ?, birth_date = ?, address = ?, landline_phone = ?, mobile_phone = ?, hire_date = ?, updated_at = ? WHERE id = ?",
            params![
                updated.run,
                updated.email,
                updated.first_name,
                updated.middle_name,
                updated.paternal_surname,
                updated.maternal_surname,
                updated.birth_date.to_string(),
                updated.address,
                updated.landline_phone,
                updated.mobile_phone,
                updated.hire_date.to_string(),
                format_timestamp(&now),
                id,
            ],
        )
        .map_err(|e| Self::map_write_error(e, &updated.run, &updated.email))?;

        debug!(id, "Updated collaborator");
        Ok(updated)
    }

    fn delete(&self, id: &str) -> Result<Collaborator, CollaboratorError> {
        let conn = self.db.lock();

        let collaborator =
            Self::fetch(&conn, id)?.ok_or_else(|| CollaboratorError::NotFound(id.to_string()))?;

        // Tickets where this collaborator is requester or assignee go with it.
        conn.execute("DELETE FROM collaborators WHERE id = ?", params![id])
            .map_err(|e| CollaboratorError::Database(e.to_string()))?;

        info!(id, run = %collaborator.run, "Deleted collaborator");
        Ok(collaborator)
    }
}
