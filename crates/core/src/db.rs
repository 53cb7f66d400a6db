//! Shared SQLite connection and schema.
//!
//! All stores share a single connection so that foreign keys between
//! collaborators, reference data and tickets are enforced, and so that an
//! in-memory database is visible to every store in tests.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rusqlite::{types::Type, Connection, Row};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to open database: {0}")]
    Open(String),

    #[error("Failed to initialize schema: {0}")]
    Schema(String),
}

/// Cloneable handle to the shared SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and apply the schema.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|e| DatabaseError::Open(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Create an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|e| DatabaseError::Open(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Lock the connection. A poisoned lock is recovered, since every write
    /// happens inside a transaction that rolls back on unwind.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn initialize_schema(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS reference_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL,
            name TEXT NOT NULL,
            value INTEGER,
            parent_id INTEGER REFERENCES reference_items(id),
            UNIQUE(kind, name)
        );

        CREATE TABLE IF NOT EXISTS collaborators (
            id TEXT PRIMARY KEY,
            run TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            middle_name TEXT,
            paternal_surname TEXT NOT NULL,
            maternal_surname TEXT NOT NULL,
            birth_date TEXT NOT NULL,
            address TEXT,
            landline_phone TEXT,
            mobile_phone TEXT,
            hire_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tickets (
            id TEXT PRIMARY KEY,
            subject TEXT NOT NULL,
            description TEXT NOT NULL,
            requester_id TEXT NOT NULL REFERENCES collaborators(id) ON DELETE CASCADE,
            assignee_id TEXT NOT NULL REFERENCES collaborators(id) ON DELETE CASCADE,
            validator_id TEXT REFERENCES collaborators(id) ON DELETE SET NULL,
            stage_id INTEGER NOT NULL REFERENCES reference_items(id),
            difficulty_id INTEGER REFERENCES reference_items(id),
            priority_id INTEGER NOT NULL REFERENCES reference_items(id),
            ticket_type_id INTEGER NOT NULL REFERENCES reference_items(id),
            origin_id INTEGER NOT NULL REFERENCES reference_items(id),
            version TEXT,
            due_date TEXT,
            url TEXT,
            requested_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tickets_stage ON tickets(stage_id);
        CREATE INDEX IF NOT EXISTS idx_tickets_assignee ON tickets(assignee_id);
        CREATE INDEX IF NOT EXISTS idx_tickets_requester ON tickets(requester_id);

        CREATE TABLE IF NOT EXISTS ticket_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ticket_id TEXT NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
            field TEXT NOT NULL,
            old_value TEXT,
            new_value TEXT,
            changed_by TEXT,
            changed_at TEXT NOT NULL,
            note TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_ticket_history_ticket
            ON ticket_history(ticket_id, changed_at);

        CREATE TABLE IF NOT EXISTS ticket_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ticket_id TEXT NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
            author_id TEXT NOT NULL REFERENCES collaborators(id) ON DELETE CASCADE,
            subject TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ticket_messages_ticket
            ON ticket_messages(ticket_id, created_at);

        CREATE TABLE IF NOT EXISTS contracts (
            id TEXT PRIMARY KEY,
            collaborator_id TEXT NOT NULL REFERENCES collaborators(id) ON DELETE CASCADE,
            start_date TEXT NOT NULL,
            end_date TEXT,
            base_salary INTEGER,
            contract_type_id INTEGER NOT NULL REFERENCES reference_items(id),
            expiry_date TEXT,
            pension_fund_id INTEGER NOT NULL REFERENCES reference_items(id),
            health_insurance_id INTEGER NOT NULL REFERENCES reference_items(id),
            bank_id INTEGER REFERENCES reference_items(id),
            account_type_id INTEGER REFERENCES reference_items(id),
            account_number TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_contracts_collaborator
            ON contracts(collaborator_id, start_date);

        CREATE TABLE IF NOT EXISTS placements (
            id TEXT PRIMARY KEY,
            contract_id TEXT NOT NULL UNIQUE REFERENCES contracts(id) ON DELETE CASCADE,
            position_id INTEGER NOT NULL REFERENCES reference_items(id),
            unit_id INTEGER NOT NULL REFERENCES reference_items(id),
            responsibility_level_id INTEGER NOT NULL REFERENCES reference_items(id),
            supervisor_id TEXT REFERENCES collaborators(id) ON DELETE SET NULL,
            cost_center_id INTEGER NOT NULL REFERENCES reference_items(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS education_records (
            id TEXT PRIMARY KEY,
            collaborator_id TEXT NOT NULL REFERENCES collaborators(id) ON DELETE CASCADE,
            education_type_id INTEGER NOT NULL REFERENCES reference_items(id),
            career_id INTEGER NOT NULL REFERENCES reference_items(id),
            education_status_id INTEGER NOT NULL REFERENCES reference_items(id),
            institution_id INTEGER NOT NULL REFERENCES reference_items(id),
            completion_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_education_collaborator
            ON education_records(collaborator_id);

        CREATE TABLE IF NOT EXISTS activities (
            id TEXT PRIMARY KEY,
            collaborator_id TEXT NOT NULL REFERENCES collaborators(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT,
            activity_type_id INTEGER NOT NULL REFERENCES reference_items(id),
            project_id INTEGER NOT NULL REFERENCES reference_items(id),
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_activities_collaborator
            ON activities(collaborator_id, date, start_time);
        "#,
    )
    .map_err(|e| DatabaseError::Schema(e.to_string()))
}

/// Render a timestamp so that lexicographic order equals chronological order.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time at the precision timestamps are stored with.
pub(crate) fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::<Utc>::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

/// Whether an error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Read a timestamp column written by [`format_timestamp`].
pub(crate) fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("invalid timestamp: {}", raw).into(),
        )
    })
}

/// Read an optional `YYYY-MM-DD` date column.
pub(crate) fn optional_date_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse::<NaiveDate>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
        })
    })
    .transpose()
}

/// Read an optional `HH:MM:SS` time column.
pub(crate) fn optional_time_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveTime>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse::<NaiveTime>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
        })
    })
    .transpose()
}

/// Read a required `HH:MM:SS` time column.
pub(crate) fn time_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveTime> {
    optional_time_column(row, idx)?.ok_or(rusqlite::Error::InvalidColumnType(
        idx,
        "time".to_string(),
        Type::Null,
    ))
}

/// Read a required `YYYY-MM-DD` date column.
pub(crate) fn date_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    optional_date_column(row, idx)?.ok_or(rusqlite::Error::InvalidColumnType(
        idx,
        "date".to_string(),
        Type::Null,
    ))
}
