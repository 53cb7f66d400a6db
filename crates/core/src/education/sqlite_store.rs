//! SQLite-backed education store.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{CreateEducationRequest, EducationRecord, EducationStore, EducationUpdate};
use crate::db::{date_column, format_timestamp, now, timestamp_column, Database};
use crate::record::{check_reference, require_collaborator, RecordError};
use crate::reference::ReferenceKind;

const ENTITY: &str = "Education record";

const SELECT_COLUMNS: &str = "SELECT id, collaborator_id, education_type_id, career_id, education_status_id, institution_id, completion_date, created_at, updated_at FROM education_records";

pub struct SqliteEducationStore {
    db: Database,
}

impl SqliteEducationStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<EducationRecord> {
        Ok(EducationRecord {
            id: row.get(0)?,
            collaborator_id: row.get(1)?,
            education_type_id: row.get(2)?,
            career_id: row.get(3)?,
            education_status_id: row.get(4)?,
            institution_id: row.get(5)?,
            completion_date: date_column(row, 6)?,
            created_at: timestamp_column(row, 7)?,
            updated_at: timestamp_column(row, 8)?,
        })
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<EducationRecord>, RecordError> {
        Ok(conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_COLUMNS),
                params![id],
                Self::row_to_record,
            )
            .optional()?)
    }

    fn validate(conn: &Connection, record: &EducationRecord) -> Result<(), RecordError> {
        check_reference(
            conn,
            "education_type_id",
            ReferenceKind::EducationType,
            record.education_type_id,
        )?;
        check_reference(conn, "career_id", ReferenceKind::Career, record.career_id)?;
        check_reference(
            conn,
            "education_status_id",
            ReferenceKind::EducationStatus,
            record.education_status_id,
        )?;
        check_reference(
            conn,
            "institution_id",
            ReferenceKind::Institution,
            record.institution_id,
        )
    }
}

impl EducationStore for SqliteEducationStore {
    fn create(
        &self,
        collaborator_id: &str,
        request: CreateEducationRequest,
    ) -> Result<EducationRecord, RecordError> {
        let conn = self.db.lock();
        require_collaborator(&conn, collaborator_id)?;

        let now = now();
        let record = EducationRecord {
            id: uuid::Uuid::new_v4().to_string(),
            collaborator_id: collaborator_id.to_string(),
            education_type_id: request.education_type_id,
            career_id: request.career_id,
            education_status_id: request.education_status_id,
            institution_id: request.institution_id,
            completion_date: request.completion_date,
            created_at: now,
            updated_at: now,
        };
        Self::validate(&conn, &record)?;

        conn.execute(
            "INSERT INTO education_records (id, collaborator_id, education_type_id, career_id, education_status_id, institution_id, completion_date, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.id,
                record.collaborator_id,
                record.education_type_id,
                record.career_id,
                record.education_status_id,
                record.institution_id,
                record.completion_date.to_string(),
                format_timestamp(&now),
                format_timestamp(&now),
            ],
        )?;

        info!(id = %record.id, collaborator_id, "Created education record");
        Ok(record)
    }

    fn get(&self, id: &str) -> Result<Option<EducationRecord>, RecordError> {
        let conn = self.db.lock();
        Self::fetch(&conn, id)
    }

    fn list(&self, collaborator_id: &str) -> Result<Vec<EducationRecord>, RecordError> {
        let conn = self.db.lock();
        require_collaborator(&conn, collaborator_id)?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE collaborator_id = ? ORDER BY completion_date DESC, created_at DESC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![collaborator_id], Self::row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn update(&self, id: &str, update: EducationUpdate) -> Result<EducationRecord, RecordError> {
        let conn = self.db.lock();

        let current = Self::fetch(&conn, id)?.ok_or_else(|| RecordError::not_found(ENTITY, id))?;
        if update.is_empty() {
            return Ok(current);
        }

        let mut record = EducationRecord {
            education_type_id: update.education_type_id.unwrap_or(current.education_type_id),
            career_id: update.career_id.unwrap_or(current.career_id),
            education_status_id: update
                .education_status_id
                .unwrap_or(current.education_status_id),
            institution_id: update.institution_id.unwrap_or(current.institution_id),
            completion_date: update.completion_date.unwrap_or(current.completion_date),
            ..current
        };
        Self::validate(&conn, &record)?;
        record.updated_at = now();

        conn.execute(
            "UPDATE education_records SET education_type_id = ?, career_id = ?, education_status_id = ?, institution_id = ?, completion_date = ?, updated_at = ? WHERE id = ?",
            params![
                record.education_type_id,
                record.career_id,
                record.education_status_id,
                record.institution_id,
                record.completion_date.to_string(),
                format_timestamp(&record.updated_at),
                id,
            ],
        )?;

        debug!(id, "Updated education record");
        Ok(record)
    }

    fn delete(&self, id: &str) -> Result<EducationRecord, RecordError> {
        let conn = self.db.lock();

        let record = Self::fetch(&conn, id)?.ok_or_else(|| RecordError::not_found(ENTITY, id))?;
        conn.execute("DELETE FROM education_records WHERE id = ?", params![id])?;

        info!(id, collaborator_id = %record.collaborator_id, "Deleted education record");
        Ok(record)
    }
}
