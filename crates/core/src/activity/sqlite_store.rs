//! SQLite-backed activity store.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{Activity, ActivityFilter, ActivityStore, ActivityUpdate, CreateActivityRequest};
use crate::db::{
    date_column, format_timestamp, now, optional_time_column, time_column, timestamp_column,
    Database,
};
use crate::record::{check_reference, optional_text, require_collaborator, RecordError};
use crate::reference::ReferenceKind;

const ENTITY: &str = "Activity";

const SELECT_COLUMNS: &str = "SELECT id, collaborator_id, date, start_time, end_time, activity_type_id, project_id, notes, created_at, updated_at FROM activities";

pub struct SqliteActivityStore {
    db: Database,
}

impl SqliteActivityStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_activity(row: &rusqlite::Row) -> rusqlite::Result<Activity> {
        Ok(Activity {
            id: row.get(0)?,
            collaborator_id: row.get(1)?,
            date: date_column(row, 2)?,
            start_time: time_column(row, 3)?,
            end_time: optional_time_column(row, 4)?,
            activity_type_id: row.get(5)?,
            project_id: row.get(6)?,
            notes: row.get(7)?,
            created_at: timestamp_column(row, 8)?,
            updated_at: timestamp_column(row, 9)?,
        })
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<Activity>, RecordError> {
        Ok(conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_COLUMNS),
                params![id],
                Self::row_to_activity,
            )
            .optional()?)
    }

    fn validate(conn: &Connection, activity: &Activity) -> Result<(), RecordError> {
        if activity
            .end_time
            .is_some_and(|end| end <= activity.start_time)
        {
            return Err(RecordError::invalid(ENTITY, "end_time must be after start_time"));
        }

        check_reference(
            conn,
            "activity_type_id",
            ReferenceKind::ActivityType,
            activity.activity_type_id,
        )?;
        check_reference(conn, "project_id", ReferenceKind::Project, activity.project_id)
    }
}

impl ActivityStore for SqliteActivityStore {
    fn create(
        &self,
        collaborator_id: &str,
        request: CreateActivityRequest,
    ) -> Result<Activity, RecordError> {
        let conn = self.db.lock();
        require_collaborator(&conn, collaborator_id)?;

        let now = now();
        let activity = Activity {
            id: uuid::Uuid::new_v4().to_string(),
            collaborator_id: collaborator_id.to_string(),
            date: request.date,
            start_time: request.start_time,
            end_time: request.end_time,
            activity_type_id: request.activity_type_id,
            project_id: request.project_id,
            notes: optional_text(request.notes),
            created_at: now,
            updated_at: now,
        };
        Self::validate(&conn, &activity)?;

        conn.execute(
            "INSERT INTO activities (id, collaborator_id, date, start_time, end_time, activity_type_id, project_id, notes, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                activity.id,
                activity.collaborator_id,
                activity.date.to_string(),
                activity.start_time.to_string(),
                activity.end_time.map(|t| t.to_string()),
                activity.activity_type_id,
                activity.project_id,
                activity.notes,
                format_timestamp(&now),
                format_timestamp(&now),
            ],
        )?;

        info!(id = %activity.id, collaborator_id, date = %activity.date, "Logged activity");
        Ok(activity)
    }

    fn get(&self, id: &str) -> Result<Option<Activity>, RecordError> {
        let conn = self.db.lock();
        Self::fetch(&conn, id)
    }

    fn list(
        &self,
        collaborator_id: &str,
        filter: &ActivityFilter,
    ) -> Result<Vec<Activity>, RecordError> {
        let conn = self.db.lock();
        require_collaborator(&conn, collaborator_id)?;

        let mut conditions = vec!["collaborator_id = ?".to_string()];
        let mut values: Vec<rusqlite::types::Value> = vec![collaborator_id.to_string().into()];

        if let Some(from) = filter.from {
            conditions.push("date >= ?".to_string());
            values.push(from.to_string().into());
        }
        if let Some(to) = filter.to {
            conditions.push("date <= ?".to_string());
            values.push(to.to_string().into());
        }
        if let Some(project_id) = filter.project_id {
            conditions.push("project_id = ?".to_string());
            values.push(project_id.into());
        }

        let sql = format!(
            "{} WHERE {} ORDER BY date ASC, start_time ASC",
            SELECT_COLUMNS,
            conditions.join(" AND ")
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), Self::row_to_activity)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn update(&self, id: &str, update: ActivityUpdate) -> Result<Activity, RecordError> {
        let conn = self.db.lock();

        let current = Self::fetch(&conn, id)?.ok_or_else(|| RecordError::not_found(ENTITY, id))?;
        if update.is_empty() {
            return Ok(current);
        }

        let mut activity = current.clone();
        if let Some(date) = update.date {
            activity.date = date;
        }
        if let Some(start_time) = update.start_time {
            activity.start_time = start_time;
        }
        if let Some(end_time) = update.end_time {
            activity.end_time = end_time;
        }
        if let Some(activity_type_id) = update.activity_type_id {
            activity.activity_type_id = activity_type_id;
        }
        if let Some(project_id) = update.project_id {
            activity.project_id = project_id;
        }
        if let Some(notes) = update.notes {
            activity.notes = optional_text(notes);
        }
        Self::validate(&conn, &activity)?;
        activity.updated_at = now();

        conn.execute(
            "UPDATE activities SET date = ?, start_time = ?, end_time = ?, activity_type_id = ?, project_id = ?, notes = ?, updated_at = ? WHERE id = ?",
            params![
                activity.date.to_string(),
                activity.start_time.to_string(),
                activity.end_time.map(|t| t.to_string()),
                activity.activity_type_id,
                activity.project_id,
                activity.notes,
                format_timestamp(&activity.updated_at),
                id,
            ],
        )?;

        debug!(id, "Updated activity");
        Ok(activity)
    }

    fn delete(&self, id: &str) -> Result<Activity, RecordError> {
        let conn = self.db.lock();

        let activity = Self::fetch(&conn, id)?.ok_or_else(|| RecordError::not_found(ENTITY, id))?;
        conn.execute("DELETE FROM activities WHERE id = ?", params![id])?;

        info!(id, collaborator_id = %activity.collaborator_id, "Deleted activity");
        Ok(activity)
    }
}
