//! SQLite-backed ticket store implementation.

use rusqlite::{params, types::Type, Connection, OptionalExtension};
use tracing::{debug, info};

use super::history::{next_timestamp, tracked_changes};
use super::{
    CreateMessageRequest, CreateTicketRequest, HistoryEntry, Ticket, TicketError, TicketFilter,
    TicketMessage, TicketStore, TicketUpdate, TrackedField, UpdateOutcome,
};
use crate::db::{
    format_timestamp, now, optional_date_column, parse_timestamp, timestamp_column, Database,
};
use crate::reference::ReferenceKind;

const SELECT_COLUMNS: &str = "SELECT id, subject, description, requester_id, assignee_id, validator_id, stage_id, difficulty_id, priority_id, ticket_type_id, origin_id, version, due_date, url, requested_at, created_at, updated_at FROM tickets";

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    db: Database,
}

impl SqliteTicketStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn build_where_clause(filter: &TicketFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(stage_id) = filter.stage_id {
            conditions.push("stage_id = ?");
            params.push(Box::new(stage_id));
        }

        if let Some(ref assignee_id) = filter.assignee_id {
            conditions.push("assignee_id = ?");
            params.push(Box::new(assignee_id.clone()));
        }

        if let Some(ref requester_id) = filter.requester_id {
            conditions.push("requester_id = ?");
            params.push(Box::new(requester_id.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        Ok(Ticket {
            id: row.get(0)?,
            subject: row.get(1)?,
            description: row.get(2)?,
            requester_id: row.get(3)?,
            assignee_id: row.get(4)?,
            validator_id: row.get(5)?,
            stage_id: row.get(6)?,
            difficulty_id: row.get(7)?,
            priority_id: row.get(8)?,
            ticket_type_id: row.get(9)?,
            origin_id: row.get(10)?,
            version: row.get(11)?,
            due_date: optional_date_column(row, 12)?,
            url: row.get(13)?,
            requested_at: timestamp_column(row, 14)?,
            created_at: timestamp_column(row, 15)?,
            updated_at: timestamp_column(row, 16)?,
        })
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
        let field_str: String = row.get(2)?;
        let field = field_str.parse::<TrackedField>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into())
        })?;

        Ok(HistoryEntry {
            id: row.get(0)?,
            ticket_id: row.get(1)?,
            field,
            old_value: row.get(3)?,
            new_value: row.get(4)?,
            changed_by: row.get(5)?,
            changed_at: timestamp_column(row, 6)?,
            note: row.get(7)?,
        })
    }

    fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<TicketMessage> {
        Ok(TicketMessage {
            id: row.get(0)?,
            ticket_id: row.get(1)?,
            author_id: row.get(2)?,
            subject: row.get(3)?,
            body: row.get(4)?,
            created_at: timestamp_column(row, 5)?,
        })
    }

    fn ensure_exists(conn: &Connection, id: &str) -> Result<(), TicketError> {
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM tickets WHERE id = ?)",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        if exists {
            Ok(())
        } else {
            Err(TicketError::NotFound(id.to_string()))
        }
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<Ticket>, TicketError> {
        conn.query_row(
            &format!("{} WHERE id = ?", SELECT_COLUMNS),
            params![id],
            Self::row_to_ticket,
        )
        .optional()
        .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn check_collaborator(
        conn: &Connection,
        field: &'static str,
        id: &str,
    ) -> Result<(), TicketError> {
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM collaborators WHERE id = ?)",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        if exists {
            Ok(())
        } else {
            Err(TicketError::InvalidReference {
                field,
                value: id.to_string(),
            })
        }
    }

    fn check_reference(
        conn: &Connection,
        field: &'static str,
        kind: ReferenceKind,
        id: i64,
    ) -> Result<(), TicketError> {
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM reference_items WHERE kind = ? AND id = ?)",
                params![kind.as_str(), id],
                |row| row.get(0),
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        if exists {
            Ok(())
        } else {
            Err(TicketError::InvalidReference {
                field,
                value: id.to_string(),
            })
        }
    }

    /// First item of a kind in display order, used when a request omits it.
    fn default_reference(conn: &Connection, kind: ReferenceKind) -> Result<i64, TicketError> {
        conn.query_row(
            "SELECT id FROM reference_items WHERE kind = ? ORDER BY value IS NULL, value ASC, id ASC LIMIT 1",
            params![kind.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| TicketError::Database(e.to_string()))?
        .ok_or_else(|| TicketError::Invalid(format!("no {} is configured", kind)))
    }

    fn validate_references(conn: &Connection, ticket: &Ticket) -> Result<(), TicketError> {
        Self::check_collaborator(conn, "requester_id", &ticket.requester_id)?;
        Self::check_collaborator(conn, "assignee_id", &ticket.assignee_id)?;
        if let Some(ref validator_id) = ticket.validator_id {
            Self::check_collaborator(conn, "validator_id", validator_id)?;
        }

        Self::check_reference(conn, "stage_id", ReferenceKind::Stage, ticket.stage_id)?;
        if let Some(difficulty_id) = ticket.difficulty_id {
            Self::check_reference(
                conn,
                "difficulty_id",
                ReferenceKind::Difficulty,
                difficulty_id,
            )?;
        }
        Self::check_reference(conn, "priority_id", ReferenceKind::Priority, ticket.priority_id)?;
        Self::check_reference(
            conn,
            "ticket_type_id",
            ReferenceKind::TicketType,
            ticket.ticket_type_id,
        )?;
        Self::check_reference(conn, "origin_id", ReferenceKind::Origin, ticket.origin_id)
    }

    fn required(field: &str, value: &str) -> Result<String, TicketError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(TicketError::Invalid(format!("{} cannot be empty", field)));
        }
        Ok(trimmed.to_string())
    }

    fn optional(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn apply_update(current: &Ticket, update: TicketUpdate) -> Result<Ticket, TicketError> {
        let mut ticket = current.clone();

        if let Some(ref subject) = update.subject {
            ticket.subject = Self::required("subject", subject)?;
        }
        if let Some(ref description) = update.description {
            ticket.description = Self::required("description", description)?;
        }
        if let Some(ref assignee_id) = update.assignee_id {
            ticket.assignee_id = Self::required("assignee_id", assignee_id)?;
        }
        if let Some(validator_id) = update.validator_id {
            ticket.validator_id = Self::optional(validator_id);
        }
        if let Some(stage_id) = update.stage_id {
            ticket.stage_id = stage_id;
        }
        if let Some(difficulty_id) = update.difficulty_id {
            ticket.difficulty_id = difficulty_id;
        }
        if let Some(priority_id) = update.priority_id {
            ticket.priority_id = priority_id;
        }
        if let Some(ticket_type_id) = update.ticket_type_id {
            ticket.ticket_type_id = ticket_type_id;
        }
        if let Some(origin_id) = update.origin_id {
            ticket.origin_id = origin_id;
        }
        if let Some(version) = update.version {
            ticket.version = Self::optional(version);
        }
        if let Some(due_date) = update.due_date {
            ticket.due_date = due_date;
        }
        if let Some(url) = update.url {
            ticket.url = Self::optional(url);
        }

        Ok(ticket)
    }

    /// Timestamp of the ticket's most recent history entry.
    fn last_change(
        conn: &Connection,
        id: &str,
    ) -> Result<Option<chrono::DateTime<chrono::Utc>>, TicketError> {
        let last: Option<String> = conn
            .query_row(
                "SELECT MAX(changed_at) FROM ticket_history WHERE ticket_id = ?",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| TicketError::Persistence(e.to_string()))?;

        Ok(last.as_deref().and_then(parse_timestamp))
    }
}

impl TicketStore for SqliteTicketStore {
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError> {
        let conn = self.db.lock();

        let now = now();
        let ticket = Ticket {
            id: uuid::Uuid::new_v4().to_string(),
            subject: Self::required("subject", &request.subject)?,
            description: Self::required("description", &request.description)?,
            requester_id: request.requester_id,
            assignee_id: request.assignee_id,
            validator_id: Self::optional(request.validator_id),
            stage_id: match request.stage_id {
                Some(id) => id,
                None => Self::default_reference(&conn, ReferenceKind::Stage)?,
            },
            difficulty_id: request.difficulty_id,
            priority_id: match request.priority_id {
                Some(id) => id,
                None => Self::default_reference(&conn, ReferenceKind::Priority)?,
            },
            ticket_type_id: match request.ticket_type_id {
                Some(id) => id,
                None => Self::default_reference(&conn, ReferenceKind::TicketType)?,
            },
            origin_id: match request.origin_id {
                Some(id) => id,
                None => Self::default_reference(&conn, ReferenceKind::Origin)?,
            },
            version: Self::optional(request.version),
            due_date: request.due_date,
            url: Self::optional(request.url),
            requested_at: request.requested_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
        };

        Self::validate_references(&conn, &ticket)?;

        conn.execute(
            "INSERT INTO tickets (id, subject, description, requester_id, assignee_id, validator_id, stage_id, difficulty_id, priority_id, ticket_type_id, origin_id, version, due_date, url, requested_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                ticket.id,
                ticket.subject,
                ticket.description,
                ticket.requester_id,
                ticket.assignee_id,
                ticket.validator_id,
                ticket.stage_id,
                ticket.difficulty_id,
                ticket.priority_id,
                ticket.ticket_type_id,
                ticket.origin_id,
                ticket.version,
                ticket.due_date.map(|d| d.to_string()),
                ticket.url,
                format_timestamp(&ticket.requested_at),
                format_timestamp(&now),
                format_timestamp(&now),
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        info!(ticket_id = %ticket.id, assignee = %ticket.assignee_id, "Created ticket");
        Ok(ticket)
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = self.db.lock();
        Self::fetch(&conn, id)
    }

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.db.lock();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "{} {} ORDER BY requested_at DESC, created_at DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        // Build parameter slice with limit and offset
        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            let ticket = row_result.map_err(|e| TicketError::Database(e.to_string()))?;
            tickets.push(ticket);
        }

        Ok(tickets)
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        let conn = self.db.lock();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM tickets {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(count)
    }

    fn update(
        &self,
        id: &str,
        update: TicketUpdate,
        actor: Option<&str>,
    ) -> Result<UpdateOutcome, TicketError> {
        let mut conn = self.db.lock();

        let current = Self::fetch(&conn, id)?.ok_or_else(|| TicketError::NotFound(id.to_string()))?;
        if update.is_empty() {
            return Ok(UpdateOutcome {
                ticket: current,
                entries: Vec::new(),
            });
        }

        let note = Self::optional(update.note.clone());
        let mut ticket = Self::apply_update(&current, update)?;
        Self::validate_references(&conn, &ticket)?;
        let changes = tracked_changes(&current, &ticket);

        let now = now();
        ticket.updated_at = now;

        // The ticket row and its history entries commit together or not at all.
        let tx = conn
            .transaction()
            .map_err(|e| TicketError::Persistence(e.to_string()))?;

        tx.execute(
            "UPDATE tickets SET subject = ?, description = ?, assignee_id = ?, validator_id = ?, stage_id = ?, difficulty_id = ?, priority_id = ?, ticket_type_id = ?, origin_id = ?, version = ?, due_date = ?, url = ?, updated_at = ? WHERE id = ?",
            params![
                ticket.subject,
                ticket.description,
                ticket.assignee_id,
                ticket.validator_id,
                ticket.stage_id,
                ticket.difficulty_id,
                ticket.priority_id,
                ticket.ticket_type_id,
                ticket.origin_id,
                ticket.version,
                ticket.due_date.map(|d| d.to_string()),
                ticket.url,
                format_timestamp(&now),
                id,
            ],
        )
        .map_err(|e| TicketError::Persistence(e.to_string()))?;

        let mut last = Self::last_change(&tx, id)?;
        let mut entries = Vec::with_capacity(changes.len());
        for change in changes {
            let changed_at = next_timestamp(now, last);
            tx.execute(
                "INSERT INTO ticket_history (ticket_id, field, old_value, new_value, changed_by, changed_at, note) VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    change.field.as_str(),
                    change.old_value,
                    change.new_value,
                    actor,
                    format_timestamp(&changed_at),
                    note,
                ],
            )
            .map_err(|e| TicketError::Persistence(e.to_string()))?;

            entries.push(HistoryEntry {
                id: tx.last_insert_rowid(),
                ticket_id: id.to_string(),
                field: change.field,
                old_value: change.old_value,
                new_value: change.new_value,
                changed_by: actor.map(str::to_string),
                changed_at,
                note: note.clone(),
            });
            last = Some(changed_at);
        }

        tx.commit()
            .map_err(|e| TicketError::Persistence(e.to_string()))?;

        debug!(ticket_id = id, changes = entries.len(), "Updated ticket");
        Ok(UpdateOutcome { ticket, entries })
    }

    fn history(&self, id: &str) -> Result<Vec<HistoryEntry>, TicketError> {
        let conn = self.db.lock();
        Self::ensure_exists(&conn, id)?;

        let mut stmt = conn
            .prepare(
                "SELECT id, ticket_id, field, old_value, new_value, changed_by, changed_at, note FROM ticket_history WHERE ticket_id = ? ORDER BY changed_at ASC, id ASC",
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![id], Self::row_to_entry)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn add_message(
        &self,
        ticket_id: &str,
        request: CreateMessageRequest,
    ) -> Result<TicketMessage, TicketError> {
        let conn = self.db.lock();
        Self::ensure_exists(&conn, ticket_id)?;
        Self::check_collaborator(&conn, "author_id", &request.author_id)?;

        let subject = Self::required("subject", &request.subject)?;
        let body = Self::required("body", &request.body)?;
        let created_at = now();

        conn.execute(
            "INSERT INTO ticket_messages (ticket_id, author_id, subject, body, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                ticket_id,
                request.author_id,
                subject,
                body,
                format_timestamp(&created_at),
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        let message = TicketMessage {
            id: conn.last_insert_rowid(),
            ticket_id: ticket_id.to_string(),
            author_id: request.author_id,
            subject,
            body,
            created_at,
        };
        debug!(ticket_id, message_id = message.id, "Posted ticket message");
        Ok(message)
    }

    fn messages(&self, ticket_id: &str) -> Result<Vec<TicketMessage>, TicketError> {
        let conn = self.db.lock();
        Self::ensure_exists(&conn, ticket_id)?;

        let mut stmt = conn
            .prepare(
                "SELECT id, ticket_id, author_id, subject, body, created_at FROM ticket_messages WHERE ticket_id = ? ORDER BY created_at ASC, id ASC",
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![ticket_id], Self::row_to_message)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| TicketError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::{
        Collaborator, CollaboratorStore, CreateCollaboratorRequest, SqliteCollaboratorStore,
    };
    use crate::reference::{seed_defaults, ReferenceError, ReferenceStore, SqliteReferenceStore};
    use crate::run::RunFormat;
    use crate::ticket::history::replay;
    use chrono::NaiveDate;

    struct Fixture {
        db: Database,
        store: SqliteTicketStore,
        references: SqliteReferenceStore,
        collaborators: SqliteCollaboratorStore,
        requester: Collaborator,
        agent: Collaborator,
        other_agent: Collaborator,
    }

    impl Fixture {
        fn new() -> Self {
            let db = Database::in_memory().unwrap();
            let references = SqliteReferenceStore::new(db.clone());
            seed_defaults(&references).unwrap();

            let collaborators = SqliteCollaboratorStore::new(db.clone(), RunFormat::Strict);
            let requester = collaborators
                .create(collaborator_request("123456785", "ana@example.com"))
                .unwrap();
            let agent = collaborators
                .create(collaborator_request("70125382", "bruno@example.com"))
                .unwrap();
            let other_agent = collaborators
                .create(collaborator_request("111111111", "carla@example.com"))
                .unwrap();

            Self {
                store: SqliteTicketStore::new(db.clone()),
                db,
                references,
                collaborators,
                requester,
                agent,
                other_agent,
            }
        }

        fn stage(&self, name: &str) -> i64 {
            self.references
                .list(ReferenceKind::Stage)
                .unwrap()
                .into_iter()
                .find(|item| item.name == name)
                .unwrap()
                .id
        }

        fn create_ticket(&self) -> Ticket {
            self.store
                .create(CreateTicketRequest::new(
                    "Laptop does not boot",
                    "Black screen after the logo",
                    &self.requester.id,
                    &self.agent.id,
                ))
                .unwrap()
        }
    }

    fn collaborator_request(run: &str, email: &str) -> CreateCollaboratorRequest {
        CreateCollaboratorRequest {
            run: run.to_string(),
            email: email.to_string(),
            first_name: "Test".to_string(),
            middle_name: None,
            paternal_surname: "User".to_string(),
            maternal_surname: "Example".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1985, 3, 14).unwrap(),
            address: None,
            landline_phone: None,
            mobile_phone: None,
            hire_date: NaiveDate::from_ymd_opt(2019, 7, 1).unwrap(),
        }
    }

    #[test]
    fn test_create_ticket_uses_defaults() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();

        assert!(!ticket.id.is_empty());
        assert_eq!(ticket.stage_id, fixture.stage("open"));
        assert_eq!(ticket.assignee_id, fixture.agent.id);
        assert!(ticket.difficulty_id.is_none());

        let fetched = fixture.store.get(&ticket.id).unwrap().unwrap();
        assert_eq!(fetched, ticket);
    }

    #[test]
    fn test_create_writes_no_history() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();
        assert!(fixture.store.history(&ticket.id).unwrap().is_empty());
    }

    #[test]
    fn test_create_with_unknown_assignee() {
        let fixture = Fixture::new();
        let result = fixture.store.create(CreateTicketRequest::new(
            "Subject",
            "Description",
            &fixture.requester.id,
            "nobody",
        ));
        assert!(matches!(
            result,
            Err(TicketError::InvalidReference {
                field: "assignee_id",
                ..
            })
        ));
    }

    #[test]
    fn test_create_with_wrong_reference_kind() {
        let fixture = Fixture::new();
        let priority = fixture.references.list(ReferenceKind::Priority).unwrap()[0].id;

        let mut request = CreateTicketRequest::new(
            "Subject",
            "Description",
            &fixture.requester.id,
            &fixture.agent.id,
        );
        request.stage_id = Some(priority);

        let result = fixture.store.create(request);
        assert!(matches!(
            result,
            Err(TicketError::InvalidReference {
                field: "stage_id",
                ..
            })
        ));
    }

    #[test]
    fn test_create_rejects_empty_subject() {
        let fixture = Fixture::new();
        let result = fixture.store.create(CreateTicketRequest::new(
            "  ",
            "Description",
            &fixture.requester.id,
            &fixture.agent.id,
        ));
        assert!(matches!(result, Err(TicketError::Invalid(_))));
    }

    #[test]
    fn test_two_stage_updates_record_two_entries() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();
        let open = fixture.stage("open");
        let in_progress = fixture.stage("in_progress");
        let closed = fixture.stage("closed");

        fixture
            .store
            .update(&ticket.id, TicketUpdate::stage(in_progress), Some("admin"))
            .unwrap();
        fixture
            .store
            .update(&ticket.id, TicketUpdate::stage(closed), Some("admin"))
            .unwrap();

        let history = fixture.store.history(&ticket.id).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].changed_at < history[1].changed_at);

        assert_eq!(history[0].field, TrackedField::Stage);
        assert_eq!(history[0].old_value, Some(open.to_string()));
        assert_eq!(history[0].new_value, Some(in_progress.to_string()));
        assert_eq!(history[1].old_value, Some(in_progress.to_string()));
        assert_eq!(history[1].new_value, Some(closed.to_string()));
        assert_eq!(history[1].changed_by.as_deref(), Some("admin"));
    }

    #[test]
    fn test_rapid_updates_keep_strictly_increasing_timestamps() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();
        let stages = [
            fixture.stage("in_progress"),
            fixture.stage("in_review"),
            fixture.stage("open"),
            fixture.stage("closed"),
        ];

        for _ in 0..5 {
            for stage in stages {
                fixture
                    .store
                    .update(&ticket.id, TicketUpdate::stage(stage), None)
                    .unwrap();
            }
        }

        let history = fixture.store.history(&ticket.id).unwrap();
        assert_eq!(history.len(), 20);
        for pair in history.windows(2) {
            assert!(pair[0].changed_at < pair[1].changed_at);
            assert_eq!(pair[0].new_value, pair[1].old_value);
        }
    }

    #[test]
    fn test_replay_reconstructs_final_values() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();
        let difficulty = fixture.references.list(ReferenceKind::Difficulty).unwrap()[0].id;

        let updates = vec![
            TicketUpdate::stage(fixture.stage("in_progress")),
            TicketUpdate::assignee(&fixture.other_agent.id),
            TicketUpdate {
                difficulty_id: Some(Some(difficulty)),
                stage_id: Some(fixture.stage("in_review")),
                ..Default::default()
            },
            TicketUpdate::assignee(&fixture.agent.id),
            TicketUpdate::stage(fixture.stage("closed")),
        ];
        for update in updates {
            fixture.store.update(&ticket.id, update, None).unwrap();
        }

        let history = fixture.store.history(&ticket.id).unwrap();
        let current = fixture.store.get(&ticket.id).unwrap().unwrap();

        for field in TrackedField::ALL {
            assert_eq!(
                replay(ticket.tracked_value(field), &history, field),
                current.tracked_value(field),
                "replay mismatch for {}",
                field
            );
        }
    }

    #[test]
    fn test_multi_field_update_records_one_entry_per_field() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();

        let outcome = fixture
            .store
            .update(
                &ticket.id,
                TicketUpdate {
                    assignee_id: Some(fixture.other_agent.id.clone()),
                    stage_id: Some(fixture.stage("in_progress")),
                    subject: Some("Laptop still does not boot".to_string()),
                    ..Default::default()
                },
                Some("admin"),
            )
            .unwrap();

        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.entries[0].field, TrackedField::Assignee);
        assert_eq!(outcome.entries[1].field, TrackedField::Stage);
        assert_eq!(outcome.ticket.subject, "Laptop still does not boot");

        let history = fixture.store.history(&ticket.id).unwrap();
        assert_eq!(history, outcome.entries);
    }

    #[test]
    fn test_note_is_stored_on_every_entry_of_the_update() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();

        let outcome = fixture
            .store
            .update(
                &ticket.id,
                TicketUpdate {
                    assignee_id: Some(fixture.other_agent.id.clone()),
                    stage_id: Some(fixture.stage("in_progress")),
                    ..Default::default()
                }
                .with_note("  Escalated to second line "),
                Some("admin"),
            )
            .unwrap();
        fixture
            .store
            .update(&ticket.id, TicketUpdate::stage(fixture.stage("closed")), None)
            .unwrap();

        let history = fixture.store.history(&ticket.id).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].note.as_deref(), Some("Escalated to second line"));
        assert_eq!(history[1].note.as_deref(), Some("Escalated to second line"));
        assert!(history[2].note.is_none());
        assert_eq!(history[..2], outcome.entries[..]);
    }

    #[test]
    fn test_note_without_changes_writes_nothing() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();

        let outcome = fixture
            .store
            .update(&ticket.id, TicketUpdate::default().with_note("looked at it"), None)
            .unwrap();
        assert!(outcome.entries.is_empty());
        assert!(fixture.store.history(&ticket.id).unwrap().is_empty());
    }

    #[test]
    fn test_messages_thread() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();
        assert!(fixture.store.messages(&ticket.id).unwrap().is_empty());

        let first = fixture
            .store
            .add_message(
                &ticket.id,
                CreateMessageRequest::new(&fixture.agent.id, "Diagnosis", "Replacing the disk"),
            )
            .unwrap();
        let second = fixture
            .store
            .add_message(
                &ticket.id,
                CreateMessageRequest::new(&fixture.requester.id, "Thanks", "Works again"),
            )
            .unwrap();

        let messages = fixture.store.messages(&ticket.id).unwrap();
        assert_eq!(messages, vec![first, second]);
        assert_eq!(messages[1].author_id, fixture.requester.id);
    }

    #[test]
    fn test_message_validation() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();

        assert!(matches!(
            fixture.store.add_message(
                "missing",
                CreateMessageRequest::new(&fixture.agent.id, "Subject", "Body"),
            ),
            Err(TicketError::NotFound(_))
        ));
        assert!(matches!(
            fixture.store.add_message(
                &ticket.id,
                CreateMessageRequest::new("nobody", "Subject", "Body"),
            ),
            Err(TicketError::InvalidReference {
                field: "author_id",
                ..
            })
        ));
        assert!(matches!(
            fixture.store.add_message(
                &ticket.id,
                CreateMessageRequest::new(&fixture.agent.id, "Subject", " "),
            ),
            Err(TicketError::Invalid(_))
        ));
        assert!(matches!(
            fixture.store.messages("missing"),
            Err(TicketError::NotFound(_))
        ));
    }

    #[test]
    fn test_unchanged_and_untracked_updates_record_nothing() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();

        fixture
            .store
            .update(&ticket.id, TicketUpdate::stage(ticket.stage_id), None)
            .unwrap();

        let outcome = fixture
            .store
            .update(
                &ticket.id,
                TicketUpdate {
                    description: Some("Fan is spinning".to_string()),
                    version: Some(Some("2.1".to_string())),
                    ..Default::default()
                },
                None,
            )
            .unwrap();

        assert!(outcome.entries.is_empty());
        assert_eq!(outcome.ticket.version.as_deref(), Some("2.1"));
        assert!(fixture.store.history(&ticket.id).unwrap().is_empty());
    }

    #[test]
    fn test_clearing_difficulty_is_recorded() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();
        let difficulty = fixture.references.list(ReferenceKind::Difficulty).unwrap()[0].id;

        fixture
            .store
            .update(
                &ticket.id,
                TicketUpdate {
                    difficulty_id: Some(Some(difficulty)),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        let outcome = fixture
            .store
            .update(
                &ticket.id,
                TicketUpdate {
                    difficulty_id: Some(None),
                    ..Default::default()
                },
                None,
            )
            .unwrap();

        assert!(outcome.ticket.difficulty_id.is_none());
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].old_value, Some(difficulty.to_string()));
        assert_eq!(outcome.entries[0].new_value, None);
    }

    #[test]
    fn test_failed_history_write_leaves_ticket_unchanged() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();

        fixture
            .db
            .lock()
            .execute_batch(
                "CREATE TRIGGER fail_history BEFORE INSERT ON ticket_history
                 BEGIN SELECT RAISE(ABORT, 'history unavailable'); END;",
            )
            .unwrap();

        let result = fixture.store.update(
            &ticket.id,
            TicketUpdate {
                stage_id: Some(fixture.stage("closed")),
                subject: Some("Changed".to_string()),
                ..Default::default()
            },
            Some("admin"),
        );
        assert!(matches!(result, Err(TicketError::Persistence(_))));

        let fetched = fixture.store.get(&ticket.id).unwrap().unwrap();
        assert_eq!(fetched, ticket);
        assert!(fixture.store.history(&ticket.id).unwrap().is_empty());

        // Once the fault is gone the same update goes through
        fixture
            .db
            .lock()
            .execute_batch("DROP TRIGGER fail_history;")
            .unwrap();
        let outcome = fixture
            .store
            .update(&ticket.id, TicketUpdate::stage(fixture.stage("closed")), None)
            .unwrap();
        assert_eq!(outcome.entries.len(), 1);
    }

    #[test]
    fn test_update_with_unknown_stage_is_rejected() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();

        let result = fixture
            .store
            .update(&ticket.id, TicketUpdate::stage(9999), None);
        assert!(matches!(
            result,
            Err(TicketError::InvalidReference {
                field: "stage_id",
                ..
            })
        ));
        assert!(fixture.store.history(&ticket.id).unwrap().is_empty());
    }

    #[test]
    fn test_update_and_history_of_missing_ticket() {
        let fixture = Fixture::new();
        assert!(matches!(
            fixture.store.update("missing", TicketUpdate::stage(1), None),
            Err(TicketError::NotFound(_))
        ));
        assert!(matches!(
            fixture.store.history("missing"),
            Err(TicketError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_and_count_with_filters() {
        let fixture = Fixture::new();
        let first = fixture.create_ticket();
        fixture.create_ticket();
        fixture
            .store
            .update(&first.id, TicketUpdate::stage(fixture.stage("closed")), None)
            .unwrap();

        assert_eq!(fixture.store.count(&TicketFilter::new()).unwrap(), 2);

        let closed = TicketFilter::new().with_stage(fixture.stage("closed"));
        let tickets = fixture.store.list(&closed).unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, first.id);

        let by_assignee = TicketFilter::new().with_assignee(&fixture.other_agent.id);
        assert_eq!(fixture.store.count(&by_assignee).unwrap(), 0);

        let by_requester = TicketFilter::new().with_requester(&fixture.requester.id);
        assert_eq!(fixture.store.count(&by_requester).unwrap(), 2);

        let page = fixture
            .store
            .list(&TicketFilter::new().with_limit(1).with_offset(1))
            .unwrap();
        assert_eq!(page.len(), 1);
    }

    #[test]
    fn test_stage_in_use_cannot_be_deleted() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();

        let result = fixture
            .references
            .delete(ReferenceKind::Stage, ticket.stage_id);
        assert!(matches!(result, Err(ReferenceError::InUse { count: 1, .. })));

        // An unused stage can go
        fixture
            .references
            .delete(ReferenceKind::Stage, fixture.stage("in_review"))
            .unwrap();
    }

    #[test]
    fn test_deleting_collaborator_cascades_to_tickets_and_history() {
        let fixture = Fixture::new();
        let ticket = fixture.create_ticket();
        fixture
            .store
            .update(&ticket.id, TicketUpdate::stage(fixture.stage("closed")), None)
            .unwrap();
        fixture
            .store
            .add_message(
                &ticket.id,
                CreateMessageRequest::new(&fixture.requester.id, "Ping", "Any news?"),
            )
            .unwrap();

        fixture.collaborators.delete(&fixture.agent.id).unwrap();

        assert!(fixture.store.get(&ticket.id).unwrap().is_none());
        let remaining: i64 = fixture
            .db
            .lock()
            .query_row("SELECT COUNT(*) FROM ticket_history", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
        let messages: i64 = fixture
            .db
            .lock()
            .query_row("SELECT COUNT(*) FROM ticket_messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(messages, 0);
    }

    #[test]
    fn test_file_based_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("mesa.db");

        let ticket_id = {
            let fixture_db = Database::open(&db_path).unwrap();
            let references = SqliteReferenceStore::new(fixture_db.clone());
            seed_defaults(&references).unwrap();
            let collaborators = SqliteCollaboratorStore::new(fixture_db.clone(), RunFormat::Strict);
            let person = collaborators
                .create(collaborator_request("123456785", "ana@example.com"))
                .unwrap();

            let store = SqliteTicketStore::new(fixture_db);
            store
                .create(CreateTicketRequest::new("Subject", "Body", &person.id, &person.id))
                .unwrap()
                .id
        };

        assert!(db_path.exists());
        let store = SqliteTicketStore::new(Database::open(&db_path).unwrap());
        assert!(store.get(&ticket_id).unwrap().is_some());
    }
}
