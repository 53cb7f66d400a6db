//! SQLite-backed placement store.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{CreatePlacementRequest, Placement, PlacementStore, PlacementUpdate};
use crate::db::{format_timestamp, is_unique_violation, now, timestamp_column, Database};
use crate::record::{
    check_collaborator, check_reference, optional_text, require_collaborator, RecordError,
};
use crate::reference::ReferenceKind;

const ENTITY: &str = "Placement";

const SELECT_COLUMNS: &str = "SELECT p.id, p.contract_id, c.collaborator_id, p.position_id, p.unit_id, p.responsibility_level_id, p.supervisor_id, p.cost_center_id, p.created_at, p.updated_at FROM placements p JOIN contracts c ON c.id = p.contract_id";

/// SQLite-backed placement store.
pub struct SqlitePlacementStore {
    db: Database,
}

impl SqlitePlacementStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_placement(row: &rusqlite::Row) -> rusqlite::Result<Placement> {
        Ok(Placement {
            id: row.get(0)?,
            contract_id: row.get(1)?,
            collaborator_id: row.get(2)?,
            position_id: row.get(3)?,
            unit_id: row.get(4)?,
            responsibility_level_id: row.get(5)?,
            supervisor_id: row.get(6)?,
            cost_center_id: row.get(7)?,
            created_at: timestamp_column(row, 8)?,
            updated_at: timestamp_column(row, 9)?,
        })
    }

    fn fetch_where(
        conn: &Connection,
        condition: &str,
        value: &str,
    ) -> Result<Option<Placement>, RecordError> {
        Ok(conn
            .query_row(
                &format!("{} WHERE {} = ?", SELECT_COLUMNS, condition),
                params![value],
                Self::row_to_placement,
            )
            .optional()?)
    }

    fn query_all(
        conn: &Connection,
        condition: &str,
        value: &str,
    ) -> Result<Vec<Placement>, RecordError> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE {} = ? ORDER BY c.start_date DESC, p.created_at DESC",
            SELECT_COLUMNS, condition
        ))?;
        let rows = stmt.query_map(params![value], Self::row_to_placement)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// The contract must exist and belong to the collaborator being placed.
    fn check_contract(
        conn: &Connection,
        collaborator_id: &str,
        contract_id: &str,
    ) -> Result<(), RecordError> {
        let owner: Option<String> = conn
            .query_row(
                "SELECT collaborator_id FROM contracts WHERE id = ?",
                params![contract_id],
                |row| row.get(0),
            )
            .optional()?;

        match owner {
            Some(owner) if owner == collaborator_id => Ok(()),
            _ => Err(RecordError::InvalidReference {
                field: "contract_id",
                value: contract_id.to_string(),
            }),
        }
    }

    fn validate(conn: &Connection, placement: &Placement) -> Result<(), RecordError> {
        if let Some(ref supervisor_id) = placement.supervisor_id {
            if *supervisor_id == placement.collaborator_id {
                return Err(RecordError::invalid(
                    ENTITY,
                    "a collaborator cannot supervise themself",
                ));
            }
            check_collaborator(conn, "supervisor_id", supervisor_id)?;
        }

        check_reference(conn, "position_id", ReferenceKind::Position, placement.position_id)?;
        check_reference(conn, "unit_id", ReferenceKind::Unit, placement.unit_id)?;
        check_reference(
            conn,
            "responsibility_level_id",
            ReferenceKind::ResponsibilityLevel,
            placement.responsibility_level_id,
        )?;
        check_reference(
            conn,
            "cost_center_id",
            ReferenceKind::CostCenter,
            placement.cost_center_id,
        )
    }
}

impl PlacementStore for SqlitePlacementStore {
    fn create(
        &self,
        collaborator_id: &str,
        request: CreatePlacementRequest,
    ) -> Result<Placement, RecordError> {
        let conn = self.db.lock();
        require_collaborator(&conn, collaborator_id)?;
        Self::check_contract(&conn, collaborator_id, &request.contract_id)?;

        let now = now();
        let placement = Placement {
            id: uuid::Uuid::new_v4().to_string(),
            contract_id: request.contract_id,
            collaborator_id: collaborator_id.to_string(),
            position_id: request.position_id,
            unit_id: request.unit_id,
            responsibility_level_id: request.responsibility_level_id,
            supervisor_id: optional_text(request.supervisor_id),
            cost_center_id: request.cost_center_id,
            created_at: now,
            updated_at: now,
        };
        Self::validate(&conn, &placement)?;

        conn.execute(
            "INSERT INTO placements (id, contract_id, position_id, unit_id, responsibility_level_id, supervisor_id, cost_center_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                placement.id,
                placement.contract_id,
                placement.position_id,
                placement.unit_id,
                placement.responsibility_level_id,
                placement.supervisor_id,
                placement.cost_center_id,
                format_timestamp(&now),
                format_timestamp(&now),
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                RecordError::Conflict(format!(
                    "Contract {} already has a placement",
                    placement.contract_id
                ))
            } else {
                RecordError::from(e)
            }
        })?;

        info!(id = %placement.id, contract_id = %placement.contract_id, "Created placement");
        Ok(placement)
    }

    fn get(&self, id: &str) -> Result<Option<Placement>, RecordError> {
        let conn = self.db.lock();
        Self::fetch_where(&conn, "p.id", id)
    }

    fn for_contract(&self, contract_id: &str) -> Result<Option<Placement>, RecordError> {
        let conn = self.db.lock();
        Self::fetch_where(&conn, "p.contract_id", contract_id)
    }

    fn list(&self, collaborator_id: &str) -> Result<Vec<Placement>, RecordError> {
        let conn = self.db.lock();
        require_collaborator(&conn, collaborator_id)?;
        Self::query_all(&conn, "c.collaborator_id", collaborator_id)
    }

    fn reports_of(&self, supervisor_id: &str) -> Result<Vec<Placement>, RecordError> {
        let conn = self.db.lock();
        require_collaborator(&conn, supervisor_id)?;
        Self::query_all(&conn, "p.supervisor_id", supervisor_id)
    }

    fn update(&self, id: &str, update: PlacementUpdate) -> Result<Placement, RecordError> {
        let conn = self.db.lock();

        let current = Self::fetch_where(&conn, "p.id", id)?
            .ok_or_else(|| RecordError::not_found(ENTITY, id))?;
        if update.is_empty() {
            return Ok(current);
        }

        let mut placement = current.clone();
        if let Some(position_id) = update.position_id {
            placement.position_id = position_id;
        }
        if let Some(unit_id) = update.unit_id {
            placement.unit_id = unit_id;
        }
        if let Some(responsibility_level_id) = update.responsibility_level_id {
            placement.responsibility_level_id = responsibility_level_id;
        }
        if let Some(supervisor_id) = update.supervisor_id {
            placement.supervisor_id = optional_text(supervisor_id);
        }
        if let Some(cost_center_id) = update.cost_center_id {
            placement.cost_center_id = cost_center_id;
        }
        Self::validate(&conn, &placement)?;
        placement.updated_at = now();

        conn.execute(
            "UPDATE placements SET position_id = ?, unit_id = ?, responsibility_level_id = ?, supervisor_id = ?, cost_center_id = ?, updated_at = ? WHERE id = ?",
            params![
                placement.position_id,
                placement.unit_id,
                placement.responsibility_level_id,
                placement.supervisor_id,
                placement.cost_center_id,
                format_timestamp(&placement.updated_at),
                id,
            ],
        )?;

        debug!(id, "Updated placement");
        Ok(placement)
    }

    fn delete(&self, id: &str) -> Result<Placement, RecordError> {
        let conn = self.db.lock();

        let placement = Self::fetch_where(&conn, "p.id", id)?
            .ok_or_else(|| RecordError::not_found(ENTITY, id))?;
        conn.execute("DELETE FROM placements WHERE id = ?", params![id])?;

        info!(id, contract_id = %placement.contract_id, "Deleted placement");
        Ok(placement)
    }
}
