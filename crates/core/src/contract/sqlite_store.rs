//! SQLite-backed contract store.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{Contract, ContractStore, ContractUpdate, CreateContractRequest};
use crate::db::{date_column, format_timestamp, now, optional_date_column, timestamp_column, Database};
use crate::record::{
    check_optional_reference, check_reference, optional_text, require_collaborator, RecordError,
};
use crate::reference::ReferenceKind;

const ENTITY: &str = "Contract";

const SELECT_COLUMNS: &str = "SELECT id, collaborator_id, start_date, end_date, base_salary, contract_type_id, expiry_date, pension_fund_id, health_insurance_id, bank_id, account_type_id, account_number, created_at, updated_at FROM contracts";

/// SQLite-backed contract store.
pub struct SqliteContractStore {
    db: Database,
}

impl SqliteContractStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_contract(row: &rusqlite::Row) -> rusqlite::Result<Contract> {
        Ok(Contract {
            id: row.get(0)?,
            collaborator_id: row.get(1)?,
            start_date: date_column(row, 2)?,
            end_date: optional_date_column(row, 3)?,
            base_salary: row.get(4)?,
            contract_type_id: row.get(5)?,
            expiry_date: optional_date_column(row, 6)?,
            pension_fund_id: row.get(7)?,
            health_insurance_id: row.get(8)?,
            bank_id: row.get(9)?,
            account_type_id: row.get(10)?,
            account_number: row.get(11)?,
            created_at: timestamp_column(row, 12)?,
            updated_at: timestamp_column(row, 13)?,
        })
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<Contract>, RecordError> {
        Ok(conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_COLUMNS),
                params![id],
                Self::row_to_contract,
            )
            .optional()?)
    }

    /// Field rules that span more than one column, then lookup existence.
    fn validate(conn: &Connection, contract: &Contract) -> Result<(), RecordError> {
        if let Some(end) = contract.end_date {
            if end < contract.start_date {
                return Err(RecordError::invalid(ENTITY, "end_date is before start_date"));
            }
        }
        if let Some(expiry) = contract.expiry_date {
            if expiry < contract.start_date {
                return Err(RecordError::invalid(
                    ENTITY,
                    "expiry_date is before start_date",
                ));
            }
        }
        if contract.base_salary.is_some_and(|salary| salary < 0) {
            return Err(RecordError::invalid(ENTITY, "base_salary cannot be negative"));
        }
        if contract.account_number.is_some()
            && (contract.bank_id.is_none() || contract.account_type_id.is_none())
        {
            return Err(RecordError::invalid(
                ENTITY,
                "account_number requires bank_id and account_type_id",
            ));
        }

        check_reference(
            conn,
            "contract_type_id",
            ReferenceKind::ContractType,
            contract.contract_type_id,
        )?;
        check_reference(
            conn,
            "pension_fund_id",
            ReferenceKind::PensionFund,
            contract.pension_fund_id,
        )?;
        check_reference(
            conn,
            "health_insurance_id",
            ReferenceKind::HealthInsurance,
            contract.health_insurance_id,
        )?;
        check_optional_reference(conn, "bank_id", ReferenceKind::Bank, contract.bank_id)?;
        check_optional_reference(
            conn,
            "account_type_id",
            ReferenceKind::AccountType,
            contract.account_type_id,
        )
    }

    fn apply_update(current: &Contract, update: ContractUpdate) -> Contract {
        let mut contract = current.clone();

        if let Some(start_date) = update.start_date {
            contract.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            contract.end_date = end_date;
        }
        if let Some(base_salary) = update.base_salary {
            contract.base_salary = base_salary;
        }
        if let Some(contract_type_id) = update.contract_type_id {
            contract.contract_type_id = contract_type_id;
        }
        if let Some(expiry_date) = update.expiry_date {
            contract.expiry_date = expiry_date;
        }
        if let Some(pension_fund_id) = update.pension_fund_id {
            contract.pension_fund_id = pension_fund_id;
        }
        if let Some(health_insurance_id) = update.health_insurance_id {
            contract.health_insurance_id = health_insurance_id;
        }
        if let Some(bank_id) = update.bank_id {
            contract.bank_id = bank_id;
        }
        if let Some(account_type_id) = update.account_type_id {
            contract.account_type_id = account_type_id;
        }
        if let Some(account_number) = update.account_number {
            contract.account_number = optional_text(account_number);
        }

        contract
    }
}

impl ContractStore for SqliteContractStore {
    fn create(
        &self,
        collaborator_id: &str,
        request: CreateContractRequest,
    ) -> Result<Contract, RecordError> {
        let conn = self.db.lock();
        require_collaborator(&conn, collaborator_id)?;

        let now = now();
        let contract = Contract {
            id: uuid::Uuid::new_v4().to_string(),
            collaborator_id: collaborator_id.to_string(),
            start_date: request.start_date,
            end_date: request.end_date,
            base_salary: request.base_salary,
            contract_type_id: request.contract_type_id,
            expiry_date: request.expiry_date,
            pension_fund_id: request.pension_fund_id,
            health_insurance_id: request.health_insurance_id,
            bank_id: request.bank_id,
            account_type_id: request.account_type_id,
            account_number: optional_text(request.account_number),
            created_at: now,
            updated_at: now,
        };
        Self::validate(&conn, &contract)?;

        conn.execute(
            "INSERT INTO contracts (id, collaborator_id, start_date, end_date, base_salary, contract_type_id, expiry_date, pension_fund_id, health_insurance_id, bank_id, account_type_id, account_number, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                contract.id,
                contract.collaborator_id,
                contract.start_date.to_string(),
                contract.end_date.map(|d| d.to_string()),
                contract.base_salary,
                contract.contract_type_id,
                contract.expiry_date.map(|d| d.to_string()),
                contract.pension_fund_id,
                contract.health_insurance_id,
                contract.bank_id,
                contract.account_type_id,
                contract.account_number,
                format_timestamp(&now),
                format_timestamp(&now),
            ],
        )?;

        info!(id = %contract.id, collaborator_id, "Created contract");
        Ok(contract)
    }

    fn get(&self, id: &str) -> Result<Option<Contract>, RecordError> {
        let conn = self.db.lock();
        Self::fetch(&conn, id)
    }

    fn list(&self, collaborator_id: &str) -> Result<Vec<Contract>, RecordError> {
        let conn = self.db.lock();
        require_collaborator(&conn, collaborator_id)?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE collaborator_id = ? ORDER BY start_date DESC, created_at DESC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![collaborator_id], Self::row_to_contract)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn update(&self, id: &str, update: ContractUpdate) -> Result<Contract, RecordError> {
        let conn = self.db.lock();

        let current = Self::fetch(&conn, id)?.ok_or_else(|| RecordError::not_found(ENTITY, id))?;
        if update.is_empty() {
            return Ok(current);
        }

        let mut contract = Self::apply_update(&current, update);
        Self::validate(&conn, &contract)?;
        contract.updated_at = now();

        conn.execute(
            "UPDATE contracts SET start_date = ?, end_date = ?, base_salary = ?, contract_type_id = ?, expiry_date = ?, pension_fund_id = ?, health_insurance_id = ?, bank_id = ?, account_type_id = ?, account_number = ?, updated_at = ? WHERE id = ?",
            params![
                contract.start_date.to_string(),
                contract.end_date.map(|d| d.to_string()),
                contract.base_salary,
                contract.contract_type_id,
                contract.expiry_date.map(|d| d.to_string()),
                contract.pension_fund_id,
                contract.health_insurance_id,
                contract.bank_id,
                contract.account_type_id,
                contract.account_number,
                format_timestamp(&contract.updated_at),
                id,
            ],
        )?;

        debug!(id, "Updated contract");
        Ok(contract)
    }

    fn delete(&self, id: &str) -> Result<Contract, RecordError> {
        let conn = self.db.lock();

        let contract = Self::fetch(&conn, id)?.ok_or_else(|| RecordError::not_found(ENTITY, id))?;
        conn.execute("DELETE FROM contracts WHERE id = ?", params![id])?;

        info!(id, collaborator_id = %contract.collaborator_id, "Deleted contract");
        Ok(contract)
    }
}
