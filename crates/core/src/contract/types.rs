//! Contract data types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_util::nullable;

/// An employment contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contract {
    pub id: String,
    pub collaborator_id: String,
    pub start_date: NaiveDate,
    /// Last day worked, once the contract has ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Monthly base salary in CLP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_salary: Option<i64>,
    pub contract_type_id: i64,
    /// Scheduled end of a fixed-term contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    pub pension_fund_id: i64,
    pub health_insurance_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Whether the contract covers the given day.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.is_none_or(|end| date <= end)
    }
}

/// Request to create a contract for a collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContractRequest {
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub base_salary: Option<i64>,
    pub contract_type_id: i64,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    pub pension_fund_id: i64,
    pub health_insurance_id: i64,
    #[serde(default)]
    pub bank_id: Option<i64>,
    #[serde(default)]
    pub account_type_id: Option<i64>,
    #[serde(default)]
    pub account_number: Option<String>,
}

/// Partial update of a contract.
///
/// Absent fields are left untouched. For optional fields, an explicit JSON
/// `null` clears the value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContractUpdate {
    pub start_date: Option<NaiveDate>,
    #[serde(deserialize_with = "nullable")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "nullable")]
    pub base_salary: Option<Option<i64>>,
    pub contract_type_id: Option<i64>,
    #[serde(deserialize_with = "nullable")]
    pub expiry_date: Option<Option<NaiveDate>>,
    pub pension_fund_id: Option<i64>,
    pub health_insurance_id: Option<i64>,
    #[serde(deserialize_with = "nullable")]
    pub bank_id: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub account_type_id: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub account_number: Option<Option<String>>,
}

impl ContractUpdate {
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.base_salary.is_none()
            && self.contract_type_id.is_none()
            && self.expiry_date.is_none()
            && self.pension_fund_id.is_none()
            && self.health_insurance_id.is_none()
            && self.bank_id.is_none()
            && self.account_type_id.is_none()
            && self.account_number.is_none()
    }
}
