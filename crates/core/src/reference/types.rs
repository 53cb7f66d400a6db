//! Reference data types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of a reference item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Ticket lifecycle stage.
    Stage,
    /// Ticket priority. `value` orders priorities.
    Priority,
    /// Ticket difficulty, optionally grouped under a ticket area.
    Difficulty,
    /// Ticket type (incident, request, ...).
    TicketType,
    /// Channel through which a ticket arrived.
    Origin,
    /// Area of work a difficulty belongs to.
    TicketArea,
    ContractType,
    /// Pension fund (AFP).
    PensionFund,
    /// Health insurance provider.
    HealthInsurance,
    Bank,
    /// Bank account type.
    AccountType,
    EducationType,
    Career,
    /// Completion status of an education record.
    EducationStatus,
    Institution,
    InstitutionType,
    /// Job position.
    Position,
    /// Organizational unit, optionally grouped under a functional area.
    Unit,
    FunctionalArea,
    ResponsibilityLevel,
    CostCenter,
    /// Kind of logged activity, optionally tied to a position.
    ActivityType,
    /// Project, optionally owned by a client.
    Project,
    Client,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 24] = [
        ReferenceKind::Stage,
        ReferenceKind::Priority,
        ReferenceKind::Difficulty,
        ReferenceKind::TicketType,
        ReferenceKind::Origin,
        ReferenceKind::TicketArea,
        ReferenceKind::ContractType,
        ReferenceKind::PensionFund,
        ReferenceKind::HealthInsurance,
        ReferenceKind::Bank,
        ReferenceKind::AccountType,
        ReferenceKind::EducationType,
        ReferenceKind::Career,
        ReferenceKind::EducationStatus,
        ReferenceKind::Institution,
        ReferenceKind::InstitutionType,
        ReferenceKind::Position,
        ReferenceKind::Unit,
        ReferenceKind::FunctionalArea,
        ReferenceKind::ResponsibilityLevel,
        ReferenceKind::CostCenter,
        ReferenceKind::ActivityType,
        ReferenceKind::Project,
        ReferenceKind::Client,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Stage => "stage",
            ReferenceKind::Priority => "priority",
            ReferenceKind::Difficulty => "difficulty",
            ReferenceKind::TicketType => "ticket_type",
            ReferenceKind::Origin => "origin",
            ReferenceKind::TicketArea => "ticket_area",
            ReferenceKind::ContractType => "contract_type",
            ReferenceKind::PensionFund => "pension_fund",
            ReferenceKind::HealthInsurance => "health_insurance",
            ReferenceKind::Bank => "bank",
            ReferenceKind::AccountType => "account_type",
            ReferenceKind::EducationType => "education_type",
            ReferenceKind::Career => "career",
            ReferenceKind::EducationStatus => "education_status",
            ReferenceKind::Institution => "institution",
            ReferenceKind::InstitutionType => "institution_type",
            ReferenceKind::Position => "position",
            ReferenceKind::Unit => "unit",
            ReferenceKind::FunctionalArea => "functional_area",
            ReferenceKind::ResponsibilityLevel => "responsibility_level",
            ReferenceKind::CostCenter => "cost_center",
            ReferenceKind::ActivityType => "activity_type",
            ReferenceKind::Project => "project",
            ReferenceKind::Client => "client",
        }
    }

    /// Kind an item's `parent_id` must point at, for kinds that group under
    /// another.
    pub fn parent_kind(&self) -> Option<ReferenceKind> {
        match self {
            ReferenceKind::Difficulty => Some(ReferenceKind::TicketArea),
            ReferenceKind::Institution => Some(ReferenceKind::InstitutionType),
            ReferenceKind::Unit => Some(ReferenceKind::FunctionalArea),
            ReferenceKind::ActivityType => Some(ReferenceKind::Position),
            ReferenceKind::Project => Some(ReferenceKind::Client),
            _ => None,
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReferenceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown reference kind: {}", s))
    }
}

/// A single reference data row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceItem {
    pub id: i64,
    pub kind: ReferenceKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    /// Item of [`ReferenceKind::parent_kind`] this item belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}
