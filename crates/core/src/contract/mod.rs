//! Employment contracts of a collaborator.
//!
//! A collaborator may hold several contracts over time. Lookup columns
//! (contract type, pension fund, health insurance, bank, account type) are
//! reference items.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteContractStore;
pub use store::ContractStore;
pub use types::{Contract, ContractUpdate, CreateContractRequest};
