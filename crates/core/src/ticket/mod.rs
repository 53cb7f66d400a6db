//! Help-desk tickets and their tracked-field history.
//!
//! Changes to the assignee, stage and difficulty of a ticket are recorded as
//! [`HistoryEntry`] rows in the same transaction as the change, so the stored
//! state can always be reconstructed with [`replay`]. Each ticket also carries
//! a thread of [`TicketMessage`]s.

mod history;
mod sqlite_store;
mod store;
mod types;

pub use history::{initial_value, next_timestamp, replay, tracked_changes, value_at};
pub use sqlite_store::SqliteTicketStore;
pub use store::{TicketError, TicketFilter, TicketStore};
pub use types::{
    CreateMessageRequest, CreateTicketRequest, FieldChange, HistoryEntry, Ticket, TicketMessage,
    TicketUpdate, TrackedField, UpdateOutcome,
};
