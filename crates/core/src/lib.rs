pub mod activity;
pub mod auth;
pub mod collaborator;
pub mod config;
pub mod contract;
pub mod db;
pub mod education;
pub mod organization;
pub mod record;
pub mod reference;
pub mod run;
pub mod serde_util;
pub mod ticket;

pub use activity::{
    Activity, ActivityFilter, ActivityStore, ActivityUpdate, CreateActivityRequest,
    SqliteActivityStore,
};
pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use collaborator::{
    Collaborator, CollaboratorError, CollaboratorFilter, CollaboratorStore, CollaboratorUpdate,
    CreateCollaboratorRequest, SqliteCollaboratorStore,
};
pub use config::{
    load_config, load_config_from_str, validate_config, ApiKeyEntry, AuthConfig, AuthMethod,
    Config, ConfigError, DatabaseConfig, SanitizedConfig, ServerConfig, ValidationConfig,
};
pub use contract::{Contract, ContractStore, ContractUpdate, CreateContractRequest, SqliteContractStore};
pub use db::{Database, DatabaseError};
pub use education::{
    CreateEducationRequest, EducationRecord, EducationStore, EducationUpdate, SqliteEducationStore,
};
pub use organization::{
    CreatePlacementRequest, Placement, PlacementStore, PlacementUpdate, SqlitePlacementStore,
};
pub use record::RecordError;
pub use reference::{
    seed_defaults, CreateReferenceRequest, ReferenceCache, ReferenceError, ReferenceItem,
    ReferenceKind, ReferenceStore, ReferenceUpdate, SqliteReferenceStore,
};
pub use run::{compute_check_digit, is_valid_run, validate_run, Run, RunError, RunFormat};
pub use ticket::{
    initial_value, next_timestamp, replay, tracked_changes, value_at, CreateMessageRequest,
    CreateTicketRequest, FieldChange, HistoryEntry, SqliteTicketStore, Ticket, TicketError,
    TicketFilter, TicketMessage, TicketStore, TicketUpdate, TrackedField, UpdateOutcome,
};
