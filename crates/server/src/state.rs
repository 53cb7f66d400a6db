use std::sync::Arc;

use mesa_core::{
    ActivityStore, Authenticator, CollaboratorStore, Config, ContractStore, Database,
    EducationStore, PlacementStore, ReferenceCache, ReferenceError, ReferenceStore, RunFormat,
    SanitizedConfig, SqliteActivityStore, SqliteCollaboratorStore, SqliteContractStore,
    SqliteEducationStore, SqlitePlacementStore, SqliteReferenceStore, SqliteTicketStore,
    TicketStore,
};

/// Stores for the records a collaborator owns.
pub struct RecordStores {
    pub contracts: Arc<dyn ContractStore>,
    pub education: Arc<dyn EducationStore>,
    pub placements: Arc<dyn PlacementStore>,
    pub activities: Arc<dyn ActivityStore>,
}

impl RecordStores {
    pub fn sqlite(db: Database) -> Self {
        Self {
            contracts: Arc::new(SqliteContractStore::new(db.clone())),
            education: Arc::new(SqliteEducationStore::new(db.clone())),
            placements: Arc::new(SqlitePlacementStore::new(db.clone())),
            activities: Arc::new(SqliteActivityStore::new(db)),
        }
    }
}

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    collaborators: Arc<dyn CollaboratorStore>,
    tickets: Arc<dyn TicketStore>,
    references: Arc<dyn ReferenceStore>,
    reference_cache: ReferenceCache,
    records: RecordStores,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        collaborators: Arc<dyn CollaboratorStore>,
        tickets: Arc<dyn TicketStore>,
        references: Arc<dyn ReferenceStore>,
        records: RecordStores,
    ) -> Result<Self, ReferenceError> {
        let reference_cache = ReferenceCache::load(references.as_ref())?;
        Ok(Self {
            config,
            authenticator,
            collaborators,
            tickets,
            references,
            reference_cache,
            records,
        })
    }

    /// Build the state with SQLite stores sharing one database.
    pub fn with_database(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        db: Database,
    ) -> Result<Self, ReferenceError> {
        let run_format = config.validation.run_format;
        Self::new(
            config,
            authenticator,
            Arc::new(SqliteCollaboratorStore::new(db.clone(), run_format)),
            Arc::new(SqliteTicketStore::new(db.clone())),
            Arc::new(SqliteReferenceStore::new(db.clone())),
            RecordStores::sqlite(db),
        )
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn run_format(&self) -> RunFormat {
        self.config.validation.run_format
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn collaborators(&self) -> &dyn CollaboratorStore {
        self.collaborators.as_ref()
    }

    pub fn tickets(&self) -> &dyn TicketStore {
        self.tickets.as_ref()
    }

    pub fn references(&self) -> &dyn ReferenceStore {
        self.references.as_ref()
    }

    pub fn contracts(&self) -> &dyn ContractStore {
        self.records.contracts.as_ref()
    }

    pub fn education(&self) -> &dyn EducationStore {
        self.records.education.as_ref()
    }

    pub fn placements(&self) -> &dyn PlacementStore {
        self.records.placements.as_ref()
    }

    pub fn activities(&self) -> &dyn ActivityStore {
        self.records.activities.as_ref()
    }

    pub fn reference_cache(&self) -> &ReferenceCache {
        &self.reference_cache
    }

    /// Reload the reference cache after a write through the store.
    pub fn refresh_reference_cache(&self) -> Result<(), ReferenceError> {
        self.reference_cache.refresh(self.references.as_ref())
    }
}
