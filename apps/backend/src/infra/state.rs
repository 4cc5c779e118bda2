use std::sync::Arc;

use crate::config::db::{DbKind, DbOwner, DbProfile};
use crate::config::MatchConfig;
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::repos::{MatchStore, MemoryStore, SeaStore};
use crate::state::app_state::AppState;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    config: MatchConfig,
    db: Option<(DbProfile, DbKind)>,
    store: Option<Arc<dyn MatchStore>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            config: MatchConfig::default(),
            db: None,
            store: None,
        }
    }

    /// Back the state with a database. `DbKind::Memory` means no database.
    pub fn with_db(mut self, profile: DbProfile, kind: DbKind) -> Self {
        self.db = Some((profile, kind));
        self
    }

    /// Use a ready-made store; wins over `with_db`.
    pub fn with_store(mut self, store: Arc<dyn MatchStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        if let Some(store) = self.store {
            return Ok(AppState::new(None, store, self.config));
        }
        match self.db {
            Some((profile, kind)) if kind != DbKind::Memory => {
                // single entrypoint: connect + migrate
                let conn = bootstrap_db(kind, profile, DbOwner::App).await?;
                let store: Arc<dyn MatchStore> = Arc::new(SeaStore::new(conn.clone()));
                Ok(AppState::new(Some(conn), store, self.config))
            }
            _ => Ok(AppState::new(
                None,
                Arc::new(MemoryStore::new()),
                self.config,
            )),
        }
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
