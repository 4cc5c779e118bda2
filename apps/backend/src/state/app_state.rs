use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::MatchConfig;
use crate::infra::cell_lock::CellLocks;
use crate::repos::{MatchStore, MemoryStore};
use crate::services::{ExpirySweeper, GameService, MatchService, PlayRequestService};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Database connection; `None` when running on the in-process store
    pub db: Option<DatabaseConnection>,
    store: Arc<dyn MatchStore>,
    config: Arc<MatchConfig>,
    locks: Arc<CellLocks>,
}

impl AppState {
    pub fn new(
        db: Option<DatabaseConnection>,
        store: Arc<dyn MatchStore>,
        config: MatchConfig,
    ) -> Self {
        Self {
            db,
            store,
            config: Arc::new(config),
            locks: Arc::new(CellLocks::new()),
        }
    }

    /// In-process store with default matching config.
    pub fn in_memory() -> Self {
        Self::new(None, Arc::new(MemoryStore::new()), MatchConfig::default())
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }

    pub fn store(&self) -> Arc<dyn MatchStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn matching(&self) -> MatchService {
        MatchService::new(self.store(), Arc::clone(&self.config), Arc::clone(&self.locks))
    }

    pub fn play_requests(&self) -> PlayRequestService {
        PlayRequestService::new(self.store(), Arc::clone(&self.config))
    }

    pub fn games(&self) -> GameService {
        GameService::new(self.store(), Arc::clone(&self.config))
    }

    pub fn sweeper(&self) -> ExpirySweeper {
        ExpirySweeper::new(self.store(), self.config.sweep_interval)
    }
}
