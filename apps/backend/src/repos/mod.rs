//! Storage contracts for the matching core.
//!
//! Services only see [`MatchStore`]; `memory` and `sea_store` are the two
//! implementations.

use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{Area, Game, GameDraft, PlayRequest, PlayRequestDraft};
use crate::errors::domain::DomainError;

pub mod conditional;
pub mod memory;
pub mod sea_store;

pub use conditional::{
    update_with_retry, ConditionalStore, RetryPolicy, UpdateOutcome, Versioned, WriteOutcome,
};
pub use memory::MemoryStore;
pub use sea_store::SeaStore;

/// What one expiry pass removed or touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpiryReport {
    pub expired_requests: usize,
    pub games_updated: usize,
    pub games_deleted: usize,
}

/// Persistence needed by ingestion, the game lifecycle and the sweeper.
///
/// Games are keyed by id and versioned; every write to a game goes through
/// [`ConditionalStore::write_if`] except the expiry cascade, which runs as a
/// single unit inside the store.
#[async_trait]
pub trait MatchStore: ConditionalStore<Uuid, Game> {
    /// Insert or replace the request for (requester, activity). The id of an
    /// existing request is kept.
    async fn upsert_play_request(
        &self,
        draft: &PlayRequestDraft,
        now: OffsetDateTime,
    ) -> Result<PlayRequest, DomainError>;

    async fn find_play_request(&self, id: Uuid) -> Result<Option<PlayRequest>, DomainError>;

    async fn find_play_request_for(
        &self,
        requester_id: Uuid,
        activity: &str,
    ) -> Result<Option<PlayRequest>, DomainError>;

    /// Requests for `activity` whose location falls in `area`.
    async fn play_requests_in_area(
        &self,
        activity: &str,
        area: &Area,
    ) -> Result<Vec<PlayRequest>, DomainError>;

    /// Persist a new CREATED game at version 1.
    async fn create_game(
        &self,
        draft: &GameDraft,
        now: OffsetDateTime,
    ) -> Result<Versioned<Game>, DomainError>;

    /// CREATED games for `activity` located in `area`.
    async fn open_games_in_area(
        &self,
        activity: &str,
        area: &Area,
    ) -> Result<Vec<Versioned<Game>>, DomainError>;

    /// Games holding any request of `requester_id`, newest first.
    async fn games_for_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<Versioned<Game>>, DomainError>;

    /// Delete requests with `expires_at < now`, strip them from games, delete
    /// emptied games. All or nothing.
    async fn expire_play_requests(
        &self,
        now: OffsetDateTime,
    ) -> Result<ExpiryReport, DomainError>;
}
