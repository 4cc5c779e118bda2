//! `MatchStore` wrapper that loses conditional writes or fails sweeps on
//! demand, delegating everything else to a `MemoryStore`.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use playtogether::domain::{Area, Game, GameDraft, PlayRequest, PlayRequestDraft};
use playtogether::errors::domain::{DomainError, InfraErrorKind};
use playtogether::repos::{
    ConditionalStore, ExpiryReport, MatchStore, MemoryStore, Versioned, WriteOutcome,
};
use time::OffsetDateTime;
use uuid::Uuid;

const ALWAYS: u32 = u32::MAX;

#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    stale_writes: AtomicU32,
    failing_sweeps: AtomicU32,
    write_attempts: AtomicU32,
    sweep_attempts: AtomicU32,
}

/// Decrement a countdown unless it is exhausted or pinned at [`ALWAYS`].
fn take(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
            0 => None,
            ALWAYS => Some(ALWAYS),
            n => Some(n - 1),
        })
        .is_ok()
}

impl FlakyStore {
    /// The next `n` conditional writes report `Stale`.
    pub fn stale_times(n: u32) -> Self {
        let store = Self::default();
        store.stale_writes.store(n, Ordering::SeqCst);
        store
    }

    pub fn always_stale() -> Self {
        Self::stale_times(ALWAYS)
    }

    /// Every expiry sweep fails with an infra error.
    pub fn failing_sweeps() -> Self {
        let store = Self::default();
        store.failing_sweeps.store(ALWAYS, Ordering::SeqCst);
        store
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn write_attempts(&self) -> u32 {
        self.write_attempts.load(Ordering::SeqCst)
    }

    pub fn sweep_attempts(&self) -> u32 {
        self.sweep_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConditionalStore<Uuid, Game> for FlakyStore {
    async fn read(&self, key: &Uuid) -> Result<Option<Versioned<Game>>, DomainError> {
        self.inner.read(key).await
    }

    async fn write_if(
        &self,
        key: &Uuid,
        value: &Game,
        expected_version: i32,
    ) -> Result<WriteOutcome<Game>, DomainError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if take(&self.stale_writes) {
            return Ok(WriteOutcome::Stale);
        }
        self.inner.write_if(key, value, expected_version).await
    }

    fn missing(&self, key: &Uuid) -> DomainError {
        self.inner.missing(key)
    }
}

#[async_trait]
impl MatchStore for FlakyStore {
    async fn upsert_play_request(
        &self,
        draft: &PlayRequestDraft,
        now: OffsetDateTime,
    ) -> Result<PlayRequest, DomainError> {
        self.inner.upsert_play_request(draft, now).await
    }

    async fn find_play_request(&self, id: Uuid) -> Result<Option<PlayRequest>, DomainError> {
        self.inner.find_play_request(id).await
    }

    async fn find_play_request_for(
        &self,
        requester_id: Uuid,
        activity: &str,
    ) -> Result<Option<PlayRequest>, DomainError> {
        self.inner.find_play_request_for(requester_id, activity).await
    }

    async fn play_requests_in_area(
        &self,
        activity: &str,
        area: &Area,
    ) -> Result<Vec<PlayRequest>, DomainError> {
        self.inner.play_requests_in_area(activity, area).await
    }

    async fn create_game(
        &self,
        draft: &GameDraft,
        now: OffsetDateTime,
    ) -> Result<Versioned<Game>, DomainError> {
        self.inner.create_game(draft, now).await
    }

    async fn open_games_in_area(
        &self,
        activity: &str,
        area: &Area,
    ) -> Result<Vec<Versioned<Game>>, DomainError> {
        self.inner.open_games_in_area(activity, area).await
    }

    async fn games_for_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<Versioned<Game>>, DomainError> {
        self.inner.games_for_requester(requester_id).await
    }

    async fn expire_play_requests(
        &self,
        now: OffsetDateTime,
    ) -> Result<ExpiryReport, DomainError> {
        self.sweep_attempts.fetch_add(1, Ordering::SeqCst);
        if take(&self.failing_sweeps) {
            return Err(DomainError::infra(
                InfraErrorKind::DbUnavailable,
                "injected sweep failure",
            ));
        }
        self.inner.expire_play_requests(now).await
    }
}
