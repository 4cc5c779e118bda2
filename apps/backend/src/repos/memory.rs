//! In-process `MatchStore` used by tests and the `memory` deployment kind.
//!
//! All state sits behind one mutex that is never held across an await, so
//! every operation (including the expiry cascade) is atomic.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use time::OffsetDateTime;
use uuid::Uuid;

use super::conditional::{ConditionalStore, Versioned, WriteOutcome};
use super::{ExpiryReport, MatchStore};
use crate::domain::{Area, Game, GameDraft, GameStatus, PlayRequest, PlayRequestDraft};
use crate::errors::domain::{DomainError, NotFoundKind};

#[derive(Default)]
struct Inner {
    requests: HashMap<Uuid, PlayRequest>,
    by_requester: HashMap<(Uuid, String), Uuid>,
    games: HashMap<Uuid, Versioned<Game>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(games: &mut [Versioned<Game>]) {
    games.sort_by(|a, b| {
        b.value
            .created_at
            .cmp(&a.value.created_at)
            .then_with(|| a.value.id.cmp(&b.value.id))
    });
}

#[async_trait]
impl ConditionalStore<Uuid, Game> for MemoryStore {
    async fn read(&self, key: &Uuid) -> Result<Option<Versioned<Game>>, DomainError> {
        Ok(self.inner.lock().games.get(key).cloned())
    }

    async fn write_if(
        &self,
        key: &Uuid,
        value: &Game,
        expected_version: i32,
    ) -> Result<WriteOutcome<Game>, DomainError> {
        let mut inner = self.inner.lock();
        let Some(stored) = inner.games.get_mut(key) else {
            return Err(self.missing(key));
        };
        if stored.version != expected_version {
            return Ok(WriteOutcome::Stale);
        }
        let mut value = value.clone();
        value.id = *key;
        value.updated_at = OffsetDateTime::now_utc();
        *stored = Versioned::new(value, expected_version + 1);
        Ok(WriteOutcome::Written(stored.clone()))
    }

    fn missing(&self, key: &Uuid) -> DomainError {
        DomainError::not_found(NotFoundKind::Game, format!("Game {key} not found"))
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn upsert_play_request(
        &self,
        draft: &PlayRequestDraft,
        now: OffsetDateTime,
    ) -> Result<PlayRequest, DomainError> {
        let mut inner = self.inner.lock();
        let slot = (draft.requester_id, draft.activity.clone());
        let existing = inner
            .by_requester
            .get(&slot)
            .and_then(|id| inner.requests.get(id))
            .cloned();

        let request = PlayRequest {
            id: existing.as_ref().map_or_else(Uuid::new_v4, |r| r.id),
            requester_id: draft.requester_id,
            activity: draft.activity.clone(),
            lat: draft.lat,
            lon: draft.lon,
            range_km: draft.range_km,
            starts_at: draft.starts_at,
            expires_at: draft.expires_at,
            created_at: existing.as_ref().map_or(now, |r| r.created_at),
            updated_at: now,
        };
        inner.by_requester.insert(slot, request.id);
        inner.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_play_request(&self, id: Uuid) -> Result<Option<PlayRequest>, DomainError> {
        Ok(self.inner.lock().requests.get(&id).cloned())
    }

    async fn find_play_request_for(
        &self,
        requester_id: Uuid,
        activity: &str,
    ) -> Result<Option<PlayRequest>, DomainError> {
        let inner = self.inner.lock();
        Ok(inner
            .by_requester
            .get(&(requester_id, activity.to_string()))
            .and_then(|id| inner.requests.get(id))
            .cloned())
    }

    async fn play_requests_in_area(
        &self,
        activity: &str,
        area: &Area,
    ) -> Result<Vec<PlayRequest>, DomainError> {
        let inner = self.inner.lock();
        let mut found: Vec<PlayRequest> = inner
            .requests
            .values()
            .filter(|r| r.activity == activity && area.contains(&r.point()))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn create_game(
        &self,
        draft: &GameDraft,
        now: OffsetDateTime,
    ) -> Result<Versioned<Game>, DomainError> {
        let game = Game {
            id: Uuid::new_v4(),
            status: GameStatus::Created,
            activity: draft.activity.clone(),
            lat: draft.location.lat,
            lon: draft.location.lon,
            participants: draft.participants.clone(),
            confirmed: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        };
        let stored = Versioned::new(game, 1);
        self.inner
            .lock()
            .games
            .insert(stored.value.id, stored.clone());
        Ok(stored)
    }

    async fn open_games_in_area(
        &self,
        activity: &str,
        area: &Area,
    ) -> Result<Vec<Versioned<Game>>, DomainError> {
        let inner = self.inner.lock();
        let mut games: Vec<Versioned<Game>> = inner
            .games
            .values()
            .filter(|g| {
                g.value.status == GameStatus::Created
                    && g.value.activity == activity
                    && area.contains(&g.value.point())
            })
            .cloned()
            .collect();
        // oldest first so the longest-waiting game fills up first
        games.sort_by(|a, b| a.value.created_at.cmp(&b.value.created_at));
        Ok(games)
    }

    async fn games_for_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<Versioned<Game>>, DomainError> {
        let inner = self.inner.lock();
        let mine: BTreeSet<Uuid> = inner
            .requests
            .values()
            .filter(|r| r.requester_id == requester_id)
            .map(|r| r.id)
            .collect();
        let mut games: Vec<Versioned<Game>> = inner
            .games
            .values()
            .filter(|g| !g.value.participants.is_disjoint(&mine))
            .cloned()
            .collect();
        newest_first(&mut games);
        Ok(games)
    }

    async fn expire_play_requests(
        &self,
        now: OffsetDateTime,
    ) -> Result<ExpiryReport, DomainError> {
        let mut inner = self.inner.lock();
        let expired: BTreeSet<Uuid> = inner
            .requests
            .values()
            .filter(|r| r.is_expired(now))
            .map(|r| r.id)
            .collect();
        if expired.is_empty() {
            return Ok(ExpiryReport::default());
        }

        let mut report = ExpiryReport {
            expired_requests: expired.len(),
            ..ExpiryReport::default()
        };

        let mut emptied = Vec::new();
        for stored in inner.games.values_mut() {
            if stored.value.participants.is_disjoint(&expired) {
                continue;
            }
            for id in &expired {
                stored.value.remove_participant(*id)?;
            }
            if stored.value.participants.is_empty() {
                emptied.push(stored.value.id);
            } else {
                stored.value.updated_at = now;
                stored.version += 1;
                report.games_updated += 1;
            }
        }
        for id in emptied {
            inner.games.remove(&id);
            report.games_deleted += 1;
        }

        for id in &expired {
            if let Some(request) = inner.requests.remove(id) {
                inner
                    .by_requester
                    .remove(&(request.requester_id, request.activity));
            }
        }

        Ok(report)
    }
}
