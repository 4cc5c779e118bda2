//! `MatchStore` over SeaORM. Each operation runs in its own transaction;
//! the expiry cascade is a single transaction.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use super::conditional::{ConditionalStore, Versioned, WriteOutcome};
use super::{ExpiryReport, MatchStore};
use crate::adapters::games_sea::{self, GameCreate, GameUpdate, GameWithParticipants};
use crate::adapters::play_requests_sea::{self, PlayRequestUpsert};
use crate::domain::{Area, Game, GameDraft, GameStatus, PlayRequest, PlayRequestDraft};
use crate::entities::games::GameStatus as DbGameStatus;
use crate::entities::play_requests;
use crate::errors::domain::{DomainError, NotFoundKind};

#[derive(Clone)]
pub struct SeaStore {
    db: DatabaseConnection,
}

impl SeaStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Commit on `Ok`, roll back on `Err`. A failed rollback is logged and the
/// original error wins.
async fn finish<T>(
    txn: DatabaseTransaction,
    out: Result<T, DomainError>,
) -> Result<T, DomainError> {
    match out {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rb) = txn.rollback().await {
                warn!(error = %rb, "rollback failed");
            }
            Err(e)
        }
    }
}

fn status_to_db(status: GameStatus) -> DbGameStatus {
    match status {
        GameStatus::Created => DbGameStatus::Created,
        GameStatus::Pending => DbGameStatus::Pending,
        GameStatus::Active => DbGameStatus::Active,
    }
}

fn status_from_db(status: DbGameStatus) -> GameStatus {
    match status {
        DbGameStatus::Created => GameStatus::Created,
        DbGameStatus::Pending => GameStatus::Pending,
        DbGameStatus::Active => GameStatus::Active,
    }
}

fn to_request(model: play_requests::Model) -> PlayRequest {
    PlayRequest {
        id: model.id,
        requester_id: model.requester_id,
        activity: model.activity,
        lat: model.lat,
        lon: model.lon,
        range_km: model.range_km,
        starts_at: model.starts_at,
        expires_at: model.expires_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn to_game((game, participants): GameWithParticipants) -> Versioned<Game> {
    let confirmed: BTreeSet<Uuid> = participants
        .iter()
        .filter(|p| p.confirmed)
        .map(|p| p.play_request_id)
        .collect();
    let participants: BTreeSet<Uuid> = participants.iter().map(|p| p.play_request_id).collect();
    Versioned::new(
        Game {
            id: game.id,
            status: status_from_db(game.status),
            activity: game.activity,
            lat: game.lat,
            lon: game.lon,
            participants,
            confirmed,
            created_at: game.created_at,
            updated_at: game.updated_at,
        },
        game.version,
    )
}

/// The row is addressed by `id`, never by `game.id`.
fn update_dto(id: Uuid, game: &Game, expected_version: i32) -> GameUpdate {
    GameUpdate {
        id,
        status: status_to_db(game.status),
        participants: game
            .participants
            .iter()
            .map(|id| (*id, game.confirmed.contains(id)))
            .collect(),
        expected_version,
    }
}

fn is_lock_conflict(e: &DbErr) -> bool {
    matches!(e, DbErr::Custom(msg) if msg.starts_with("OPTIMISTIC_LOCK:"))
}

#[async_trait]
impl ConditionalStore<Uuid, Game> for SeaStore {
    async fn read(&self, key: &Uuid) -> Result<Option<Versioned<Game>>, DomainError> {
        let row = games_sea::find_with_participants(&self.db, *key).await?;
        Ok(row.map(to_game))
    }

    async fn write_if(
        &self,
        key: &Uuid,
        value: &Game,
        expected_version: i32,
    ) -> Result<WriteOutcome<Game>, DomainError> {
        let txn = self.db.begin().await?;
        let update = update_dto(*key, value, expected_version);
        let out = match games_sea::update_game(&txn, update).await {
            Ok(row) => Ok(WriteOutcome::Written(to_game(row))),
            Err(DbErr::RecordNotFound(_)) => Err(self.missing(key)),
            Err(e) if is_lock_conflict(&e) => Ok(WriteOutcome::Stale),
            Err(e) => Err(e.into()),
        };
        // a stale write changed nothing; committing the empty txn is fine
        finish(txn, out).await
    }

    fn missing(&self, key: &Uuid) -> DomainError {
        DomainError::not_found(NotFoundKind::Game, format!("Game {key} not found"))
    }
}

#[async_trait]
impl MatchStore for SeaStore {
    async fn upsert_play_request(
        &self,
        draft: &PlayRequestDraft,
        now: OffsetDateTime,
    ) -> Result<PlayRequest, DomainError> {
        let dto = PlayRequestUpsert {
            requester_id: draft.requester_id,
            activity: draft.activity.clone(),
            lat: draft.lat,
            lon: draft.lon,
            range_km: draft.range_km,
            starts_at: draft.starts_at,
            expires_at: draft.expires_at,
        };
        let model = play_requests_sea::upsert(&self.db, dto, now).await?;
        Ok(to_request(model))
    }

    async fn find_play_request(&self, id: Uuid) -> Result<Option<PlayRequest>, DomainError> {
        Ok(play_requests_sea::find_by_id(&self.db, id)
            .await?
            .map(to_request))
    }

    async fn find_play_request_for(
        &self,
        requester_id: Uuid,
        activity: &str,
    ) -> Result<Option<PlayRequest>, DomainError> {
        Ok(
            play_requests_sea::find_by_requester_activity(&self.db, requester_id, activity)
                .await?
                .map(to_request),
        )
    }

    async fn play_requests_in_area(
        &self,
        activity: &str,
        area: &Area,
    ) -> Result<Vec<PlayRequest>, DomainError> {
        let rows = play_requests_sea::find_in_area(
            &self.db,
            activity,
            area.lat_min,
            area.lat_max,
            &area.lon_ranges(),
        )
        .await?;
        Ok(rows.into_iter().map(to_request).collect())
    }

    async fn create_game(
        &self,
        draft: &GameDraft,
        now: OffsetDateTime,
    ) -> Result<Versioned<Game>, DomainError> {
        let dto = GameCreate {
            activity: draft.activity.clone(),
            lat: draft.location.lat,
            lon: draft.location.lon,
            participants: draft.participants.iter().copied().collect(),
        };
        let txn = self.db.begin().await?;
        let out = games_sea::create_game(&txn, dto, now)
            .await
            .map(to_game)
            .map_err(DomainError::from);
        finish(txn, out).await
    }

    async fn open_games_in_area(
        &self,
        activity: &str,
        area: &Area,
    ) -> Result<Vec<Versioned<Game>>, DomainError> {
        let rows = games_sea::find_open_in_area(
            &self.db,
            activity,
            area.lat_min,
            area.lat_max,
            &area.lon_ranges(),
        )
        .await?;
        Ok(rows.into_iter().map(to_game).collect())
    }

    async fn games_for_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<Versioned<Game>>, DomainError> {
        let request_ids = play_requests_sea::find_ids_for_requester(&self.db, requester_id).await?;
        let game_ids = games_sea::game_ids_for_play_requests(&self.db, &request_ids).await?;
        let rows = games_sea::find_by_ids(&self.db, &game_ids).await?;
        Ok(rows.into_iter().map(to_game).collect())
    }

    async fn expire_play_requests(
        &self,
        now: OffsetDateTime,
    ) -> Result<ExpiryReport, DomainError> {
        let txn = self.db.begin().await?;
        let out = expire_in(&txn, now).await;
        finish(txn, out).await
    }
}

/// Conditional writes a sweep makes per game before giving up on the tick.
const SWEEP_WRITE_ATTEMPTS: u32 = 3;

enum Pruned {
    Missing,
    Emptied,
    Updated,
}

async fn expire_in(
    txn: &DatabaseTransaction,
    now: OffsetDateTime,
) -> Result<ExpiryReport, DomainError> {
    let expired = play_requests_sea::find_expired_ids(txn, now).await?;
    if expired.is_empty() {
        return Ok(ExpiryReport::default());
    }
    let expired_set: BTreeSet<Uuid> = expired.iter().copied().collect();

    let mut report = ExpiryReport {
        expired_requests: expired.len(),
        ..ExpiryReport::default()
    };

    let game_ids = games_sea::game_ids_for_play_requests(txn, &expired).await?;
    let mut emptied = Vec::new();
    for snapshot in games_sea::find_by_ids(txn, &game_ids).await? {
        let game_id = snapshot.0.id;
        match prune_game(txn, to_game(snapshot), &expired_set).await? {
            Pruned::Missing => {}
            Pruned::Emptied => emptied.push(game_id),
            Pruned::Updated => report.games_updated += 1,
        }
    }

    report.games_deleted = games_sea::delete_by_ids(txn, &emptied).await? as usize;
    games_sea::delete_participants_for_requests(txn, &expired).await?;
    play_requests_sea::delete_by_ids(txn, &expired).await?;

    Ok(report)
}

/// Drop `expired` from one game under its version guard. `stored` is the
/// snapshot loaded with the batch; a concurrent confirm or join that moved
/// the version since then forces a re-read.
async fn prune_game(
    txn: &DatabaseTransaction,
    mut stored: Versioned<Game>,
    expired: &BTreeSet<Uuid>,
) -> Result<Pruned, DomainError> {
    let game_id = stored.value.id;
    let mut attempt = 1;
    loop {
        let gone: Vec<Uuid> = stored
            .value
            .participants
            .intersection(expired)
            .copied()
            .collect();
        for id in gone {
            stored.value.remove_participant(id)?;
        }
        if stored.value.participants.is_empty() {
            return Ok(Pruned::Emptied);
        }

        let update = update_dto(game_id, &stored.value, stored.version);
        match games_sea::update_game(txn, update).await {
            Ok(_) => {
                debug!(
                    game_id = %game_id,
                    status = %stored.value.status,
                    "expired participants removed"
                );
                return Ok(Pruned::Updated);
            }
            Err(DbErr::RecordNotFound(_)) => return Ok(Pruned::Missing),
            Err(e) if is_lock_conflict(&e) && attempt < SWEEP_WRITE_ATTEMPTS => {
                debug!(game_id = %game_id, attempt, "game moved during sweep, re-reading");
                attempt += 1;
            }
            // out of attempts: the whole tick rolls back and runs again later
            Err(e) => return Err(e.into()),
        }

        let Some(row) = games_sea::find_with_participants(txn, game_id).await? else {
            return Ok(Pruned::Missing);
        };
        stored = to_game(row);
    }
}
