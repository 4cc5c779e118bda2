//! Ping ingestion: store the request, look around, and either join an open
//! game, form a new one, or report that nobody is close enough yet.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::MatchConfig;
use crate::domain::candidates::filter_candidates;
use crate::domain::{area, Game, GameDraft, PlayRequest, PlayRequestDraft};
use crate::errors::domain::{DomainError, ValidationKind};
use crate::infra::cell_lock::CellLocks;
use crate::repos::{update_with_retry, MatchStore, Versioned};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingOutcome {
    pub found: bool,
    pub play_request_id: Uuid,
    pub games: Vec<Versioned<Game>>,
}

pub struct MatchService {
    store: Arc<dyn MatchStore>,
    config: Arc<MatchConfig>,
    locks: Arc<CellLocks>,
}

impl MatchService {
    pub fn new(
        store: Arc<dyn MatchStore>,
        config: Arc<MatchConfig>,
        locks: Arc<CellLocks>,
    ) -> Self {
        Self {
            store,
            config,
            locks,
        }
    }

    pub async fn ingest_ping(
        &self,
        draft: PlayRequestDraft,
        now: OffsetDateTime,
    ) -> Result<PingOutcome, DomainError> {
        let draft = draft.validate(self.config.max_range_km, now)?;
        let area = area::calculate(draft.point(), draft.range_km)?;

        let request = self.store.upsert_play_request(&draft, now).await?;
        debug!(
            play_request_id = %request.id,
            activity = %request.activity,
            area = %area,
            "ping stored"
        );

        // held until the join/create decision is persisted
        let _cells = self.locks.lock_area(&request.activity, &area).await;

        let mine: Vec<Versioned<Game>> = self
            .store
            .games_for_requester(request.requester_id)
            .await?
            .into_iter()
            .filter(|g| g.value.participants.contains(&request.id))
            .collect();
        if !mine.is_empty() {
            return Ok(PingOutcome {
                found: true,
                play_request_id: request.id,
                games: mine,
            });
        }

        let candidates = self
            .store
            .play_requests_in_area(&request.activity, &area)
            .await?;
        let nearby = filter_candidates(&request, candidates, self.config.range_policy, now);
        let nearby_ids: BTreeSet<Uuid> = nearby.iter().map(|c| c.id).collect();

        if let Some(joined) = self.join_open_game(&request, &area, &nearby_ids).await? {
            return Ok(PingOutcome {
                found: true,
                play_request_id: request.id,
                games: vec![joined],
            });
        }

        let participants = nearby.len() + 1;
        if !self
            .config
            .thresholds
            .at_threshold(&request.activity, participants)
        {
            debug!(
                play_request_id = %request.id,
                participants,
                needed = self.config.thresholds.min_participants(&request.activity),
                "not enough players nearby yet"
            );
            return Ok(PingOutcome {
                found: false,
                play_request_id: request.id,
                games: Vec::new(),
            });
        }

        let mut members = nearby_ids;
        members.insert(request.id);
        let game = self
            .store
            .create_game(
                &GameDraft {
                    activity: request.activity.clone(),
                    location: request.point(),
                    participants: members,
                },
                now,
            )
            .await?;
        info!(
            game_id = %game.value.id,
            activity = %game.value.activity,
            participants = game.value.participants.len(),
            "game formed"
        );

        Ok(PingOutcome {
            found: true,
            play_request_id: request.id,
            games: vec![game],
        })
    }

    /// Join the oldest open game that already holds one of `nearby`.
    async fn join_open_game(
        &self,
        request: &PlayRequest,
        area: &area::Area,
        nearby: &BTreeSet<Uuid>,
    ) -> Result<Option<Versioned<Game>>, DomainError> {
        if nearby.is_empty() {
            return Ok(None);
        }
        let open = self
            .store
            .open_games_in_area(&request.activity, area)
            .await?;
        let Some(target) = open
            .into_iter()
            .find(|g| !g.value.participants.is_disjoint(nearby))
        else {
            return Ok(None);
        };

        let joined = match update_with_retry(
            self.store.as_ref(),
            &target.value.id,
            &self.config.confirm_retry,
            |game| game.add_participant(request.id),
        )
        .await
        {
            Ok(outcome) => outcome.into_inner(),
            // confirmed out from under us; no longer open
            Err(DomainError::Validation(ValidationKind::PhaseMismatch, _)) => return Ok(None),
            Err(e) => return Err(e),
        };
        info!(
            game_id = %joined.value.id,
            play_request_id = %request.id,
            version = joined.version,
            "joined open game"
        );
        Ok(Some(joined))
    }
}
