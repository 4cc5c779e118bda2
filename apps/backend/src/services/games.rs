//! Game lifecycle operations. Every mutation goes through
//! [`update_with_retry`], so concurrent callers never overwrite each other.

use std::collections::BTreeSet;
use std::sync::Arc;

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::config::MatchConfig;
use crate::domain::{Game, GameDraft};
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::repos::{update_with_retry, MatchStore, Versioned};

pub struct GameService {
    store: Arc<dyn MatchStore>,
    config: Arc<MatchConfig>,
}

impl GameService {
    pub fn new(store: Arc<dyn MatchStore>, config: Arc<MatchConfig>) -> Self {
        Self { store, config }
    }

    /// Form a game from explicit play request ids. The first id fixes the
    /// location; all requests must share one activity.
    pub async fn create(
        &self,
        play_request_ids: &[Uuid],
        now: OffsetDateTime,
    ) -> Result<Versioned<Game>, DomainError> {
        let Some(first_id) = play_request_ids.first() else {
            return Err(DomainError::validation(
                ValidationKind::EmptyParticipants,
                "a game needs at least one participant",
            ));
        };

        let mut participants = BTreeSet::new();
        let mut first = None;
        for id in play_request_ids {
            if !participants.insert(*id) {
                continue;
            }
            let request = self.store.find_play_request(*id).await?.ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::PlayRequest,
                    format!("Play request {id} not found"),
                )
            })?;
            match &first {
                None => first = Some(request),
                Some(anchor) if anchor.activity != request.activity => {
                    return Err(DomainError::validation(
                        ValidationKind::ActivityMismatch,
                        format!(
                            "play request {id} is for {}, not {}",
                            request.activity, anchor.activity
                        ),
                    ));
                }
                Some(_) => {}
            }
        }
        let anchor = first.ok_or_else(|| {
            DomainError::not_found(
                NotFoundKind::PlayRequest,
                format!("Play request {first_id} not found"),
            )
        })?;

        let game = self
            .store
            .create_game(
                &GameDraft {
                    activity: anchor.activity.clone(),
                    location: anchor.point(),
                    participants,
                },
                now,
            )
            .await?;
        info!(
            game_id = %game.value.id,
            participants = game.value.participants.len(),
            "game created"
        );
        Ok(game)
    }

    /// Mark `participant_id` as confirmed. Repeating a confirmation is a
    /// no-op that leaves the version alone.
    pub async fn confirm(
        &self,
        game_id: Uuid,
        participant_id: Uuid,
    ) -> Result<Versioned<Game>, DomainError> {
        let outcome = update_with_retry(
            self.store.as_ref(),
            &game_id,
            &self.config.confirm_retry,
            |game| game.confirm(participant_id),
        )
        .await?;
        let changed = outcome.changed();
        let game = outcome.into_inner();
        if changed {
            info!(
                game_id = %game_id,
                play_request_id = %participant_id,
                status = %game.value.status,
                version = game.version,
                "participant confirmed"
            );
        }
        Ok(game)
    }

    /// PENDING -> ACTIVE.
    pub async fn activate(&self, game_id: Uuid) -> Result<Versioned<Game>, DomainError> {
        let outcome = update_with_retry(
            self.store.as_ref(),
            &game_id,
            &self.config.confirm_retry,
            Game::activate,
        )
        .await?;
        if outcome.changed() {
            info!(game_id = %game_id, "game activated");
        }
        Ok(outcome.into_inner())
    }

    pub async fn get(&self, game_id: Uuid) -> Result<Versioned<Game>, DomainError> {
        self.store
            .read(&game_id)
            .await?
            .ok_or_else(|| self.store.missing(&game_id))
    }

    /// Games holding any of the requester's play requests, newest first.
    pub async fn list_for_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<Versioned<Game>>, DomainError> {
        self.store.games_for_requester(requester_id).await
    }
}
