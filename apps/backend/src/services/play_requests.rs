//! Explicit play-request creation and the "who is around me" listing.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::config::MatchConfig;
use crate::domain::candidates::filter_candidates;
use crate::domain::play_request::normalize_activity;
use crate::domain::{area, PlayRequest, PlayRequestDraft};
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::repos::MatchStore;

pub struct PlayRequestService {
    store: Arc<dyn MatchStore>,
    config: Arc<MatchConfig>,
}

impl PlayRequestService {
    pub fn new(store: Arc<dyn MatchStore>, config: Arc<MatchConfig>) -> Self {
        Self { store, config }
    }

    /// Store (or replace) the caller's request for an activity. No matching.
    pub async fn create(
        &self,
        draft: PlayRequestDraft,
        now: OffsetDateTime,
    ) -> Result<PlayRequest, DomainError> {
        let draft = draft.validate(self.config.max_range_km, now)?;
        let stored = self.store.upsert_play_request(&draft, now).await?;
        debug!(play_request_id = %stored.id, activity = %stored.activity, "play request stored");
        Ok(stored)
    }

    /// The caller's own request first, then every compatible request nearby.
    pub async fn list(
        &self,
        requester_id: Uuid,
        activity: &str,
        now: OffsetDateTime,
    ) -> Result<Vec<PlayRequest>, DomainError> {
        let activity = normalize_activity(activity)?;
        let own = self
            .store
            .find_play_request_for(requester_id, &activity)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::PlayRequest,
                    format!("No {activity} play request for requester {requester_id}"),
                )
            })?;

        let area = area::calculate(own.point(), own.range_km)?;
        let candidates = self.store.play_requests_in_area(&activity, &area).await?;
        let nearby = filter_candidates(&own, candidates, self.config.range_policy, now);

        let mut result = Vec::with_capacity(nearby.len() + 1);
        result.push(own);
        result.extend(nearby);
        Ok(result)
    }
}
