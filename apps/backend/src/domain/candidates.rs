//! True-distance filtering of the rectangle query results.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::play_request::PlayRequest;
use crate::errors::domain::DomainError;

/// Whose radius decides whether two requests can meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePolicy {
    /// The candidate's own radius governs.
    #[default]
    CandidateRange,
    /// Both radii must cover the distance.
    Mutual,
}

impl FromStr for RangePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "candidate" | "candidate_range" => Ok(RangePolicy::CandidateRange),
            "mutual" => Ok(RangePolicy::Mutual),
            other => Err(DomainError::validation_other(format!(
                "unknown range policy '{other}', expected candidate or mutual"
            ))),
        }
    }
}

/// Keep the candidates that are really within range of `anchor`.
///
/// The anchor itself, other requests from the same requester and requests
/// already past their expiry are dropped.
pub fn filter_candidates(
    anchor: &PlayRequest,
    candidates: Vec<PlayRequest>,
    policy: RangePolicy,
    now: OffsetDateTime,
) -> Vec<PlayRequest> {
    let origin = anchor.point();
    candidates
        .into_iter()
        .filter(|c| c.id != anchor.id && c.requester_id != anchor.requester_id)
        .filter(|c| !c.is_expired(now))
        .filter(|c| {
            let distance = origin.distance_km(&c.point());
            match policy {
                RangePolicy::CandidateRange => distance <= c.range_km,
                RangePolicy::Mutual => distance <= c.range_km && distance <= anchor.range_km,
            }
        })
        .collect()
}
