//! Game state machine: who is in, who has confirmed, where the game stands.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::geo::GeoPoint;
use super::Mutation;
use crate::errors::domain::{DomainError, InfraErrorKind, ValidationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// Proposed, waiting for confirmations
    Created,
    /// Every participant confirmed
    Pending,
    /// Promoted externally; the meetup is on
    Active,
}

impl GameStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Created => "CREATED",
            GameStatus::Pending => "PENDING",
            GameStatus::Active => "ACTIVE",
        }
    }

    /// The only status this one may move to.
    pub const fn successor(&self) -> Option<GameStatus> {
        match self {
            GameStatus::Created => Some(GameStatus::Pending),
            GameStatus::Pending => Some(GameStatus::Active),
            GameStatus::Active => None,
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(GameStatus::Created),
            "PENDING" => Ok(GameStatus::Pending),
            "ACTIVE" => Ok(GameStatus::Active),
            other => Err(DomainError::infra(
                InfraErrorKind::DataCorruption,
                format!("unknown game status '{other}'"),
            )),
        }
    }
}

/// Inputs for a new game; the store assigns id, version and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct GameDraft {
    pub activity: String,
    pub location: GeoPoint,
    pub participants: BTreeSet<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub status: GameStatus,
    pub activity: String,
    pub lat: f64,
    pub lon: f64,
    /// Play request ids
    pub participants: BTreeSet<Uuid>,
    pub confirmed: BTreeSet<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Game {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    pub fn is_fully_confirmed(&self) -> bool {
        !self.participants.is_empty() && self.confirmed == self.participants
    }

    /// Record `participant` as confirmed; completes to PENDING when the
    /// confirmed set reaches the participant set.
    pub fn confirm(&mut self, participant: Uuid) -> Result<Mutation, DomainError> {
        if !self.participants.contains(&participant) {
            return Err(DomainError::validation(
                ValidationKind::NotAParticipant,
                format!("{participant} is not a participant of game {}", self.id),
            ));
        }
        if !self.confirmed.insert(participant) {
            return Ok(Mutation::Unchanged);
        }
        self.settle()?;
        Ok(Mutation::Changed)
    }

    /// Only games still collecting confirmations accept newcomers.
    pub fn add_participant(&mut self, participant: Uuid) -> Result<Mutation, DomainError> {
        if self.participants.contains(&participant) {
            return Ok(Mutation::Unchanged);
        }
        if self.status != GameStatus::Created {
            return Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                format!("game {} is {} and closed to new participants", self.id, self.status),
            ));
        }
        self.participants.insert(participant);
        Ok(Mutation::Changed)
    }

    /// Drop `participant` from both sets. An emptied game is left for the
    /// caller to delete.
    pub fn remove_participant(&mut self, participant: Uuid) -> Result<Mutation, DomainError> {
        let removed = self.participants.remove(&participant);
        self.confirmed.remove(&participant);
        if !removed {
            return Ok(Mutation::Unchanged);
        }
        self.settle()?;
        Ok(Mutation::Changed)
    }

    /// PENDING -> ACTIVE.
    pub fn activate(&mut self) -> Result<Mutation, DomainError> {
        match self.status {
            GameStatus::Active => Ok(Mutation::Unchanged),
            GameStatus::Pending => {
                self.transition(GameStatus::Active)?;
                Ok(Mutation::Changed)
            }
            GameStatus::Created => Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                format!("game {} is CREATED; all participants must confirm first", self.id),
            )),
        }
    }

    fn settle(&mut self) -> Result<(), DomainError> {
        if self.status == GameStatus::Created && self.is_fully_confirmed() {
            self.transition(GameStatus::Pending)?;
        }
        Ok(())
    }

    fn transition(&mut self, next: GameStatus) -> Result<(), DomainError> {
        if self.status.successor() != Some(next) {
            return Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                format!("illegal transition {} -> {next}", self.status),
            ));
        }
        self.status = next;
        Ok(())
    }
}
