//! DTOs for games_sea adapter.

use uuid::Uuid;

use crate::entities::games::GameStatus;

/// DTO for creating a new game with its initial participants.
#[derive(Debug, Clone)]
pub struct GameCreate {
    pub activity: String,
    pub lat: f64,
    pub lon: f64,
    pub participants: Vec<Uuid>,
}

/// Full replacement of a game's mutable state, guarded by version.
///
/// `participants` carries every play request id with its confirmation flag;
/// rows not listed are removed.
#[derive(Debug, Clone)]
pub struct GameUpdate {
    pub id: Uuid,
    pub status: GameStatus,
    pub participants: Vec<(Uuid, bool)>,
    pub expected_version: i32,
}
