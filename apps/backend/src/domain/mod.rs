//! Domain layer: pure matching logic and types.

pub mod area;
pub mod candidates;
pub mod game;
pub mod geo;
pub mod play_request;
pub mod threshold;

#[cfg(test)]
mod tests_area;

pub use area::Area;
pub use candidates::RangePolicy;
pub use game::{Game, GameDraft, GameStatus};
pub use geo::GeoPoint;
pub use play_request::{PlayRequest, PlayRequestDraft};
pub use threshold::ThresholdPolicy;

/// Whether an in-place edit actually changed anything worth writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Changed,
    Unchanged,
}
