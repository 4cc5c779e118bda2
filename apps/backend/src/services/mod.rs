//! Application services. Each takes its collaborators at construction and
//! returns `DomainError`; handlers convert to `AppError` with `?`.

pub mod expiry;
pub mod games;
pub mod matching;
pub mod play_requests;

pub use expiry::ExpirySweeper;
pub use games::GameService;
pub use matching::{MatchService, PingOutcome};
pub use play_requests::PlayRequestService;
