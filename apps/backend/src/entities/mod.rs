pub mod game_participants;
pub mod games;
pub mod play_requests;

pub use game_participants::Entity as GameParticipants;
pub use game_participants::Model as GameParticipant;
pub use games::Entity as Games;
pub use games::Model as Game;
pub use play_requests::Entity as PlayRequests;
pub use play_requests::Model as PlayRequest;
