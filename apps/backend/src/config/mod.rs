pub mod db;
pub mod matching;

pub use matching::MatchConfig;
