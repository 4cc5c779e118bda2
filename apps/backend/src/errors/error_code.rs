//! Error codes for the PlayTogether API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses.

use core::fmt;

/// Centralized error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request Validation
    /// Required field missing from the request
    MissingField,
    /// Latitude or longitude out of range
    InvalidCoordinate,
    /// Search radius not positive or above the configured maximum
    InvalidRange,
    /// Expiry already in the past
    InvalidExpiry,
    /// Start is not before end
    InvalidWindow,
    /// Activity name empty
    InvalidActivity,
    /// Game creation without participants
    EmptyParticipants,
    /// Play requests for different activities in one game
    ActivityMismatch,
    /// Confirming id is not part of the game
    NotAParticipant,
    /// Operation not allowed in the game's current status
    PhaseMismatch,
    /// Malformed path or query identifier
    InvalidId,
    /// General validation error
    ValidationError,
    /// General bad request error
    BadRequest,
    /// Request body over the configured size cap
    PayloadTooLarge,

    // Resource Not Found
    PlayRequestNotFound,
    GameNotFound,
    NotFound,

    // Conflicts
    /// Optimistic lock conflict
    OptimisticLock,
    /// Conditional update retry budget exhausted
    RetriesExhausted,
    /// Generic conflict
    Conflict,

    // Computation
    /// Bisection did not converge
    NoConvergence,

    // System Errors
    DbError,
    DbUnavailable,
    DbTimeout,
    DataCorruption,
    Internal,
    InternalError,
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingField => "MISSING_FIELD",
            Self::InvalidCoordinate => "INVALID_COORDINATE",
            Self::InvalidRange => "INVALID_RANGE",
            Self::InvalidExpiry => "INVALID_EXPIRY",
            Self::InvalidWindow => "INVALID_WINDOW",
            Self::InvalidActivity => "INVALID_ACTIVITY",
            Self::EmptyParticipants => "EMPTY_PARTICIPANTS",
            Self::ActivityMismatch => "ACTIVITY_MISMATCH",
            Self::NotAParticipant => "NOT_A_PARTICIPANT",
            Self::PhaseMismatch => "PHASE_MISMATCH",
            Self::InvalidId => "INVALID_ID",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",

            Self::PlayRequestNotFound => "PLAY_REQUEST_NOT_FOUND",
            Self::GameNotFound => "GAME_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::OptimisticLock => "OPTIMISTIC_LOCK",
            Self::RetriesExhausted => "RETRIES_EXHAUSTED",
            Self::Conflict => "CONFLICT",

            Self::NoConvergence => "NO_CONVERGENCE",

            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::DbTimeout => "DB_TIMEOUT",
            Self::DataCorruption => "DATA_CORRUPTION",
            Self::Internal => "INTERNAL",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
