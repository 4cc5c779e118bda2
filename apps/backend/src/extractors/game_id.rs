use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use crate::error::AppError;
use crate::errors::ErrorCode;

/// Game id taken from the `{id}` path segment. Existence is checked by the
/// service, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameId(pub Uuid);

impl GameId {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        Uuid::parse_str(raw.trim()).map(GameId).map_err(|_| {
            AppError::invalid(ErrorCode::InvalidId, format!("Invalid game id: {raw}"))
        })
    }
}

impl FromRequest for GameId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.match_info().get("id") {
            Some(raw) => GameId::parse(raw),
            None => Err(AppError::invalid(
                ErrorCode::InvalidId,
                "Missing game id parameter",
            )),
        };
        ready(result)
    }
}
