//! ETag helpers for game resources.
//!
//! The ETag carries the game's version token, so any write changes it.

use actix_web::http::header::IF_NONE_MATCH;
use actix_web::HttpRequest;
use uuid::Uuid;

/// `"game-{id}-v{version}"`, quotes included.
///
/// ```
/// # use playtogether::http::etag::game_etag;
/// # use uuid::Uuid;
/// let etag = game_etag(Uuid::nil(), 5);
/// assert_eq!(etag, r#""game-00000000-0000-0000-0000-000000000000-v5""#);
/// ```
pub fn game_etag(id: Uuid, version: i32) -> String {
    format!(r#""game-{id}-v{version}""#)
}

/// True when an `If-None-Match` header lists `etag` (or `*`).
pub fn if_none_match(req: &HttpRequest, etag: &str) -> bool {
    req.headers()
        .get_all(IF_NONE_MATCH)
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|tag| tag.trim().trim_start_matches("W/"))
        .any(|tag| tag == "*" || tag == etag)
}
