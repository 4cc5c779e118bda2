//! Game routes. Responses that carry a single game also carry its ETag.

use actix_web::http::header::ETAG;
use actix_web::{web, HttpRequest, HttpResponse, HttpResponseBuilder};
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::Game;
use crate::error::AppError;
use crate::extractors::{GameId, ValidatedJson};
use crate::http::etag::{game_etag, if_none_match};
use crate::repos::Versioned;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateGameBody {
    pub participants: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmBody {
    pub participant_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ListGamesQuery {
    pub requester_id: Uuid,
}

fn with_etag(mut builder: HttpResponseBuilder, game: &Versioned<Game>) -> HttpResponse {
    builder
        .insert_header((ETAG, game_etag(game.value.id, game.version)))
        .json(game)
}

/// POST /api/games
async fn create(
    body: ValidatedJson<CreateGameBody>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let game = app_state
        .games()
        .create(&body.participants, OffsetDateTime::now_utc())
        .await?;
    Ok(with_etag(HttpResponse::Created(), &game))
}

/// GET /api/games?requester_id=..
async fn list(
    query: web::Query<ListGamesQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let games = app_state
        .games()
        .list_for_requester(query.requester_id)
        .await?;
    Ok(HttpResponse::Ok().json(games))
}

/// GET /api/games/{id}
///
/// Honours `If-None-Match` with `304 Not Modified`.
async fn get(
    req: HttpRequest,
    game_id: GameId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let game = app_state.games().get(game_id.0).await?;
    let etag = game_etag(game.value.id, game.version);
    if if_none_match(&req, &etag) {
        return Ok(HttpResponse::NotModified()
            .insert_header((ETAG, etag))
            .finish());
    }
    Ok(with_etag(HttpResponse::Ok(), &game))
}

/// POST /api/games/{id}/confirm
async fn confirm(
    game_id: GameId,
    body: ValidatedJson<ConfirmBody>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let game = app_state
        .games()
        .confirm(game_id.0, body.participant_id)
        .await?;
    Ok(with_etag(HttpResponse::Ok(), &game))
}

/// POST /api/games/{id}/activate
async fn activate(
    game_id: GameId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let game = app_state.games().activate(game_id.0).await?;
    Ok(with_etag(HttpResponse::Ok(), &game))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::post().to(create))
            .route(web::get().to(list)),
    )
    .service(web::resource("/{id}").route(web::get().to(get)))
    .service(web::resource("/{id}/confirm").route(web::post().to(confirm)))
    .service(web::resource("/{id}/activate").route(web::post().to(activate)));
}
