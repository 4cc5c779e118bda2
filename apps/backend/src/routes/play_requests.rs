//! Play request routes: explicit create and the nearby listing.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::unix_time;
use crate::domain::PlayRequestDraft;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::ValidatedJson;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePlayRequestBody {
    pub requester_id: Uuid,
    pub activity: String,
    pub lat: f64,
    pub lon: f64,
    pub range_km: f64,
    /// Unix seconds
    #[serde(default)]
    pub start: Option<i64>,
    /// Unix seconds; the request expires here
    pub end: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub requester_id: Uuid,
    pub activity: String,
}

/// POST /api/play-requests
async fn create(
    body: ValidatedJson<CreatePlayRequestBody>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let draft = PlayRequestDraft {
        requester_id: body.requester_id,
        activity: body.activity,
        lat: body.lat,
        lon: body.lon,
        range_km: body.range_km,
        starts_at: body
            .start
            .map(|s| unix_time("start", s, ErrorCode::InvalidWindow))
            .transpose()?,
        expires_at: unix_time("end", body.end, ErrorCode::InvalidExpiry)?,
    };
    let stored = app_state
        .play_requests()
        .create(draft, OffsetDateTime::now_utc())
        .await?;
    Ok(HttpResponse::Created().json(stored))
}

/// GET /api/play-requests?requester_id=..&activity=..
async fn list(
    query: web::Query<ListQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let found = app_state
        .play_requests()
        .list(query.requester_id, &query.activity, OffsetDateTime::now_utc())
        .await?;
    Ok(HttpResponse::Ok().json(found))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::post().to(create))
            .route(web::get().to(list)),
    );
}
