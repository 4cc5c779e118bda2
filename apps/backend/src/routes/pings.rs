//! Ping ingestion route.

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
pub struct PingBody {
    pub requester_id: Uuid,
    pub activity: String,
    pub lat: f64,
    pub lon: f64,
    pub range_km: f64,
    /// Unix seconds
    pub expire: i64,
    #[serde(default)]
    pub start: Option<i64>,
}

impl PingBody {
    fn into_draft(self) -> Result<PlayRequestDraft, AppError> {
        let starts_at = self
            .start
            .map(|s| unix_time("start", s, ErrorCode::InvalidWindow))
            .transpose()?;
        Ok(PlayRequestDraft {
            requester_id: self.requester_id,
            activity: self.activity,
            lat: self.lat,
            lon: self.lon,
            range_km: self.range_km,
            starts_at,
            expires_at: unix_time("expire", self.expire, ErrorCode::InvalidExpiry)?,
        })
    }
}

/// POST /api/pings
async fn ingest(
    body: ValidatedJson<PingBody>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let draft = body.into_inner().into_draft()?;
    let outcome = app_state
        .matching()
        .ingest_ping(draft, OffsetDateTime::now_utc())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(ingest));
}
