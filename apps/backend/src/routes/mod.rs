use actix_web::web;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::errors::ErrorCode;

pub mod games;
pub mod health;
pub mod pings;
pub mod play_requests;

/// Register every route. `main.rs` and the route tests share this.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::bad_request(ErrorCode::BadRequest, format!("Invalid query: {err}")).into()
    }));

    cfg.configure(health::configure_routes);
    cfg.service(web::scope("/api/pings").configure(pings::configure_routes));
    cfg.service(web::scope("/api/play-requests").configure(play_requests::configure_routes));
    cfg.service(web::scope("/api/games").configure(games::configure_routes));
}

/// Unix seconds from the wire into a timestamp.
pub(crate) fn unix_time(
    field: &str,
    secs: i64,
    code: ErrorCode,
) -> Result<OffsetDateTime, AppError> {
    OffsetDateTime::from_unix_timestamp(secs)
        .map_err(|_| AppError::invalid(code, format!("{field} is not a valid unix timestamp")))
}
