//! DTOs for play_requests_sea adapter.

use time::OffsetDateTime;
use uuid::Uuid;

/// Insert-or-replace payload keyed by `(requester_id, activity)`.
#[derive(Debug, Clone)]
pub struct PlayRequestUpsert {
    pub requester_id: Uuid,
    pub activity: String,
    pub lat: f64,
    pub lon: f64,
    pub range_km: f64,
    pub starts_at: Option<OffsetDateTime>,
    pub expires_at: OffsetDateTime,
}
