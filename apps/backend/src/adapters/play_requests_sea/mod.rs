//! SeaORM adapter for play requests - generic over ConnectionTrait.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use time::OffsetDateTime;
use uuid::Uuid;

use super::area_condition;
use crate::entities::play_requests;

pub mod dto;

pub use dto::PlayRequestUpsert;

/// Insert a request, or replace location/range/window of the existing one
/// for the same requester and activity. The row id and `created_at` survive.
pub async fn upsert<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: PlayRequestUpsert,
    now: OffsetDateTime,
) -> Result<play_requests::Model, sea_orm::DbErr> {
    let requester_id = dto.requester_id;
    let activity = dto.activity.clone();

    let active = play_requests::ActiveModel {
        id: Set(Uuid::new_v4()),
        requester_id: Set(dto.requester_id),
        activity: Set(dto.activity),
        lat: Set(dto.lat),
        lon: Set(dto.lon),
        range_km: Set(dto.range_km),
        starts_at: Set(dto.starts_at),
        expires_at: Set(dto.expires_at),
        created_at: Set(now),
        updated_at: Set(now),
    };

    play_requests::Entity::insert(active)
        .on_conflict(
            OnConflict::columns([
                play_requests::Column::RequesterId,
                play_requests::Column::Activity,
            ])
            .update_columns([
                play_requests::Column::Lat,
                play_requests::Column::Lon,
                play_requests::Column::RangeKm,
                play_requests::Column::StartsAt,
                play_requests::Column::ExpiresAt,
                play_requests::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    find_by_requester_activity(conn, requester_id, &activity)
        .await?
        .ok_or_else(|| {
            sea_orm::DbErr::RecordNotFound(format!(
                "Play request for {requester_id}/{activity} vanished after upsert"
            ))
        })
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: Uuid,
) -> Result<Option<play_requests::Model>, sea_orm::DbErr> {
    play_requests::Entity::find_by_id(id).one(conn).await
}

pub async fn find_by_requester_activity<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    requester_id: Uuid,
    activity: &str,
) -> Result<Option<play_requests::Model>, sea_orm::DbErr> {
    play_requests::Entity::find()
        .filter(play_requests::Column::RequesterId.eq(requester_id))
        .filter(play_requests::Column::Activity.eq(activity))
        .one(conn)
        .await
}

/// Requests for `activity` whose stored point lies inside the rectangle.
pub async fn find_in_area<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    activity: &str,
    lat_min: f64,
    lat_max: f64,
    lon_ranges: &[(f64, f64)],
) -> Result<Vec<play_requests::Model>, sea_orm::DbErr> {
    play_requests::Entity::find()
        .filter(play_requests::Column::Activity.eq(activity))
        .filter(area_condition(
            play_requests::Column::Lat,
            play_requests::Column::Lon,
            lat_min,
            lat_max,
            lon_ranges,
        ))
        .order_by_asc(play_requests::Column::CreatedAt)
        .order_by_asc(play_requests::Column::Id)
        .all(conn)
        .await
}

/// Ids of every request owned by `requester_id`, any activity.
pub async fn find_ids_for_requester<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    requester_id: Uuid,
) -> Result<Vec<Uuid>, sea_orm::DbErr> {
    play_requests::Entity::find()
        .select_only()
        .column(play_requests::Column::Id)
        .filter(play_requests::Column::RequesterId.eq(requester_id))
        .into_tuple()
        .all(conn)
        .await
}

/// Ids of requests with `expires_at` strictly before `now`.
pub async fn find_expired_ids<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    now: OffsetDateTime,
) -> Result<Vec<Uuid>, sea_orm::DbErr> {
    play_requests::Entity::find()
        .select_only()
        .column(play_requests::Column::Id)
        .filter(play_requests::Column::ExpiresAt.lt(now))
        .order_by_asc(play_requests::Column::Id)
        .into_tuple()
        .all(conn)
        .await
}

pub async fn delete_by_ids<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    ids: &[Uuid],
) -> Result<u64, sea_orm::DbErr> {
    if ids.is_empty() {
        return Ok(0);
    }
    let result = play_requests::Entity::delete_many()
        .filter(play_requests::Column::Id.is_in(ids.iter().copied()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
