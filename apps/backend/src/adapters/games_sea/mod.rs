//! SeaORM adapter for games and their participant rows - generic over ConnectionTrait.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use time::OffsetDateTime;
use uuid::Uuid;

use super::area_condition;
use crate::entities::games::GameStatus;
use crate::entities::{game_participants, games};

pub mod dto;

pub use dto::{GameCreate, GameUpdate};

pub type GameWithParticipants = (games::Model, Vec<game_participants::Model>);

/// Apply an update guarded by `expected_version`, bumping the version.
///
/// Zero affected rows means either the game is gone (`RecordNotFound`) or
/// someone else wrote first (`Custom("OPTIMISTIC_LOCK:{...}")`).
async fn optimistic_update_then_fetch<C, F>(
    conn: &C,
    id: Uuid,
    expected_version: i32,
    configure_update: F,
) -> Result<games::Model, sea_orm::DbErr>
where
    C: ConnectionTrait + Send + Sync,
    F: FnOnce(sea_orm::UpdateMany<games::Entity>) -> sea_orm::UpdateMany<games::Entity>,
{
    let now = OffsetDateTime::now_utc();

    let result = configure_update(games::Entity::update_many())
        .col_expr(games::Column::UpdatedAt, Expr::val(now).into())
        .col_expr(
            games::Column::Version,
            Expr::col(games::Column::Version).add(1),
        )
        .filter(games::Column::Id.eq(id))
        .filter(games::Column::Version.eq(expected_version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return match games::Entity::find_by_id(id).one(conn).await? {
            Some(game) => Err(sea_orm::DbErr::Custom(format!(
                "OPTIMISTIC_LOCK:{{\"expected\":{},\"actual\":{}}}",
                expected_version, game.version
            ))),
            None => Err(sea_orm::DbErr::RecordNotFound(format!(
                "Game {id} not found"
            ))),
        };
    }

    games::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound(format!("Game {id} not found")))
}

pub async fn create_game<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: GameCreate,
    now: OffsetDateTime,
) -> Result<GameWithParticipants, sea_orm::DbErr> {
    let game = games::ActiveModel {
        id: Set(Uuid::new_v4()),
        status: Set(GameStatus::Created),
        activity: Set(dto.activity),
        lat: Set(dto.lat),
        lon: Set(dto.lon),
        created_at: Set(now),
        updated_at: Set(now),
        version: Set(1),
    }
    .insert(conn)
    .await?;

    let participants = insert_participants(
        conn,
        game.id,
        dto.participants.into_iter().map(|id| (id, false)),
        now,
    )
    .await?;

    Ok((game, participants))
}

async fn insert_participants<C, I>(
    conn: &C,
    game_id: Uuid,
    rows: I,
    now: OffsetDateTime,
) -> Result<Vec<game_participants::Model>, sea_orm::DbErr>
where
    C: ConnectionTrait + Send + Sync,
    I: IntoIterator<Item = (Uuid, bool)>,
{
    let models: Vec<game_participants::Model> = rows
        .into_iter()
        .map(|(play_request_id, confirmed)| game_participants::Model {
            game_id,
            play_request_id,
            confirmed,
            created_at: now,
        })
        .collect();
    if models.is_empty() {
        return Ok(models);
    }

    let actives = models.iter().map(|m| game_participants::ActiveModel {
        game_id: Set(m.game_id),
        play_request_id: Set(m.play_request_id),
        confirmed: Set(m.confirmed),
        created_at: Set(m.created_at),
    });
    game_participants::Entity::insert_many(actives)
        .exec_without_returning(conn)
        .await?;
    Ok(models)
}

pub async fn find_with_participants<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    game_id: Uuid,
) -> Result<Option<GameWithParticipants>, sea_orm::DbErr> {
    let mut rows = games::Entity::find_by_id(game_id)
        .find_with_related(game_participants::Entity)
        .all(conn)
        .await?;
    Ok(rows.pop())
}

pub async fn find_by_ids<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    ids: &[Uuid],
) -> Result<Vec<GameWithParticipants>, sea_orm::DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut rows = games::Entity::find()
        .filter(games::Column::Id.is_in(ids.iter().copied()))
        .find_with_related(game_participants::Entity)
        .all(conn)
        .await?;
    rows.sort_by(|(a, _), (b, _)| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    Ok(rows)
}

/// CREATED games for `activity` inside the rectangle, oldest first.
pub async fn find_open_in_area<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    activity: &str,
    lat_min: f64,
    lat_max: f64,
    lon_ranges: &[(f64, f64)],
) -> Result<Vec<GameWithParticipants>, sea_orm::DbErr> {
    let mut rows = games::Entity::find()
        .filter(games::Column::Activity.eq(activity))
        .filter(games::Column::Status.eq(GameStatus::Created))
        .filter(area_condition(
            games::Column::Lat,
            games::Column::Lon,
            lat_min,
            lat_max,
            lon_ranges,
        ))
        .order_by_asc(games::Column::CreatedAt)
        .find_with_related(game_participants::Entity)
        .all(conn)
        .await?;
    rows.sort_by(|(a, _), (b, _)| a.created_at.cmp(&b.created_at));
    Ok(rows)
}

/// Distinct ids of games referencing any of `play_request_ids`.
pub async fn game_ids_for_play_requests<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    play_request_ids: &[Uuid],
) -> Result<Vec<Uuid>, sea_orm::DbErr> {
    if play_request_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut ids: Vec<Uuid> = game_participants::Entity::find()
        .select_only()
        .column(game_participants::Column::GameId)
        .filter(game_participants::Column::PlayRequestId.is_in(play_request_ids.iter().copied()))
        .distinct()
        .into_tuple()
        .all(conn)
        .await?;
    ids.sort();
    Ok(ids)
}

/// Overwrite status and participant rows under the version guard.
pub async fn update_game<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: GameUpdate,
) -> Result<GameWithParticipants, sea_orm::DbErr> {
    let status = dto.status;
    let game = optimistic_update_then_fetch(conn, dto.id, dto.expected_version, |update| {
        update.col_expr(games::Column::Status, Expr::val(status).into())
    })
    .await?;

    game_participants::Entity::delete_many()
        .filter(game_participants::Column::GameId.eq(game.id))
        .exec(conn)
        .await?;
    let participants =
        insert_participants(conn, game.id, dto.participants, game.updated_at).await?;

    Ok((game, participants))
}

/// Delete games and their participant rows. Returns the number of games removed.
pub async fn delete_by_ids<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    ids: &[Uuid],
) -> Result<u64, sea_orm::DbErr> {
    if ids.is_empty() {
        return Ok(0);
    }
    game_participants::Entity::delete_many()
        .filter(game_participants::Column::GameId.is_in(ids.iter().copied()))
        .exec(conn)
        .await?;
    let result = games::Entity::delete_many()
        .filter(games::Column::Id.is_in(ids.iter().copied()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Remove participant rows pointing at `play_request_ids`.
pub async fn delete_participants_for_requests<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    play_request_ids: &[Uuid],
) -> Result<u64, sea_orm::DbErr> {
    if play_request_ids.is_empty() {
        return Ok(0);
    }
    let result = game_participants::Entity::delete_many()
        .filter(game_participants::Column::PlayRequestId.is_in(play_request_ids.iter().copied()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
