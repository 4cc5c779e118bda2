use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "game_participants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "game_id")]
    pub game_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false, column_name = "play_request_id")]
    pub play_request_id: Uuid,
    pub confirmed: bool,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::games::Entity",
        from = "Column::GameId",
        to = "super::games::Column::Id",
        on_delete = "Cascade"
    )]
    Game,
    #[sea_orm(
        belongs_to = "super::play_requests::Entity",
        from = "Column::PlayRequestId",
        to = "super::play_requests::Column::Id",
        on_delete = "Cascade"
    )]
    PlayRequest,
}

impl Related<super::games::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Game.def()
    }
}

impl Related<super::play_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlayRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
