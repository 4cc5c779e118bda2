use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum PlayRequests {
    Table,
    Id,
    RequesterId,
    Activity,
    Lat,
    Lon,
    RangeKm,
    StartsAt,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Games {
    Table,
    Id,
    Status,
    Activity,
    Lat,
    Lon,
    CreatedAt,
    UpdatedAt,
    Version,
}

#[derive(Iden)]
enum GameParticipants {
    Table,
    GameId,
    PlayRequestId,
    Confirmed,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // play_requests
        manager
            .create_table(
                Table::create()
                    .table(PlayRequests::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PlayRequests::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(PlayRequests::RequesterId).uuid().not_null())
                    .col(ColumnDef::new(PlayRequests::Activity).string_len(64).not_null())
                    .col(ColumnDef::new(PlayRequests::Lat).double().not_null())
                    .col(ColumnDef::new(PlayRequests::Lon).double().not_null())
                    .col(ColumnDef::new(PlayRequests::RangeKm).double().not_null())
                    .col(
                        ColumnDef::new(PlayRequests::StartsAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PlayRequests::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlayRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlayRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // one live request per requester and activity; upserts conflict on this
        manager
            .create_index(
                Index::create()
                    .name("ux_play_requests_requester_activity")
                    .table(PlayRequests::Table)
                    .col(PlayRequests::RequesterId)
                    .col(PlayRequests::Activity)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_play_requests_activity_lat_lon")
                    .table(PlayRequests::Table)
                    .col(PlayRequests::Activity)
                    .col(PlayRequests::Lat)
                    .col(PlayRequests::Lon)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_play_requests_expires_at")
                    .table(PlayRequests::Table)
                    .col(PlayRequests::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        // games
        manager
            .create_table(
                Table::create()
                    .table(Games::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Games::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Games::Status)
                            .string_len(16)
                            .not_null()
                            .default("CREATED"),
                    )
                    .col(ColumnDef::new(Games::Activity).string_len(64).not_null())
                    .col(ColumnDef::new(Games::Lat).double().not_null())
                    .col(ColumnDef::new(Games::Lon).double().not_null())
                    .col(
                        ColumnDef::new(Games::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Games::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Games::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_games_activity_status_lat_lon")
                    .table(Games::Table)
                    .col(Games::Activity)
                    .col(Games::Status)
                    .col(Games::Lat)
                    .col(Games::Lon)
                    .to_owned(),
            )
            .await?;

        // game_participants
        manager
            .create_table(
                Table::create()
                    .table(GameParticipants::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GameParticipants::GameId).uuid().not_null())
                    .col(
                        ColumnDef::new(GameParticipants::PlayRequestId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GameParticipants::Confirmed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GameParticipants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_game_participants")
                            .col(GameParticipants::GameId)
                            .col(GameParticipants::PlayRequestId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_participants_game_id")
                            .from(GameParticipants::Table, GameParticipants::GameId)
                            .to(Games::Table, Games::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_participants_play_request_id")
                            .from(GameParticipants::Table, GameParticipants::PlayRequestId)
                            .to(PlayRequests::Table, PlayRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_game_participants_play_request_id")
                    .table(GameParticipants::Table)
                    .col(GameParticipants::PlayRequestId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // drop in reverse order
        manager
            .drop_table(
                Table::drop()
                    .table(GameParticipants::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Games::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(PlayRequests::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
