use sea_orm_migration::prelude::*;

use crate::m20240101_000002_create_rooms_table::Rooms;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoomPlayers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoomPlayers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RoomPlayers::RoomId).uuid().not_null())
                    .col(ColumnDef::new(RoomPlayers::PlayerId).uuid().not_null())
                    .col(
                        ColumnDef::new(RoomPlayers::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_room_players_room")
                            .from(RoomPlayers::Table, RoomPlayers::RoomId)
                            .to(Rooms::Table, Rooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One membership row per player per room
        manager
            .create_index(
                Index::create()
                    .name("idx_room_players_room_player")
                    .table(RoomPlayers::Table)
                    .col(RoomPlayers::RoomId)
                    .col(RoomPlayers::PlayerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoomPlayers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RoomPlayers {
    Table,
    Id,
    RoomId,
    PlayerId,
    JoinedAt,
}
