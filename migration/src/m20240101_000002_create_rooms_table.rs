use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rooms::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rooms::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Rooms::InviteCode)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Rooms::IsPrivate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Rooms::AdminId).uuid().not_null())
                    .col(ColumnDef::new(Rooms::MaxPlayers).integer().not_null())
                    .col(ColumnDef::new(Rooms::TimePerTurn).integer().not_null())
                    .col(
                        ColumnDef::new(Rooms::GameStatus)
                            .string()
                            .not_null()
                            .default("waiting"),
                    )
                    .col(ColumnDef::new(Rooms::Board).text().not_null().default(""))
                    .col(ColumnDef::new(Rooms::TurnOrder).json().not_null())
                    .col(
                        ColumnDef::new(Rooms::CurrentTurnIndex)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Rooms::TilesLeft).json().not_null())
                    .col(ColumnDef::new(Rooms::PlayersTiles).json().not_null())
                    .col(ColumnDef::new(Rooms::Leaderboard).json().not_null())
                    .col(ColumnDef::new(Rooms::PlacedWords).json().not_null())
                    .col(
                        ColumnDef::new(Rooms::CurrentSkippedTurns)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Rooms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Rooms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rooms::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Rooms {
    Table,
    Id,
    InviteCode,
    IsPrivate,
    AdminId,
    MaxPlayers,
    TimePerTurn,
    GameStatus,
    Board,
    TurnOrder,
    CurrentTurnIndex,
    TilesLeft,
    PlayersTiles,
    Leaderboard,
    PlacedWords,
    CurrentSkippedTurns,
    CreatedAt,
    UpdatedAt,
}
