use sea_orm::entity::prelude::*;

/// Room row. Collections are stored as JSON columns.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "rooms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub invite_code: String,
    pub is_private: bool,
    pub admin_id: Uuid,
    pub max_players: i32,
    pub time_per_turn: i32,
    pub game_status: String,
    #[sea_orm(column_type = "Text")]
    pub board: String,
    pub turn_order: Json,
    pub current_turn_index: i32,
    pub tiles_left: Json,
    pub players_tiles: Json,
    pub leaderboard: Json,
    pub placed_words: Json,
    pub current_skipped_turns: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::room_players::Entity")]
    RoomPlayers,
}

impl Related<super::room_players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoomPlayers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
