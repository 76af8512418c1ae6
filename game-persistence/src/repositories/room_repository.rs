use async_trait::async_trait;
use sea_orm::{
    ActiveValue::{NotSet, Set, Unchanged},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use super::store_error;
use crate::entities::{prelude::*, room_players, rooms};
use game_core::{Board, Room, RoomCommit, RoomStore, RoomWrite, StoreError};
use game_types::{GameStatus, PlayerId, RoomId};

const INVITE_CODE_LEN: usize = 6;
const INVITE_CODE_ATTEMPTS: usize = 5;

pub struct RoomRepository {
    db: DatabaseConnection,
}

impl RoomRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn generate_invite_code() -> String {
        Uuid::new_v4().simple().to_string()[..INVITE_CODE_LEN].to_uppercase()
    }

    /// Create a room owned by `admin_id`, retrying when the random invite code
    /// is already taken.
    pub async fn create_room(
        &self,
        admin_id: PlayerId,
        max_players: usize,
        time_per_turn: u32,
        is_private: bool,
    ) -> Result<Room, StoreError> {
        let mut last_error = StoreError::Constraint("invite_code".to_string());
        for _ in 0..INVITE_CODE_ATTEMPTS {
            let code = Self::generate_invite_code();
            match self
                .create_room_with_invite_code(&code, admin_id, max_players, time_per_turn, is_private)
                .await
            {
                Err(err) if err.is_constraint_failure() => {
                    tracing::warn!(invite_code = %code, "invite code collision, retrying");
                    last_error = err;
                }
                other => return other,
            }
        }
        Err(last_error)
    }

    pub async fn create_room_with_invite_code(
        &self,
        invite_code: &str,
        admin_id: PlayerId,
        max_players: usize,
        time_per_turn: u32,
        is_private: bool,
    ) -> Result<Room, StoreError> {
        let mut room = Room::new(
            Uuid::new_v4(),
            invite_code,
            admin_id,
            max_players,
            time_per_turn,
        );
        room.is_private = is_private;

        let mut model = room_to_active_model(&room)?;
        model.id = Set(room.id);
        model.created_at = Set(chrono::Utc::now().into());

        let txn = self.db.begin().await.map_err(store_error)?;
        Rooms::insert(model)
            .exec_without_returning(&txn)
            .await
            .map_err(store_error)?;
        insert_member(&txn, room.id, admin_id).await?;
        txn.commit().await.map_err(store_error)?;

        tracing::info!(room_id = %room.id, admin_id = %admin_id, "room created");
        Ok(room)
    }

    /// Record that `player_id` belongs to the room.
    pub async fn add_player(&self, room_id: RoomId, player_id: PlayerId) -> Result<(), StoreError> {
        insert_member(&self.db, room_id, player_id).await
    }
}

async fn insert_member<C: ConnectionTrait>(
    conn: &C,
    room_id: RoomId,
    player_id: PlayerId,
) -> Result<(), StoreError> {
    let member = room_players::ActiveModel {
        id: NotSet,
        room_id: Set(room_id),
        player_id: Set(player_id),
        joined_at: Set(chrono::Utc::now().into()),
    };
    RoomPlayers::insert(member)
        .exec_without_returning(conn)
        .await
        .map_err(store_error)?;
    Ok(())
}

async fn remove_member<C: ConnectionTrait>(
    conn: &C,
    room_id: RoomId,
    player_id: PlayerId,
) -> Result<(), StoreError> {
    RoomPlayers::delete_many()
        .filter(room_players::Column::RoomId.eq(room_id))
        .filter(room_players::Column::PlayerId.eq(player_id))
        .exec(conn)
        .await
        .map_err(store_error)?;
    Ok(())
}

async fn write_room<C: ConnectionTrait>(conn: &C, room: &Room) -> Result<(), StoreError> {
    Rooms::update(room_to_active_model(room)?)
        .exec(conn)
        .await
        .map_err(store_error)?;
    Ok(())
}

async fn delete_room<C: ConnectionTrait>(conn: &C, room_id: RoomId) -> Result<(), StoreError> {
    RoomPlayers::delete_many()
        .filter(room_players::Column::RoomId.eq(room_id))
        .exec(conn)
        .await
        .map_err(store_error)?;
    Rooms::delete_by_id(room_id)
        .exec(conn)
        .await
        .map_err(store_error)?;
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(value).map_err(|err| StoreError::Corrupt(err.to_string()))
}

fn from_json<T: DeserializeOwned>(value: serde_json::Value, field: &str) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|err| StoreError::Corrupt(format!("{}: {}", field, err)))
}

fn to_column(value: usize, field: &str) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{} out of range", field)))
}

fn from_column(value: i32, field: &str) -> Result<usize, StoreError> {
    usize::try_from(value).map_err(|_| StoreError::Corrupt(format!("{} is negative", field)))
}

fn room_to_active_model(room: &Room) -> Result<rooms::ActiveModel, StoreError> {
    Ok(rooms::ActiveModel {
        id: Unchanged(room.id),
        invite_code: Set(room.invite_code.clone()),
        is_private: Set(room.is_private),
        admin_id: Set(room.admin_id),
        max_players: Set(to_column(room.max_players, "max_players")?),
        time_per_turn: Set(to_column(room.time_per_turn as usize, "time_per_turn")?),
        game_status: Set(room.game_status.as_str().to_string()),
        board: Set(room.board.to_string()),
        turn_order: Set(to_json(&room.turn_order)?),
        current_turn_index: Set(to_column(room.current_turn_index, "current_turn_index")?),
        tiles_left: Set(to_json(&room.tiles_left)?),
        players_tiles: Set(to_json(&room.players_tiles)?),
        leaderboard: Set(to_json(&room.leaderboard)?),
        placed_words: Set(to_json(&room.placed_words)?),
        current_skipped_turns: Set(to_column(
            room.current_skipped_turns as usize,
            "current_skipped_turns",
        )?),
        created_at: NotSet,
        updated_at: Set(chrono::Utc::now().into()),
    })
}

fn model_to_room(model: rooms::Model, players: Vec<PlayerId>) -> Result<Room, StoreError> {
    Ok(Room {
        id: model.id,
        invite_code: model.invite_code,
        is_private: model.is_private,
        admin_id: model.admin_id,
        max_players: from_column(model.max_players, "max_players")?,
        time_per_turn: from_column(model.time_per_turn, "time_per_turn")? as u32,
        game_status: model
            .game_status
            .parse::<GameStatus>()
            .map_err(StoreError::Corrupt)?,
        board: Board::parse(&model.board).map_err(StoreError::Corrupt)?,
        turn_order: from_json(model.turn_order, "turn_order")?,
        current_turn_index: from_column(model.current_turn_index, "current_turn_index")?,
        tiles_left: from_json(model.tiles_left, "tiles_left")?,
        players_tiles: from_json(model.players_tiles, "players_tiles")?,
        leaderboard: from_json(model.leaderboard, "leaderboard")?,
        placed_words: from_json(model.placed_words, "placed_words")?,
        current_skipped_turns: from_column(model.current_skipped_turns, "current_skipped_turns")?
            as u32,
        players,
    })
}

#[async_trait]
impl RoomStore for RoomRepository {
    async fn find(&self, room_id: RoomId) -> Result<Option<Room>, StoreError> {
        let Some(model) = Rooms::find_by_id(room_id)
            .one(&self.db)
            .await
            .map_err(store_error)?
        else {
            return Ok(None);
        };

        let players = RoomPlayers::find()
            .filter(room_players::Column::RoomId.eq(room_id))
            .order_by_asc(room_players::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(|member| member.player_id)
            .collect();

        model_to_room(model, players).map(Some)
    }

    async fn update(&self, room: &Room) -> Result<(), StoreError> {
        write_room(&self.db, room).await
    }

    async fn delete(&self, room_id: RoomId) -> Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(store_error)?;
        delete_room(&txn, room_id).await?;
        txn.commit().await.map_err(store_error)
    }

    async fn commit(&self, commit: RoomCommit) -> Result<(), StoreError> {
        if commit.is_noop() {
            return Ok(());
        }

        let room_id = commit.room.id;
        let txn = self.db.begin().await.map_err(store_error)?;
        if let Some(player) = commit.removed_player {
            remove_member(&txn, room_id, player).await?;
        }
        match commit.write {
            RoomWrite::Keep => {}
            RoomWrite::Update => write_room(&txn, &commit.room).await?,
            RoomWrite::Delete => delete_room(&txn, room_id).await?,
        }
        txn.commit().await.map_err(store_error)
    }
}
