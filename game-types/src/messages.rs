use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;
use uuid::Uuid;

use crate::{Bonus, Direction, GameError, GameStatus, LetterPlacement, PlayerInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PlayerAction {
    JoinRoom,
    ChangeRoomPrivacy,
    KickPlayer,
    LeaveRoom,
    CloseRoom,
    StartGame,
    PauseGame,
    ResumeGame,
    SkipTurn,
    EndTurn,
    ExchangeTiles,
    PlaceWord,
    SuggestToEndGame,
    LeaveGame,
    SendReaction,
}

/// One client action, decoded from a text frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InboundMessage {
    pub action: PlayerAction,
    #[serde(rename = "roomID")]
    pub room_id: Uuid,
    #[serde(rename = "kickPlayerID", default, skip_serializing_if = "Option::is_none")]
    pub kick_player_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changing_tiles: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letters: Option<Vec<LetterPlacement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<String>,
}

impl InboundMessage {
    pub fn new(action: PlayerAction, room_id: Uuid) -> Self {
        Self {
            action,
            room_id,
            kick_player_id: None,
            changing_tiles: None,
            direction: None,
            letters: None,
            reaction: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RoomEvent {
    JoinedRoom,
    PlayerJoined,
    RoomReady,
    RoomWaiting,
    RoomChangedPrivacy,
    KickedByAdmin,
    PlayerKicked,
    LeftRoom,
    PlayerLeftRoom,
    RoomClosed,
    GameStarted,
    GamePaused,
    GameResumed,
    EndedTurn,
    PlayerEndedTurn,
    ExchangedTiles,
    PlayerExchangedTiles,
    PlacedWord,
    PlayerPlacedWord,
    GameEndedPlayerWon,
    GameEndedTooManyEmptyTurns,
    LeftGame,
    PlayerLeftGame,
    GameEndedSoloInRoom,
    ReactionSent,
    PlayerDisconnected,
    Error,
}

/// Server → client frame. Which optional fields are present depends on `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OutboundMessage {
    pub event: RoomEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_player_info: Option<PlayerInfo>,
    #[serde(rename = "kickedPlayerID", default, skip_serializing_if = "Option::is_none")]
    pub kicked_player_id: Option<Uuid>,
    #[serde(rename = "leftPlayerID", default, skip_serializing_if = "Option::is_none")]
    pub left_player_id: Option<Uuid>,
    #[serde(rename = "newAdminID", default, skip_serializing_if = "Option::is_none")]
    pub new_admin_id: Option<Uuid>,
    #[serde(rename = "winnerID", default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_status: Option<GameStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_layout: Option<Vec<Vec<Bonus>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_turn: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaderboard: Option<BTreeMap<Uuid, i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_tiles: Option<Vec<char>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scored_points: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_room_privacy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<String>,
    #[serde(rename = "senderID", default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<Uuid>,
    #[serde(rename = "exchangedTilesPlayerID", default, skip_serializing_if = "Option::is_none")]
    pub exchanged_tiles_player_id: Option<Uuid>,
    #[serde(rename = "endedTurnPlayerID", default, skip_serializing_if = "Option::is_none")]
    pub ended_turn_player_id: Option<Uuid>,
    #[serde(rename = "placedWordPlayerID", default, skip_serializing_if = "Option::is_none")]
    pub placed_word_player_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OutboundMessage {
    /// A bare event; fill in fields with struct update syntax.
    pub fn new(event: RoomEvent) -> Self {
        Self {
            event,
            new_player_info: None,
            kicked_player_id: None,
            left_player_id: None,
            new_admin_id: None,
            winner_id: None,
            game_status: None,
            board_layout: None,
            board: None,
            current_turn: None,
            leaderboard: None,
            player_tiles: None,
            new_word: None,
            scored_points: None,
            new_room_privacy: None,
            reaction: None,
            sender_id: None,
            exchanged_tiles_player_id: None,
            ended_turn_player_id: None,
            placed_word_player_id: None,
            message: None,
        }
    }

    /// Error notice for the requester only.
    pub fn error(error: &GameError) -> Self {
        Self {
            message: Some(error.to_string()),
            ..Self::new(RoomEvent::Error)
        }
    }
}
