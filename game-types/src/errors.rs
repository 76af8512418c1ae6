use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use crate::GameStatus;

/// Why a single client action was refused. None of these are fatal; the caller
/// gets an error notice and nobody else sees anything.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameError {
    // membership / authorization
    #[error("connection is not registered in this room")]
    NotConnected,
    #[error("connection is already registered in this room")]
    AlreadyConnected,
    #[error("player is not a member of this room")]
    NotRoomPlayer,
    #[error("only the room admin can do this")]
    NotAdmin,
    #[error("it is another player's turn")]
    NotYourTurn,
    #[error("the admin cannot kick themselves")]
    CannotKickSelf,
    #[error("player {player_id} is not connected to this room")]
    PlayerNotConnected { player_id: Uuid },

    // state preconditions
    #[error("action is not allowed while the game is {status}")]
    InvalidGameState { status: GameStatus },
    #[error("the game cannot be ended yet")]
    TooFewEmptyTurns,

    // resource exhaustion
    #[error("the bag has {remaining} tiles left, exchanging needs at least {required}")]
    NotEnoughTiles { remaining: usize, required: usize },
    #[error("between 1 and {max} tiles can be exchanged, got {count}")]
    InvalidExchangeCount { count: usize, max: usize },
    #[error("tile index {index} is not on the rack")]
    InvalidTileIndex { index: usize },
    #[error("too many messages, slow down")]
    RateLimited,

    // rule violations
    #[error("word '{word}' is not valid")]
    InvalidWord { word: String },
    #[error("the first word must cover the centre cell")]
    CenterNotCovered,
    #[error("the new word must cross a word already on the board")]
    NoCrossLetter,
    #[error("cell [{row}, {col}] already holds a different letter")]
    CellConflict { row: usize, col: usize },
    #[error("invalid placement: {reason}")]
    InvalidPlacement { reason: String },
    #[error("reaction must be between 1 and {max} characters")]
    InvalidReaction { max: usize },
    #[error("missing field '{field}'")]
    MissingField { field: String },
    #[error("malformed message: {reason}")]
    MalformedMessage { reason: String },

    // lookups
    #[error("room {room_id} not found")]
    RoomNotFound { room_id: Uuid },
    #[error("player {player_id} not found")]
    PlayerNotFound { player_id: Uuid },

    // persistence
    #[error("storage failure: {message}")]
    Persistence { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ErrorCategory {
    Membership,
    State,
    Resource,
    Rule,
    Persistence,
}

impl GameError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GameError::NotConnected
            | GameError::AlreadyConnected
            | GameError::NotRoomPlayer
            | GameError::NotAdmin
            | GameError::NotYourTurn
            | GameError::CannotKickSelf
            | GameError::PlayerNotConnected { .. }
            | GameError::PlayerNotFound { .. } => ErrorCategory::Membership,
            GameError::InvalidGameState { .. }
            | GameError::TooFewEmptyTurns
            | GameError::RoomNotFound { .. } => ErrorCategory::State,
            GameError::NotEnoughTiles { .. }
            | GameError::InvalidExchangeCount { .. }
            | GameError::InvalidTileIndex { .. }
            | GameError::RateLimited => ErrorCategory::Resource,
            GameError::InvalidWord { .. }
            | GameError::CenterNotCovered
            | GameError::NoCrossLetter
            | GameError::CellConflict { .. }
            | GameError::InvalidPlacement { .. }
            | GameError::InvalidReaction { .. }
            | GameError::MissingField { .. }
            | GameError::MalformedMessage { .. } => ErrorCategory::Rule,
            GameError::Persistence { .. } => ErrorCategory::Persistence,
        }
    }

    pub fn missing(field: &str) -> Self {
        GameError::MissingField {
            field: field.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(GameError::NotAdmin.category(), ErrorCategory::Membership);
        assert_eq!(
            GameError::InvalidGameState {
                status: GameStatus::Paused
            }
            .category(),
            ErrorCategory::State
        );
        assert_eq!(
            GameError::NotEnoughTiles {
                remaining: 3,
                required: 7
            }
            .category(),
            ErrorCategory::Resource
        );
        assert_eq!(GameError::NoCrossLetter.category(), ErrorCategory::Rule);
        assert_eq!(
            GameError::Persistence {
                message: "timeout".to_string()
            }
            .category(),
            ErrorCategory::Persistence
        );
    }

    #[test]
    fn test_display_mentions_status() {
        let error = GameError::InvalidGameState {
            status: GameStatus::Started,
        };
        assert_eq!(
            error.to_string(),
            "action is not allowed while the game is started"
        );
    }
}
