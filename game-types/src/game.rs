use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// Lifecycle of a room. A closed room has no status: its record is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GameStatus {
    Waiting, // Fewer players than seats
    Ready,   // All seats taken, game not started
    Started,
    Paused,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Ready => "ready",
            GameStatus::Started => "started",
            GameStatus::Paused => "paused",
        }
    }

    /// True before a game has been started (or after one has been reset).
    pub fn is_pre_game(&self) -> bool {
        matches!(self, GameStatus::Waiting | GameStatus::Ready)
    }

    pub fn is_in_game(&self) -> bool {
        matches!(self, GameStatus::Started | GameStatus::Paused)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(GameStatus::Waiting),
            "ready" => Ok(GameStatus::Ready),
            "started" => Ok(GameStatus::Started),
            "paused" => Ok(GameStatus::Paused),
            other => Err(format!("unknown game status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Direction {
    Horizontal,
    Vertical,
}

/// One rack tile put on one board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LetterPlacement {
    #[serde(rename = "tileIndex")]
    pub tile_index: usize,
    /// `[row, col]`
    pub position: [usize; 2],
}

impl LetterPlacement {
    pub fn new(tile_index: usize, row: usize, col: usize) -> Self {
        Self {
            tile_index,
            position: [row, col],
        }
    }

    pub fn row(&self) -> usize {
        self.position[0]
    }

    pub fn col(&self) -> usize {
        self.position[1]
    }
}

/// Premium square kinds on the board layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Bonus {
    None,
    DoubleLetter,
    TripleLetter,
    DoubleWord,
    TripleWord,
}

impl Bonus {
    pub fn letter_multiplier(&self) -> i32 {
        match self {
            Bonus::DoubleLetter => 2,
            Bonus::TripleLetter => 3,
            _ => 1,
        }
    }

    pub fn word_multiplier(&self) -> i32 {
        match self {
            Bonus::DoubleWord => 2,
            Bonus::TripleWord => 3,
            _ => 1,
        }
    }
}
