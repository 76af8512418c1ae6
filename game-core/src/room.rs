use game_types::{GameStatus, PlayerId, RoomId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Board, TileBag};

/// Durable state of one room, including its membership in join order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub invite_code: String,
    pub is_private: bool,
    pub admin_id: PlayerId,
    pub max_players: usize,
    pub time_per_turn: u32,
    pub game_status: GameStatus,
    pub board: Board,
    pub turn_order: Vec<PlayerId>,
    pub current_turn_index: usize,
    pub tiles_left: TileBag,
    pub players_tiles: BTreeMap<PlayerId, Vec<char>>,
    pub leaderboard: BTreeMap<PlayerId, i32>,
    pub placed_words: Vec<String>,
    pub current_skipped_turns: u32,
    /// Room members, earliest joiner first.
    pub players: Vec<PlayerId>,
}

impl Room {
    /// A fresh pre-game room whose only member is the admin.
    pub fn new(
        id: RoomId,
        invite_code: impl Into<String>,
        admin_id: PlayerId,
        max_players: usize,
        time_per_turn: u32,
    ) -> Self {
        let mut room = Self {
            id,
            invite_code: invite_code.into(),
            is_private: false,
            admin_id,
            max_players,
            time_per_turn,
            game_status: GameStatus::Waiting,
            board: Board::default(),
            turn_order: Vec::new(),
            current_turn_index: 0,
            tiles_left: TileBag::new(),
            players_tiles: BTreeMap::new(),
            leaderboard: BTreeMap::new(),
            placed_words: Vec::new(),
            current_skipped_turns: 0,
            players: vec![admin_id],
        };
        room.refresh_readiness();
        room
    }

    pub fn is_member(&self, player: PlayerId) -> bool {
        self.players.contains(&player)
    }

    pub fn is_admin(&self, player: PlayerId) -> bool {
        self.admin_id == player
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn current_turn_holder(&self) -> Option<PlayerId> {
        self.turn_order.get(self.current_turn_index).copied()
    }

    pub fn advance_turn(&mut self) {
        if !self.turn_order.is_empty() {
            self.current_turn_index = (self.current_turn_index + 1) % self.turn_order.len();
        }
    }

    /// Recompute `waiting`/`ready` from the member count. Returns true if the
    /// status changed. Has no effect once a game is running.
    pub fn refresh_readiness(&mut self) -> bool {
        if !self.game_status.is_pre_game() {
            return false;
        }
        let next = if self.is_full() {
            GameStatus::Ready
        } else {
            GameStatus::Waiting
        };
        let changed = next != self.game_status;
        self.game_status = next;
        changed
    }

    /// Drop a member before a game starts. If the admin left, the earliest
    /// remaining member takes over. Returns the new admin, if it changed.
    pub fn remove_member(&mut self, player: PlayerId) -> Option<PlayerId> {
        self.players.retain(|member| *member != player);
        if self.admin_id == player {
            if let Some(first) = self.players.first() {
                self.admin_id = *first;
                return Some(*first);
            }
        }
        None
    }

    /// Drop a player from a running game: their rack goes back to the bag and
    /// they leave the turn order, leaderboard and membership. If the admin
    /// left, the next player in turn order takes over. Returns the new admin,
    /// if it changed.
    pub fn remove_from_game(&mut self, player: PlayerId) -> Option<PlayerId> {
        if let Some(rack) = self.players_tiles.remove(&player) {
            self.tiles_left.put_back(&rack);
        }
        self.leaderboard.remove(&player);

        let mut new_admin = None;
        if let Some(position) = self.turn_order.iter().position(|id| *id == player) {
            if self.admin_id == player && self.turn_order.len() > 1 {
                let successor = self.turn_order[(position + 1) % self.turn_order.len()];
                self.admin_id = successor;
                new_admin = Some(successor);
            }
            self.turn_order.remove(position);
            if position < self.current_turn_index {
                self.current_turn_index -= 1;
            }
            self.current_turn_index = if self.turn_order.is_empty() {
                0
            } else {
                self.current_turn_index % self.turn_order.len()
            };
        }

        let fallback = self.remove_member(player);
        new_admin.or(fallback)
    }

    /// End the running game and go back to the lobby.
    pub fn reset(&mut self) {
        self.game_status = GameStatus::Waiting;
        self.board = Board::default();
        self.turn_order.clear();
        self.current_turn_index = 0;
        self.tiles_left = TileBag::new();
        self.players_tiles.clear();
        self.leaderboard.clear();
        self.placed_words.clear();
        self.current_skipped_turns = 0;
        self.refresh_readiness();
    }

    /// Highest score; ties go to whoever comes first in turn order.
    pub fn leader(&self) -> Option<PlayerId> {
        let mut best: Option<(PlayerId, i32)> = None;
        let ordered = self
            .turn_order
            .iter()
            .chain(self.leaderboard.keys().filter(|id| !self.turn_order.contains(id)));
        for player in ordered {
            let Some(score) = self.leaderboard.get(player) else {
                continue;
            };
            if best.is_none_or(|(_, top)| *score > top) {
                best = Some((*player, *score));
            }
        }
        best.map(|(player, _)| player)
    }

    /// Bag + racks + board. Constant while a game is running.
    pub fn tile_total(&self) -> usize {
        self.tiles_left.total()
            + self.players_tiles.values().map(Vec::len).sum::<usize>()
            + self.board.occupied_count()
    }

    pub fn rack(&self, player: PlayerId) -> Option<&Vec<char>> {
        self.players_tiles.get(&player)
    }
}
