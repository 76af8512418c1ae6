#![allow(dead_code)]

use game_core::{
    Board, Decision, Effect, GameRules, Recipient, Room, SessionContext, TileBag, WordList,
    WordValidator,
};
use game_types::{GameStatus, OutboundMessage, PlayerId, RoomEvent};
use rand::SeedableRng;
use rand::rngs::StdRng;
use uuid::Uuid;

/// Accepts any word; lets tests play whatever the random rack holds.
pub struct AcceptAll;

impl WordValidator for AcceptAll {
    fn is_valid(&self, _word: &str) -> bool {
        true
    }
}

pub fn create_test_validator() -> WordList {
    WordList::from_word_list("cat\ncats\nat\nta\ntax\nax\nace\ncar\narc\nact\ntea\neat")
}

pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(2024)
}

pub fn context<'a>(
    rules: &'a GameRules,
    validator: &'a dyn WordValidator,
    connected: &'a [PlayerId],
) -> SessionContext<'a> {
    SessionContext {
        rules,
        validator,
        connected,
    }
}

/// A pre-game room with `players` members (the first is admin).
pub fn create_room(players: usize, max_players: usize) -> Room {
    let admin = Uuid::new_v4();
    let mut room = Room::new(Uuid::new_v4(), "TEST01", admin, max_players, 60);
    for _ in 1..players {
        room.players.push(Uuid::new_v4());
    }
    room.refresh_readiness();
    room
}

/// A started game with hand-picked racks and bag, turn order = join order.
pub fn create_started_room(racks: &[&str], bag: TileBag, rules: &GameRules) -> Room {
    let mut room = create_room(racks.len(), racks.len());
    room.game_status = GameStatus::Started;
    room.turn_order = room.players.clone();
    room.board = Board::empty(rules.layout.size());
    room.tiles_left = bag;
    for (player, rack) in room.players.clone().iter().zip(racks) {
        room.players_tiles.insert(*player, rack.chars().collect());
        room.leaderboard.insert(*player, 0);
    }
    room
}

pub fn messages_to(decision: &Decision, recipient: Recipient) -> Vec<&OutboundMessage> {
    decision
        .effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Send(to, message) if *to == recipient => Some(message),
            _ => None,
        })
        .collect()
}

pub fn events(decision: &Decision) -> Vec<RoomEvent> {
    decision
        .effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Send(_, message) => Some(message.event),
            _ => None,
        })
        .collect()
}
