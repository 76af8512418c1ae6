//! Pure room handlers.
//!
//! Each action is decided from the loaded [`Room`], the caller and the shared
//! [`GameRules`]. A [`Decision`] says what to persist and which messages to
//! send; the server applies it after the write succeeds.

use game_types::{
    Direction, GameError, GameStatus, InboundMessage, LetterPlacement, OutboundMessage,
    PlayerAction, PlayerId, PlayerInfo, RoomEvent,
};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use crate::{
    BoardEngine, BoardLayout, LetterSet, Room, RoomCommit, RoomWrite, ScoringEngine, WordValidator,
};

pub const RACK_SIZE: usize = 7;
pub const MAX_SKIPPED_TURNS: u32 = 6;
pub const MAX_REACTION_LEN: usize = 15;

/// Process-wide game configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct GameRules {
    pub letters: LetterSet,
    pub layout: BoardLayout,
    pub rack_size: usize,
    pub max_skipped_turns: u32,
    pub max_reaction_len: usize,
}

impl GameRules {
    pub fn new(letters: LetterSet, layout: BoardLayout) -> Self {
        Self {
            letters,
            layout,
            rack_size: RACK_SIZE,
            max_skipped_turns: MAX_SKIPPED_TURNS,
            max_reaction_len: MAX_REACTION_LEN,
        }
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self::new(LetterSet::english(), BoardLayout::standard())
    }
}

/// Read-only inputs to a decision besides the room itself.
pub struct SessionContext<'a> {
    pub rules: &'a GameRules,
    pub validator: &'a dyn WordValidator,
    /// Players with a live connection to this room.
    pub connected: &'a [PlayerId],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `name` is filled in from the player directory before deciding.
    Join { name: String },
    ChangePrivacy,
    Kick { target: PlayerId },
    LeaveRoom,
    CloseRoom,
    StartGame,
    PauseGame,
    ResumeGame,
    /// `empty` counts towards the too-many-empty-turns ending.
    EndTurn { empty: bool },
    ExchangeTiles { indices: Vec<usize> },
    PlaceWord {
        direction: Direction,
        letters: Vec<LetterPlacement>,
    },
    SuggestEnd,
    LeaveGame,
    SendReaction { reaction: String },
}

impl TryFrom<&InboundMessage> for Command {
    type Error = GameError;

    fn try_from(message: &InboundMessage) -> Result<Self, Self::Error> {
        let command = match message.action {
            PlayerAction::JoinRoom => Command::Join {
                name: String::new(),
            },
            PlayerAction::ChangeRoomPrivacy => Command::ChangePrivacy,
            PlayerAction::KickPlayer => Command::Kick {
                target: message
                    .kick_player_id
                    .ok_or_else(|| GameError::missing("kickPlayerID"))?,
            },
            PlayerAction::LeaveRoom => Command::LeaveRoom,
            PlayerAction::CloseRoom => Command::CloseRoom,
            PlayerAction::StartGame => Command::StartGame,
            PlayerAction::PauseGame => Command::PauseGame,
            PlayerAction::ResumeGame => Command::ResumeGame,
            PlayerAction::SkipTurn => Command::EndTurn { empty: true },
            PlayerAction::EndTurn => Command::EndTurn { empty: false },
            PlayerAction::ExchangeTiles => Command::ExchangeTiles {
                indices: message
                    .changing_tiles
                    .clone()
                    .ok_or_else(|| GameError::missing("changingTiles"))?,
            },
            PlayerAction::PlaceWord => Command::PlaceWord {
                direction: message
                    .direction
                    .ok_or_else(|| GameError::missing("direction"))?,
                letters: message
                    .letters
                    .clone()
                    .ok_or_else(|| GameError::missing("letters"))?,
            },
            PlayerAction::SuggestToEndGame => Command::SuggestEnd,
            PlayerAction::LeaveGame => Command::LeaveGame,
            PlayerAction::SendReaction => Command::SendReaction {
                reaction: message
                    .reaction
                    .clone()
                    .ok_or_else(|| GameError::missing("reaction"))?,
            },
        };
        Ok(command)
    }
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Join { .. } => "join_room",
            Command::ChangePrivacy => "change_room_privacy",
            Command::Kick { .. } => "kick_player",
            Command::LeaveRoom => "leave_room",
            Command::CloseRoom => "close_room",
            Command::StartGame => "start_game",
            Command::PauseGame => "pause_game",
            Command::ResumeGame => "resume_game",
            Command::EndTurn { empty: true } => "skip_turn",
            Command::EndTurn { empty: false } => "end_turn",
            Command::ExchangeTiles { .. } => "exchange_tiles",
            Command::PlaceWord { .. } => "place_word",
            Command::SuggestEnd => "suggest_to_end_game",
            Command::LeaveGame => "leave_game",
            Command::SendReaction { .. } => "send_reaction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Player(PlayerId),
    /// Everyone connected to the room except this player.
    Others(PlayerId),
    Everyone,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Send(Recipient, OutboundMessage),
    /// Close and forget this player's connection to the room.
    Disconnect(PlayerId),
    /// Close every connection to the room.
    DisconnectAll,
}

#[derive(Debug, Clone)]
pub struct Decision {
    pub room: Room,
    pub write: RoomWrite,
    pub removed_player: Option<PlayerId>,
    pub effects: Vec<Effect>,
}

impl Decision {
    fn new(room: Room, write: RoomWrite) -> Self {
        Self {
            room,
            write,
            removed_player: None,
            effects: Vec::new(),
        }
    }

    fn removing(mut self, player: PlayerId) -> Self {
        self.removed_player = Some(player);
        self
    }

    fn send(mut self, to: Recipient, message: OutboundMessage) -> Self {
        self.effects.push(Effect::Send(to, message));
        self
    }

    fn effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn commit(&self) -> RoomCommit {
        RoomCommit {
            room: self.room.clone(),
            write: self.write,
            removed_player: self.removed_player,
        }
    }
}

/// Decide the outcome of `command` issued by `caller` against `room`.
pub fn decide<R: Rng + ?Sized>(
    room: Room,
    caller: PlayerId,
    command: Command,
    ctx: &SessionContext<'_>,
    rng: &mut R,
) -> Result<Decision, GameError> {
    if !room.is_member(caller) {
        return Err(GameError::NotRoomPlayer);
    }

    match command {
        Command::Join { name } => join(room, PlayerInfo { id: caller, name }),
        Command::ChangePrivacy => change_privacy(room, caller),
        Command::Kick { target } => kick(room, caller, target, ctx),
        Command::LeaveRoom => leave_room(room, caller),
        Command::CloseRoom => close_room(room, caller),
        Command::StartGame => start_game(room, caller, ctx, rng),
        Command::PauseGame => pause_game(room, caller),
        Command::ResumeGame => resume_game(room, caller),
        Command::EndTurn { empty } => end_turn(room, caller, empty),
        Command::ExchangeTiles { indices } => exchange_tiles(room, caller, &indices, ctx, rng),
        Command::PlaceWord { direction, letters } => {
            place_word(room, caller, direction, &letters, ctx, rng)
        }
        Command::SuggestEnd => suggest_end(room, caller, ctx),
        Command::LeaveGame => leave_game(room, caller),
        Command::SendReaction { reaction } => send_reaction(room, caller, reaction, ctx),
    }
}

fn require_admin(room: &Room, caller: PlayerId) -> Result<(), GameError> {
    if room.is_admin(caller) {
        Ok(())
    } else {
        Err(GameError::NotAdmin)
    }
}

fn require_status(room: &Room, allowed: &[GameStatus]) -> Result<(), GameError> {
    if allowed.contains(&room.game_status) {
        Ok(())
    } else {
        Err(GameError::InvalidGameState {
            status: room.game_status,
        })
    }
}

const PRE_GAME: [GameStatus; 2] = [GameStatus::Waiting, GameStatus::Ready];
const IN_GAME: [GameStatus; 2] = [GameStatus::Started, GameStatus::Paused];

/// Status must be `started` and the caller must hold the turn.
fn require_turn(room: &Room, caller: PlayerId) -> Result<(), GameError> {
    require_status(room, &[GameStatus::Started])?;
    if room.current_turn_holder() == Some(caller) {
        Ok(())
    } else {
        Err(GameError::NotYourTurn)
    }
}

fn join(mut room: Room, info: PlayerInfo) -> Result<Decision, GameError> {
    let caller = info.id;
    let status_changed = room.refresh_readiness();
    let full_before_start = room.game_status == GameStatus::Ready;
    let write = if status_changed {
        RoomWrite::Update
    } else {
        RoomWrite::Keep
    };

    let mut joined = OutboundMessage {
        game_status: Some(room.game_status),
        new_room_privacy: Some(room.is_private),
        ..OutboundMessage::new(RoomEvent::JoinedRoom)
    };
    if room.game_status.is_in_game() {
        joined = OutboundMessage {
            board: Some(room.board.to_string()),
            current_turn: room.current_turn_holder(),
            leaderboard: Some(room.leaderboard.clone()),
            player_tiles: room.rack(caller).cloned(),
            ..joined
        };
    }

    let admin = room.admin_id;
    let mut decision = Decision::new(room, write)
        .send(Recipient::Player(caller), joined)
        .send(
            Recipient::Others(caller),
            OutboundMessage {
                new_player_info: Some(info),
                ..OutboundMessage::new(RoomEvent::PlayerJoined)
            },
        );
    if full_before_start && admin != caller {
        decision = decision.send(
            Recipient::Player(admin),
            OutboundMessage {
                game_status: Some(GameStatus::Ready),
                ..OutboundMessage::new(RoomEvent::RoomReady)
            },
        );
    }
    Ok(decision)
}

fn change_privacy(mut room: Room, caller: PlayerId) -> Result<Decision, GameError> {
    require_admin(&room, caller)?;
    require_status(&room, &PRE_GAME)?;

    room.is_private = !room.is_private;
    let privacy = room.is_private;
    Ok(Decision::new(room, RoomWrite::Update).send(
        Recipient::Everyone,
        OutboundMessage {
            new_room_privacy: Some(privacy),
            ..OutboundMessage::new(RoomEvent::RoomChangedPrivacy)
        },
    ))
}

fn kick(
    mut room: Room,
    caller: PlayerId,
    target: PlayerId,
    ctx: &SessionContext<'_>,
) -> Result<Decision, GameError> {
    require_admin(&room, caller)?;
    require_status(&room, &PRE_GAME)?;
    if target == caller {
        return Err(GameError::CannotKickSelf);
    }
    if !room.is_member(target) || !ctx.connected.contains(&target) {
        return Err(GameError::PlayerNotConnected { player_id: target });
    }

    room.remove_member(target);
    let status_changed = room.refresh_readiness();
    let admin = room.admin_id;

    let mut decision = Decision::new(room, RoomWrite::Update)
        .removing(target)
        .send(
            Recipient::Player(target),
            OutboundMessage::new(RoomEvent::KickedByAdmin),
        )
        .effect(Effect::Disconnect(target))
        .send(
            Recipient::Everyone,
            OutboundMessage {
                kicked_player_id: Some(target),
                ..OutboundMessage::new(RoomEvent::PlayerKicked)
            },
        );
    if status_changed {
        decision = decision.send(Recipient::Player(admin), room_waiting());
    }
    Ok(decision)
}

fn room_waiting() -> OutboundMessage {
    OutboundMessage {
        game_status: Some(GameStatus::Waiting),
        ..OutboundMessage::new(RoomEvent::RoomWaiting)
    }
}

fn leave_room(mut room: Room, caller: PlayerId) -> Result<Decision, GameError> {
    require_status(&room, &PRE_GAME)?;

    let new_admin = room.remove_member(caller);
    let left = OutboundMessage::new(RoomEvent::LeftRoom);

    if room.players.is_empty() {
        return Ok(Decision::new(room, RoomWrite::Delete)
            .removing(caller)
            .send(Recipient::Player(caller), left)
            .effect(Effect::DisconnectAll));
    }

    let status_changed = room.refresh_readiness();
    let admin = room.admin_id;
    let mut decision = Decision::new(room, RoomWrite::Update)
        .removing(caller)
        .send(Recipient::Player(caller), left)
        .effect(Effect::Disconnect(caller))
        .send(
            Recipient::Everyone,
            OutboundMessage {
                left_player_id: Some(caller),
                new_admin_id: new_admin,
                ..OutboundMessage::new(RoomEvent::PlayerLeftRoom)
            },
        );
    if status_changed {
        decision = decision.send(Recipient::Player(admin), room_waiting());
    }
    Ok(decision)
}

fn close_room(room: Room, caller: PlayerId) -> Result<Decision, GameError> {
    require_admin(&room, caller)?;
    require_status(&room, &PRE_GAME)?;

    Ok(Decision::new(room, RoomWrite::Delete)
        .send(
            Recipient::Everyone,
            OutboundMessage::new(RoomEvent::RoomClosed),
        )
        .effect(Effect::DisconnectAll))
}

fn start_game<R: Rng + ?Sized>(
    mut room: Room,
    caller: PlayerId,
    ctx: &SessionContext<'_>,
    rng: &mut R,
) -> Result<Decision, GameError> {
    require_admin(&room, caller)?;
    require_status(&room, &PRE_GAME)?;

    let rules = ctx.rules;
    let mut turn_order = room.players.clone();
    turn_order.shuffle(rng);

    let mut bag = rules.letters.initial_bag();
    room.players_tiles = bag.distribute(&turn_order, rules.rack_size, rng);
    room.tiles_left = bag;
    room.leaderboard = turn_order.iter().map(|player| (*player, 0)).collect();
    room.board = crate::Board::empty(rules.layout.size());
    room.turn_order = turn_order;
    room.current_turn_index = 0;
    room.current_skipped_turns = 0;
    room.placed_words.clear();
    room.game_status = GameStatus::Started;

    let layout = rules.layout.rows();
    let first_turn = room.current_turn_holder();
    let messages: Vec<_> = room
        .turn_order
        .iter()
        .map(|player| {
            (
                *player,
                OutboundMessage {
                    game_status: Some(GameStatus::Started),
                    board_layout: Some(layout.clone()),
                    current_turn: first_turn,
                    player_tiles: room.rack(*player).cloned(),
                    leaderboard: Some(room.leaderboard.clone()),
                    ..OutboundMessage::new(RoomEvent::GameStarted)
                },
            )
        })
        .collect();

    let mut decision = Decision::new(room, RoomWrite::Update);
    for (player, message) in messages {
        decision = decision.send(Recipient::Player(player), message);
    }
    Ok(decision)
}

fn pause_game(mut room: Room, caller: PlayerId) -> Result<Decision, GameError> {
    require_admin(&room, caller)?;
    require_status(&room, &[GameStatus::Started])?;

    room.game_status = GameStatus::Paused;
    Ok(Decision::new(room, RoomWrite::Update).send(
        Recipient::Everyone,
        OutboundMessage {
            game_status: Some(GameStatus::Paused),
            ..OutboundMessage::new(RoomEvent::GamePaused)
        },
    ))
}

fn resume_game(mut room: Room, caller: PlayerId) -> Result<Decision, GameError> {
    require_admin(&room, caller)?;
    require_status(&room, &[GameStatus::Paused])?;

    room.game_status = GameStatus::Started;
    let current_turn = room.current_turn_holder();
    Ok(Decision::new(room, RoomWrite::Update).send(
        Recipient::Everyone,
        OutboundMessage {
            game_status: Some(GameStatus::Started),
            current_turn,
            ..OutboundMessage::new(RoomEvent::GameResumed)
        },
    ))
}

fn end_turn(mut room: Room, caller: PlayerId, empty: bool) -> Result<Decision, GameError> {
    require_turn(&room, caller)?;

    if empty {
        room.current_skipped_turns += 1;
    } else {
        room.current_skipped_turns = 0;
    }
    room.advance_turn();

    let current_turn = room.current_turn_holder();
    let rack = room.rack(caller).cloned();
    Ok(Decision::new(room, RoomWrite::Update)
        .send(
            Recipient::Player(caller),
            OutboundMessage {
                current_turn,
                player_tiles: rack,
                ..OutboundMessage::new(RoomEvent::EndedTurn)
            },
        )
        .send(
            Recipient::Others(caller),
            OutboundMessage {
                ended_turn_player_id: Some(caller),
                current_turn,
                ..OutboundMessage::new(RoomEvent::PlayerEndedTurn)
            },
        ))
}

fn exchange_tiles<R: Rng + ?Sized>(
    mut room: Room,
    caller: PlayerId,
    indices: &[usize],
    ctx: &SessionContext<'_>,
    rng: &mut R,
) -> Result<Decision, GameError> {
    require_turn(&room, caller)?;

    let rack_size = ctx.rules.rack_size;
    let remaining = room.tiles_left.total();
    if remaining < rack_size {
        return Err(GameError::NotEnoughTiles {
            remaining,
            required: rack_size,
        });
    }
    if indices.is_empty() || indices.len() > rack_size {
        return Err(GameError::InvalidExchangeCount {
            count: indices.len(),
            max: rack_size,
        });
    }

    let rack = room.rack(caller).cloned().unwrap_or_default();
    let mut seen = HashSet::new();
    for index in indices {
        if *index >= rack.len() || !seen.insert(*index) {
            return Err(GameError::InvalidTileIndex { index: *index });
        }
    }

    let returned: Vec<char> = indices.iter().map(|index| rack[*index]).collect();
    room.tiles_left.put_back(&returned);
    let new_rack = room.tiles_left.refill(&rack, indices, rng);
    room.players_tiles.insert(caller, new_rack.clone());
    room.advance_turn();

    let current_turn = room.current_turn_holder();
    Ok(Decision::new(room, RoomWrite::Update)
        .send(
            Recipient::Player(caller),
            OutboundMessage {
                current_turn,
                player_tiles: Some(new_rack),
                ..OutboundMessage::new(RoomEvent::ExchangedTiles)
            },
        )
        .send(
            Recipient::Others(caller),
            OutboundMessage {
                exchanged_tiles_player_id: Some(caller),
                current_turn,
                ..OutboundMessage::new(RoomEvent::PlayerExchangedTiles)
            },
        ))
}

fn place_word<R: Rng + ?Sized>(
    mut room: Room,
    caller: PlayerId,
    direction: Direction,
    letters: &[LetterPlacement],
    ctx: &SessionContext<'_>,
    rng: &mut R,
) -> Result<Decision, GameError> {
    require_turn(&room, caller)?;

    let rules = ctx.rules;
    let rack = room.rack(caller).cloned().unwrap_or_default();
    let placed = BoardEngine::place_word(&room.board, letters, &rack, direction)?;
    let word = BoardEngine::build_word(letters, &rack, direction)?;

    if !ctx.validator.is_valid(&word) {
        return Err(GameError::InvalidWord { word });
    }
    if room.placed_words.is_empty() {
        let center = rules.layout.center();
        if !letters
            .iter()
            .any(|placement| (placement.row(), placement.col()) == center)
        {
            return Err(GameError::CenterNotCovered);
        }
    } else if placed.cross_letters == 0 {
        return Err(GameError::NoCrossLetter);
    }
    for cross_word in BoardEngine::discover_cross_words(&placed.board, &placed.new_tiles, direction)
    {
        if !ctx.validator.is_valid(&cross_word) {
            return Err(GameError::InvalidWord { word: cross_word });
        }
    }

    let points = ScoringEngine::score(letters, &placed.board, &rules.layout, &rules.letters);
    let used: Vec<usize> = placed
        .new_tiles
        .iter()
        .map(|placement| placement.tile_index)
        .collect();
    let new_rack = room.tiles_left.refill(&rack, &used, rng);
    let bag_empty = room.tiles_left.is_empty();

    room.board = placed.board;
    room.players_tiles.insert(caller, new_rack.clone());
    *room.leaderboard.entry(caller).or_insert(0) += points;
    room.placed_words.push(word.clone());
    room.current_skipped_turns = 0;

    if new_rack.is_empty() && bag_empty {
        let leaderboard = room.leaderboard.clone();
        room.reset();
        return Ok(Decision::new(room, RoomWrite::Update).send(
            Recipient::Everyone,
            OutboundMessage {
                winner_id: Some(caller),
                new_word: Some(word),
                scored_points: Some(points),
                leaderboard: Some(leaderboard),
                ..OutboundMessage::new(RoomEvent::GameEndedPlayerWon)
            },
        ));
    }

    room.advance_turn();
    let current_turn = room.current_turn_holder();
    let board = room.board.to_string();
    let leaderboard = room.leaderboard.clone();
    Ok(Decision::new(room, RoomWrite::Update)
        .send(
            Recipient::Player(caller),
            OutboundMessage {
                new_word: Some(word.clone()),
                scored_points: Some(points),
                player_tiles: Some(new_rack),
                current_turn,
                board: Some(board.clone()),
                leaderboard: Some(leaderboard.clone()),
                ..OutboundMessage::new(RoomEvent::PlacedWord)
            },
        )
        .send(
            Recipient::Others(caller),
            OutboundMessage {
                placed_word_player_id: Some(caller),
                new_word: Some(word),
                scored_points: Some(points),
                current_turn,
                board: Some(board),
                leaderboard: Some(leaderboard),
                ..OutboundMessage::new(RoomEvent::PlayerPlacedWord)
            },
        ))
}

fn suggest_end(
    mut room: Room,
    caller: PlayerId,
    ctx: &SessionContext<'_>,
) -> Result<Decision, GameError> {
    require_turn(&room, caller)?;
    if room.current_skipped_turns < ctx.rules.max_skipped_turns {
        return Err(GameError::TooFewEmptyTurns);
    }

    let winner = room.leader();
    let leaderboard = room.leaderboard.clone();
    room.reset();
    Ok(Decision::new(room, RoomWrite::Update).send(
        Recipient::Everyone,
        OutboundMessage {
            winner_id: winner,
            leaderboard: Some(leaderboard),
            ..OutboundMessage::new(RoomEvent::GameEndedTooManyEmptyTurns)
        },
    ))
}

fn leave_game(mut room: Room, caller: PlayerId) -> Result<Decision, GameError> {
    require_status(&room, &IN_GAME)?;

    let new_admin = room.remove_from_game(caller);
    let left = OutboundMessage::new(RoomEvent::LeftGame);

    if room.players.is_empty() {
        return Ok(Decision::new(room, RoomWrite::Delete)
            .removing(caller)
            .send(Recipient::Player(caller), left)
            .effect(Effect::DisconnectAll));
    }

    let notice = OutboundMessage {
        left_player_id: Some(caller),
        current_turn: room.current_turn_holder(),
        new_admin_id: new_admin,
        ..OutboundMessage::new(RoomEvent::PlayerLeftGame)
    };

    let solo_winner = match room.players.as_slice() {
        [winner] => Some(*winner),
        _ => None,
    };
    if solo_winner.is_some() {
        room.reset();
    }

    let mut decision = Decision::new(room, RoomWrite::Update)
        .removing(caller)
        .send(Recipient::Player(caller), left)
        .effect(Effect::Disconnect(caller))
        .send(Recipient::Everyone, notice);
    if let Some(winner) = solo_winner {
        decision = decision.send(
            Recipient::Everyone,
            OutboundMessage {
                winner_id: Some(winner),
                ..OutboundMessage::new(RoomEvent::GameEndedSoloInRoom)
            },
        );
    }
    Ok(decision)
}

fn send_reaction(
    room: Room,
    caller: PlayerId,
    reaction: String,
    ctx: &SessionContext<'_>,
) -> Result<Decision, GameError> {
    let max = ctx.rules.max_reaction_len;
    let len = reaction.chars().count();
    if len == 0 || len > max {
        return Err(GameError::InvalidReaction { max });
    }

    Ok(Decision::new(room, RoomWrite::Keep).send(
        Recipient::Everyone,
        OutboundMessage {
            reaction: Some(reaction),
            sender_id: Some(caller),
            ..OutboundMessage::new(RoomEvent::ReactionSent)
        },
    ))
}
