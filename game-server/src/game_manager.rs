use dashmap::DashMap;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::websocket::connection::{ConnectionRegistry, UserConnection};
use game_core::{
    Command, Effect, GameRules, PlayerDirectory, Recipient, RoomCommit, RoomStore,
    SessionContext, StoreError, WordValidator, decide,
};
use game_types::{GameError, InboundMessage, OutboundMessage, RoomEvent, RoomId};

/// Runs every room action: load, decide, persist, then notify.
///
/// Actions on one room are serialised by a per-room async mutex held for the
/// whole sequence. Connections are only registered or dropped after the
/// store write went through.
pub struct GameSessionManager {
    store: Arc<dyn RoomStore>,
    directory: Arc<dyn PlayerDirectory>,
    validator: Arc<dyn WordValidator>,
    rules: Arc<GameRules>,
    registry: Arc<ConnectionRegistry>,
    locks: DashMap<RoomId, Arc<Mutex<()>>>,
    store_timeout: Duration,
}

impl GameSessionManager {
    pub fn new(
        store: Arc<dyn RoomStore>,
        directory: Arc<dyn PlayerDirectory>,
        validator: Arc<dyn WordValidator>,
        rules: Arc<GameRules>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            directory,
            validator,
            rules,
            registry: Arc::new(ConnectionRegistry::new()),
            locks: DashMap::new(),
            store_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Entry point for a text frame. Failures only ever reach the sender.
    pub async fn handle_message(&self, connection: &UserConnection, text: &str) {
        let message: InboundMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(err) => {
                debug!(connection_id = %connection.connection_id, error = %err, "malformed message");
                self.reply_error(
                    connection,
                    &GameError::MalformedMessage {
                        reason: err.to_string(),
                    },
                );
                return;
            }
        };

        if let Err(err) = self.dispatch(connection, &message).await {
            self.reply_error(connection, &err);
        }
    }

    pub async fn dispatch(
        &self,
        connection: &UserConnection,
        message: &InboundMessage,
    ) -> Result<(), GameError> {
        let command = Command::try_from(message)?;
        self.run_command(connection, message.room_id, command).await
    }

    pub fn reply_error(&self, connection: &UserConnection, err: &GameError) {
        match err {
            GameError::Persistence { .. } => warn!(
                player_id = %connection.player_id,
                error = %err,
                "action failed on storage"
            ),
            _ => debug!(player_id = %connection.player_id, error = %err, "action refused"),
        }
        // the socket may already be gone; nothing else to do
        let _ = connection.send_message(OutboundMessage::error(err));
    }

    async fn run_command(
        &self,
        connection: &UserConnection,
        room_id: RoomId,
        command: Command,
    ) -> Result<(), GameError> {
        let lock = self.room_lock(room_id);
        let _guard = lock.lock().await;

        let player_id = connection.player_id;
        let action = command.name();
        let joining = matches!(command, Command::Join { .. });
        let registered = self
            .registry
            .is_member(room_id, connection.connection_id)
            .await;
        if joining && registered {
            return Err(GameError::AlreadyConnected);
        }
        if !joining && !registered {
            return Err(GameError::NotConnected);
        }

        let room = self
            .guarded(self.store.find(room_id))
            .await?
            .ok_or(GameError::RoomNotFound { room_id })?;

        let command = match command {
            Command::Join { .. } if room.is_member(player_id) => {
                let name = self
                    .guarded(self.directory.name_of(player_id))
                    .await?
                    .unwrap_or_default();
                Command::Join { name }
            }
            other => other,
        };

        let connected = self.registry.connected_players(room_id).await;
        let ctx = SessionContext {
            rules: &self.rules,
            validator: self.validator.as_ref(),
            connected: &connected,
        };
        let decision = {
            let mut rng = StdRng::from_entropy();
            decide(room, player_id, command, &ctx, &mut rng)?
        };

        let commit = decision.commit();
        if !commit.is_noop() {
            match self.guarded(self.store.commit(commit.clone())).await {
                Ok(()) => {}
                Err(StoreError::Timeout) if self.commit_landed(&commit).await => {
                    warn!(room_id = %room_id, action, "commit timed out after it was applied");
                }
                Err(err) => {
                    error!(room_id = %room_id, action, error = %err, "failed to persist room");
                    return Err(err.into());
                }
            }
        }

        if joining {
            self.registry.add(room_id, connection.clone()).await;
        }
        info!(room_id = %room_id, player_id = %player_id, action, "action applied");

        self.execute(room_id, decision.effects).await;
        Ok(())
    }

    async fn execute(&self, room_id: RoomId, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send(Recipient::Player(player_id), message) => {
                    if let Some(connection) = self.registry.connection_for(room_id, player_id).await
                    {
                        self.registry
                            .broadcast(room_id, &[connection], &message)
                            .await;
                    }
                }
                Effect::Send(Recipient::Others(player_id), message) => {
                    let others: Vec<_> = self
                        .registry
                        .connections(room_id)
                        .await
                        .into_iter()
                        .filter(|connection| connection.player_id != player_id)
                        .collect();
                    self.registry.broadcast(room_id, &others, &message).await;
                }
                Effect::Send(Recipient::Everyone, message) => {
                    let everyone = self.registry.connections(room_id).await;
                    self.registry.broadcast(room_id, &everyone, &message).await;
                }
                Effect::Disconnect(player_id) => {
                    self.registry.remove_player(room_id, player_id).await;
                }
                Effect::DisconnectAll => {
                    let closed = self.registry.remove_room(room_id).await;
                    debug!(room_id = %room_id, closed, "closed room connections");
                }
            }
        }
    }

    /// Forget a dropped socket everywhere and tell each room once.
    pub async fn handle_disconnect(&self, connection: &UserConnection) {
        let removed = self
            .registry
            .remove(connection.connection_id, None)
            .await;

        for (room_id, player_id) in removed {
            info!(room_id = %room_id, player_id = %player_id, "player disconnected");
            let remaining = self.registry.connections(room_id).await;
            let message = OutboundMessage {
                left_player_id: Some(player_id),
                ..OutboundMessage::new(RoomEvent::PlayerDisconnected)
            };
            self.registry
                .broadcast(room_id, &remaining, &message)
                .await;
        }
    }

    /// Drop lock entries nobody is holding or waiting on.
    pub fn prune_idle_locks(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    fn room_lock(&self, room_id: RoomId) -> Arc<Mutex<()>> {
        self.locks
            .entry(room_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Re-read the room to learn whether a timed-out commit went through.
    async fn commit_landed(&self, commit: &RoomCommit) -> bool {
        match self.guarded(self.store.find(commit.room.id)).await {
            Ok(stored) => commit.is_reflected_in(stored.as_ref()),
            Err(err) => {
                warn!(room_id = %commit.room.id, error = %err, "could not re-read room after timeout");
                false
            }
        }
    }

    async fn guarded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.store_timeout, call)
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}
