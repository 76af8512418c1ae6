use game_types::{OutboundMessage, PlayerId, RoomId};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the socket writer task receives.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Message(OutboundMessage),
    /// Send a close frame and stop writing.
    Close,
}

/// One authenticated socket. Cloned into every room the socket joins.
#[derive(Debug, Clone)]
pub struct UserConnection {
    pub player_id: PlayerId,
    pub connection_id: ConnectionId,
    sender: mpsc::UnboundedSender<Outgoing>,
}

impl UserConnection {
    pub fn new(player_id: PlayerId) -> (Self, mpsc::UnboundedReceiver<Outgoing>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection = Self {
            player_id,
            connection_id: ConnectionId::new(),
            sender,
        };
        (connection, receiver)
    }

    pub fn send_message(&self, message: OutboundMessage) -> Result<(), String> {
        self.sender
            .send(Outgoing::Message(message))
            .map_err(|_| "Connection closed".to_string())
    }

    pub fn close(&self) {
        let _ = self.sender.send(Outgoing::Close);
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Live sockets per room. Every mutation goes through the one lock; readers
/// work on snapshots.
pub struct ConnectionRegistry {
    rooms: RwLock<HashMap<RoomId, Vec<UserConnection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Register `connection` in `room_id`. A previous socket of the same player
    /// in that room is replaced and closed.
    pub async fn add(&self, room_id: RoomId, connection: UserConnection) -> UserConnection {
        let replaced = {
            let mut rooms = self.rooms.write().await;
            let connections = rooms.entry(room_id).or_default();
            let previous = connections
                .iter()
                .position(|existing| existing.player_id == connection.player_id)
                .map(|index| connections.remove(index));
            connections.push(connection.clone());
            previous
        };

        if let Some(previous) = replaced {
            if previous.connection_id != connection.connection_id {
                tracing::info!(
                    room_id = %room_id,
                    player_id = %previous.player_id,
                    connection_id = %previous.connection_id,
                    "replacing stale connection"
                );
                previous.close();
            }
        }
        connection
    }

    /// Drop the socket from one room, or from every room when `room_id` is
    /// `None`. Returns the memberships actually removed; calling it again is a
    /// no-op.
    pub async fn remove(
        &self,
        connection_id: ConnectionId,
        room_id: Option<RoomId>,
    ) -> Vec<(RoomId, PlayerId)> {
        let mut removed = Vec::new();
        let mut closed = None;
        {
            let mut rooms = self.rooms.write().await;
            for (room, connections) in rooms.iter_mut() {
                if room_id.is_some_and(|wanted| wanted != *room) {
                    continue;
                }
                if let Some(index) = connections
                    .iter()
                    .position(|connection| connection.connection_id == connection_id)
                {
                    let connection = connections.remove(index);
                    removed.push((*room, connection.player_id));
                    closed = Some(connection);
                }
            }
            rooms.retain(|_, connections| !connections.is_empty());
        }

        if let Some(connection) = closed {
            connection.close();
        }
        removed
    }

    /// Close and forget `player_id`'s socket in `room_id`.
    pub async fn remove_player(&self, room_id: RoomId, player_id: PlayerId) -> bool {
        let removed = {
            let mut rooms = self.rooms.write().await;
            let Some(connections) = rooms.get_mut(&room_id) else {
                return false;
            };
            let removed = connections
                .iter()
                .position(|connection| connection.player_id == player_id)
                .map(|index| connections.remove(index));
            if connections.is_empty() {
                rooms.remove(&room_id);
            }
            removed
        };

        match removed {
            Some(connection) => {
                connection.close();
                true
            }
            None => false,
        }
    }

    /// Close and forget every socket in the room.
    pub async fn remove_room(&self, room_id: RoomId) -> usize {
        let connections = {
            let mut rooms = self.rooms.write().await;
            rooms.remove(&room_id).unwrap_or_default()
        };
        for connection in &connections {
            connection.close();
        }
        connections.len()
    }

    pub async fn is_member(&self, room_id: RoomId, connection_id: ConnectionId) -> bool {
        self.player_for(room_id, connection_id).await.is_some()
    }

    pub async fn player_for(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
    ) -> Option<PlayerId> {
        let rooms = self.rooms.read().await;
        rooms.get(&room_id).and_then(|connections| {
            connections
                .iter()
                .find(|connection| connection.connection_id == connection_id)
                .map(|connection| connection.player_id)
        })
    }

    pub async fn connection_for(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Option<UserConnection> {
        let rooms = self.rooms.read().await;
        rooms.get(&room_id).and_then(|connections| {
            connections
                .iter()
                .find(|connection| connection.player_id == player_id)
                .cloned()
        })
    }

    /// Snapshot of the room's sockets in registration order.
    pub async fn connections(&self, room_id: RoomId) -> Vec<UserConnection> {
        let rooms = self.rooms.read().await;
        rooms.get(&room_id).cloned().unwrap_or_default()
    }

    pub async fn connected_players(&self, room_id: RoomId) -> Vec<PlayerId> {
        self.connections(room_id)
            .await
            .into_iter()
            .map(|connection| connection.player_id)
            .collect()
    }

    /// Send `message` to each of `connections`. A socket whose send fails is
    /// dropped from the room. Returns the number of successful sends.
    pub async fn broadcast(
        &self,
        room_id: RoomId,
        connections: &[UserConnection],
        message: &OutboundMessage,
    ) -> usize {
        let mut failed = Vec::new();
        for connection in connections {
            if connection.send_message(message.clone()).is_err() {
                failed.push(connection.connection_id);
            }
        }

        for connection_id in &failed {
            tracing::warn!(room_id = %room_id, connection_id = %connection_id, "dropping dead connection");
            self.remove(*connection_id, Some(room_id)).await;
        }
        connections.len() - failed.len()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn connection_count(&self) -> usize {
        self.rooms.read().await.values().map(Vec::len).sum()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
