use async_trait::async_trait;
use game_types::{GameError, PlayerId, RoomId};
use thiserror::Error;

use crate::Room;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store call timed out")]
    Timeout,
    #[error("database error: {0}")]
    Database(String),
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Unique/foreign-key violations, e.g. an invite code collision.
    pub fn is_constraint_failure(&self) -> bool {
        matches!(self, StoreError::Constraint(_))
    }
}

impl From<StoreError> for GameError {
    fn from(error: StoreError) -> Self {
        GameError::Persistence {
            message: error.to_string(),
        }
    }
}

/// What to do with the room record when a decision is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomWrite {
    Keep,
    Update,
    Delete,
}

/// Everything a single action changes, applied in one transaction.
#[derive(Debug, Clone)]
pub struct RoomCommit {
    pub room: Room,
    pub write: RoomWrite,
    /// Membership row to delete alongside the room write.
    pub removed_player: Option<PlayerId>,
}

impl RoomCommit {
    pub fn is_noop(&self) -> bool {
        self.write == RoomWrite::Keep && self.removed_player.is_none()
    }

    /// Whether `stored` already shows this commit applied.
    pub fn is_reflected_in(&self, stored: Option<&Room>) -> bool {
        let member_gone = |player| stored.is_none_or(|room| !room.is_member(player));
        match self.write {
            RoomWrite::Delete => stored.is_none(),
            RoomWrite::Update => stored == Some(&self.room),
            RoomWrite::Keep => self.removed_player.is_none_or(member_gone),
        }
    }
}

#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Load a room together with its members in join order.
    async fn find(&self, room_id: RoomId) -> Result<Option<Room>, StoreError>;

    /// Persist the room's own fields; membership is untouched.
    async fn update(&self, room: &Room) -> Result<(), StoreError>;

    /// Remove the room and every membership row.
    async fn delete(&self, room_id: RoomId) -> Result<(), StoreError>;

    /// Apply a commit atomically.
    async fn commit(&self, commit: RoomCommit) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    async fn name_of(&self, player_id: PlayerId) -> Result<Option<String>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_classification() {
        assert!(StoreError::Constraint("invite_code".into()).is_constraint_failure());
        assert!(!StoreError::Timeout.is_constraint_failure());
        assert!(!StoreError::Database("closed".into()).is_constraint_failure());
    }

    #[test]
    fn test_commit_reflected_in_stored_room() {
        let admin = uuid::Uuid::new_v4();
        let guest = uuid::Uuid::new_v4();
        let mut before = Room::new(uuid::Uuid::new_v4(), "ABC123", admin, 2, 60);
        before.players.push(guest);
        let mut after = before.clone();
        after.remove_member(guest);

        let update = RoomCommit {
            room: after.clone(),
            write: RoomWrite::Update,
            removed_player: Some(guest),
        };
        assert!(update.is_reflected_in(Some(&after)));
        assert!(!update.is_reflected_in(Some(&before)));
        assert!(!update.is_reflected_in(None));

        let delete = RoomCommit {
            write: RoomWrite::Delete,
            ..update.clone()
        };
        assert!(delete.is_reflected_in(None));
        assert!(!delete.is_reflected_in(Some(&after)));

        let removal = RoomCommit {
            write: RoomWrite::Keep,
            ..update
        };
        assert!(removal.is_reflected_in(Some(&after)));
        assert!(!removal.is_reflected_in(Some(&before)));
    }

    #[test]
    fn test_store_error_becomes_persistence_error() {
        let error: GameError = StoreError::Timeout.into();
        assert_eq!(
            error,
            GameError::Persistence {
                message: "store call timed out".to_string()
            }
        );
    }
}
