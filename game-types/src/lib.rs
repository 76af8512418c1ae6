pub mod game;
pub mod messages;
pub mod user;
pub mod errors;

// Re-export all types
pub use game::*;
pub use messages::*;
pub use user::*;
pub use errors::*;

pub type RoomId = uuid::Uuid;
pub type PlayerId = uuid::Uuid;
