pub use super::room_players::Entity as RoomPlayers;
pub use super::rooms::Entity as Rooms;
pub use super::users::Entity as Users;
