pub mod prelude;

pub mod room_players;
pub mod rooms;
pub mod users;
