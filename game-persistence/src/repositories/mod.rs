pub mod room_repository;
pub mod user_repository;

pub use room_repository::RoomRepository;
pub use user_repository::UserRepository;

use game_core::StoreError;
use sea_orm::{DbErr, SqlErr};

pub(crate) fn store_error(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail))
        | Some(SqlErr::ForeignKeyConstraintViolation(detail)) => StoreError::Constraint(detail),
        _ => StoreError::Database(err.to_string()),
    }
}
